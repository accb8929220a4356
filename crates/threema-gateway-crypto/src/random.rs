//! Access to the operating system CSPRNG.
//!
//! Every random value in the protocol (nonces, shared keys, secret keys,
//! padding lengths) is drawn through [`fill_random`], which reports a
//! failing entropy source as [`GatewayError::RandomSource`] instead of
//! panicking or falling back to a weaker generator.

use rand::rngs::OsRng;
use rand::RngCore;
use threema_gateway_types::{GatewayError, Nonce, Result};

/// Fills `buf` with bytes from the OS random source.
///
/// # Errors
///
/// [`GatewayError::RandomSource`] if the OS cannot provide entropy.
pub fn fill_random(buf: &mut [u8]) -> Result<()> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| GatewayError::RandomSource {
            reason: format!("OS random source failed: {e}"),
        })
}

/// Returns `N` random bytes.
pub fn random_array<const N: usize>() -> Result<[u8; N]> {
    let mut out = [0u8; N];
    fill_random(&mut out)?;
    Ok(out)
}

/// Generates a fresh random 24-byte nonce.
pub fn generate_nonce() -> Result<Nonce> {
    random_array::<{ Nonce::LEN }>().map(Nonce::new)
}
