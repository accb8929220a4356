//! Public-key authenticated encryption (NaCl `crypto_box`).
//!
//! X25519 key agreement between the sender's secret key and the
//! recipient's public key, followed by XSalsa20-Poly1305. The output
//! layout is the NaCl one: 16-byte Poly1305 tag, then the ciphertext.
//!
//! The caller supplies the nonce. On the outbound path it must be fresh
//! and random for every message (see [`crate::random::generate_nonce`]).

use crypto_box::aead::{Aead, Nonce as AeadNonce};
use crypto_box::SalsaBox;
use threema_gateway_types::{GatewayError, Nonce, PublicKey, Result, SecretKey};

use crate::random::random_array;

/// Length of the Poly1305 tag prepended to every box.
pub const BOX_OVERHEAD: usize = 16;

fn salsa_box(public: &PublicKey, secret: &SecretKey) -> SalsaBox {
    let public = crypto_box::PublicKey::from(*public.as_bytes());
    let secret = crypto_box::SecretKey::from(*secret.as_bytes());
    SalsaBox::new(&public, &secret)
}

/// Seals `plaintext` for `recipient`, authenticated by `sender`.
///
/// # Parameters
///
/// - `plaintext` - bytes to encrypt (usually a padded payload).
/// - `nonce` - 24-byte nonce; never reuse it for the same key pair.
/// - `recipient` - public key of the receiving identity.
/// - `sender` - secret key of the sending identity.
///
/// # Returns
///
/// `plaintext.len() + BOX_OVERHEAD` bytes: tag, then ciphertext.
///
/// # Errors
///
/// [`GatewayError::MalformedInput`] if the cipher rejects the input
/// length.
pub fn seal_asymmetric(
    plaintext: &[u8],
    nonce: &Nonce,
    recipient: &PublicKey,
    sender: &SecretKey,
) -> Result<Vec<u8>> {
    salsa_box(recipient, sender)
        .encrypt(AeadNonce::<SalsaBox>::from_slice(nonce.as_bytes()), plaintext)
        .map_err(|_| GatewayError::MalformedInput {
            reason: "box encryption rejected the plaintext".into(),
        })
}

/// Opens a box sealed by `sender` for the holder of `recipient`.
///
/// # Parameters
///
/// - `boxed` - tag followed by ciphertext, as produced by
///   [`seal_asymmetric`].
/// - `nonce` - the nonce the box was sealed under.
/// - `sender` - public key of the sending identity.
/// - `recipient` - secret key of the receiving identity.
///
/// # Errors
///
/// [`GatewayError::AuthenticationFailed`] if the tag does not verify
/// (wrong keys, wrong nonce, or tampered ciphertext). No plaintext is
/// returned in that case.
pub fn open_asymmetric(
    boxed: &[u8],
    nonce: &Nonce,
    sender: &PublicKey,
    recipient: &SecretKey,
) -> Result<Vec<u8>> {
    if boxed.len() < BOX_OVERHEAD {
        return Err(GatewayError::AuthenticationFailed {
            reason: format!("box too short ({} bytes)", boxed.len()),
        });
    }
    salsa_box(sender, recipient)
        .decrypt(AeadNonce::<SalsaBox>::from_slice(nonce.as_bytes()), boxed)
        .map_err(|_| GatewayError::AuthenticationFailed {
            reason: "box authentication tag mismatch".into(),
        })
}

/// Generates a new random X25519 secret key.
///
/// # Returns
///
/// 32 bytes from the OS CSPRNG. Clamping happens inside the X25519
/// operations, so the raw bytes are stored as-is.
///
/// # Errors
///
/// [`GatewayError::RandomSource`] if the OS random source fails.
pub fn generate_secret_key() -> Result<SecretKey> {
    random_array::<{ SecretKey::LEN }>().map(SecretKey::new)
}

/// Derives the public key belonging to `secret`.
pub fn public_key_of(secret: &SecretKey) -> PublicKey {
    let secret = crypto_box::SecretKey::from(*secret.as_bytes());
    PublicKey::new(*secret.public_key().as_bytes())
}
