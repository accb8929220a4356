//! Self-describing random padding.
//!
//! Every packed payload ends in `N` bytes that all carry the value `N`,
//! with `N` drawn uniformly from `1..=255`. The receiver reads the final
//! byte to learn how much to strip, which hides the exact length of the
//! message body from anyone observing box sizes.

use threema_gateway_types::{GatewayError, Result};

use crate::random::fill_random;

/// Largest padding length a single byte can describe.
pub const MAX_PADDING_LEN: usize = 255;

/// Generates random padding.
///
/// The returned vector has a length `N` in `1..=255` and every byte
/// equals `N`.
///
/// # Errors
///
/// [`GatewayError::RandomSource`] if the OS random source fails.
pub fn generate_padding() -> Result<Vec<u8>> {
    let len = random_padding_len()?;
    Ok(vec![len; usize::from(len)])
}

/// Draws a byte uniformly from `1..=255` by rejecting zero.
fn random_padding_len() -> Result<u8> {
    let mut byte = [0u8; 1];
    loop {
        fill_random(&mut byte)?;
        if byte[0] != 0 {
            return Ok(byte[0]);
        }
    }
}

/// Strips trailing padding from `payload`.
///
/// The final byte is read as the padding length `N`. Padding bytes are
/// not compared individually; only the length is trusted.
///
/// # Errors
///
/// [`GatewayError::InvalidPadding`] if `N` is zero or would consume the
/// leading type byte.
pub fn strip_padding(payload: &[u8]) -> Result<&[u8]> {
    let Some(&last) = payload.last() else {
        return Err(GatewayError::InvalidPadding {
            reason: "payload is empty".into(),
        });
    };
    let pad_len = usize::from(last);
    if pad_len == 0 {
        return Err(GatewayError::InvalidPadding {
            reason: "padding length is 0".into(),
        });
    }
    if pad_len >= payload.len() {
        return Err(GatewayError::InvalidPadding {
            reason: format!(
                "padding length {pad_len} exceeds payload body ({} bytes)",
                payload.len() - 1
            ),
        });
    }
    Ok(&payload[..payload.len() - pad_len])
}
