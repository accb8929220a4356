//! HMAC-SHA256 message authentication codes.
//!
//! The gateway signs every inbound callback with HMAC-SHA256 keyed by the
//! API secret, computed over the concatenation of several form fields.
//! [`hmac_sha256_parts`] authenticates such a field list without first
//! copying it into one buffer.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use threema_gateway_types::{GatewayError, Result};

/// HMAC-SHA256 type alias.
type HmacSha256 = Hmac<Sha256>;

/// Fixed output length of HMAC-SHA256 in bytes.
pub const HMAC_SHA256_LEN: usize = 32;

fn keyed(key: &[u8]) -> Result<HmacSha256> {
    HmacSha256::new_from_slice(key).map_err(|e| GatewayError::MalformedInput {
        reason: format!("HMAC-SHA256 key init failed: {e}"),
    })
}

/// Computes HMAC-SHA256 over `data` using `key`.
///
/// # Parameters
///
/// - `key` - HMAC key (any length; the gateway API secret for callbacks).
/// - `data` - data to authenticate.
///
/// # Returns
///
/// A 32-byte HMAC-SHA256 tag.
///
/// # Errors
///
/// [`GatewayError::MalformedInput`] if HMAC initialisation fails. HMAC
/// accepts keys of any length, so this does not happen with SHA-256.
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<[u8; HMAC_SHA256_LEN]> {
    hmac_sha256_parts(key, &[data])
}

/// Computes HMAC-SHA256 over the concatenation of `parts`.
///
/// # Parameters
///
/// - `key` - HMAC key.
/// - `parts` - byte slices authenticated in order, as if joined.
///
/// # Returns
///
/// The same 32-byte tag [`hmac_sha256`] yields for the joined input.
///
/// # Errors
///
/// [`GatewayError::MalformedInput`] if HMAC initialisation fails.
pub fn hmac_sha256_parts(key: &[u8], parts: &[&[u8]]) -> Result<[u8; HMAC_SHA256_LEN]> {
    let mut mac = keyed(key)?;
    for part in parts {
        mac.update(part);
    }
    Ok(mac.finalize().into_bytes().into())
}

/// Verifies an HMAC-SHA256 tag over the concatenation of `parts` in
/// constant time.
///
/// # Parameters
///
/// - `key` - HMAC key (must match the one used to compute the tag).
/// - `parts` - byte slices that were authenticated, in order.
/// - `expected` - the 32-byte tag to verify against.
///
/// # Errors
///
/// Returns:
/// - [`GatewayError::MalformedInput`] if HMAC initialisation fails, or
/// - [`GatewayError::MacMismatch`] if the computed tag differs from
///   `expected`.
pub fn verify_hmac_sha256_parts(
    key: &[u8],
    parts: &[&[u8]],
    expected: &[u8; HMAC_SHA256_LEN],
) -> Result<()> {
    let mut mac = keyed(key)?;
    for part in parts {
        mac.update(part);
    }
    mac.verify_slice(expected).map_err(|_| GatewayError::MacMismatch)
}

/// Verifies an HMAC-SHA256 tag over `data` in constant time.
///
/// # Errors
///
/// Same as [`verify_hmac_sha256_parts`].
pub fn verify_hmac_sha256(key: &[u8], data: &[u8], expected: &[u8; HMAC_SHA256_LEN]) -> Result<()> {
    verify_hmac_sha256_parts(key, &[data], expected)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hmac_roundtrip() -> std::result::Result<(), GatewayError> {
        let key = b"s3cr3t";
        let data = b"ECHOECHO*GATEWAY";
        let tag = hmac_sha256(key, data)?;
        verify_hmac_sha256(key, data, &tag)?;
        Ok(())
    }

    #[test]
    fn parts_equal_concatenation() -> std::result::Result<(), GatewayError> {
        let key = b"s3cr3t";
        let joined = hmac_sha256(key, b"ECHOECHO*GATEWAY1234")?;
        let parts = hmac_sha256_parts(key, &[b"ECHOECHO", b"*GATEWAY", b"1234"])?;
        assert_eq!(joined, parts);
        Ok(())
    }

    #[test]
    fn different_key_different_tag() -> std::result::Result<(), GatewayError> {
        let data = b"same data";
        let tag_a = hmac_sha256(&[0x01; 32], data)?;
        let tag_b = hmac_sha256(&[0x02; 32], data)?;
        assert_ne!(tag_a, tag_b);
        Ok(())
    }

    #[test]
    fn tampered_tag_is_mac_mismatch() -> std::result::Result<(), GatewayError> {
        let key = [0x42; 32];
        let data = b"test data";
        let mut tag = hmac_sha256(&key, data)?;
        tag[0] ^= 0xFF;
        let result = verify_hmac_sha256(&key, data, &tag);
        assert!(matches!(result, Err(GatewayError::MacMismatch)));
        Ok(())
    }

    #[test]
    fn wrong_data_fails_verify() -> std::result::Result<(), GatewayError> {
        let key = [0x42; 32];
        let tag = hmac_sha256(&key, b"correct data")?;
        assert!(verify_hmac_sha256(&key, b"wrong data", &tag).is_err());
        Ok(())
    }

    /// RFC 4231 Test Case 2: HMAC-SHA-256.
    #[test]
    fn rfc4231_test_case_2() -> std::result::Result<(), GatewayError> {
        let key = b"Jefe";
        let data = b"what do ya want for nothing?";
        let tag = hmac_sha256(key, data)?;
        let expected: [u8; 32] = [
            0x5b, 0xdc, 0xc1, 0x46, 0xbf, 0x60, 0x75, 0x4e,
            0x6a, 0x04, 0x24, 0x26, 0x08, 0x95, 0x75, 0xc7,
            0x5a, 0x00, 0x3f, 0x08, 0x9d, 0x27, 0x39, 0x83,
            0x9d, 0xec, 0x58, 0xb9, 0x64, 0xec, 0x38, 0x43,
        ];
        assert_eq!(tag, expected);
        Ok(())
    }

    #[test]
    fn empty_key_is_accepted() -> std::result::Result<(), GatewayError> {
        let tag = hmac_sha256(b"", b"data")?;
        assert_ne!(tag, [0u8; 32]);
        Ok(())
    }
}
