//! Shared-key authenticated encryption (NaCl `secretbox`).
//!
//! XSalsa20-Poly1305 under a 32-byte [`SharedKey`]. Used only for blob
//! payloads (file data and thumbnails); the shared key itself travels
//! to the recipient inside an asymmetrically sealed file message.
//!
//! A shared key protects at most two blobs. They are told apart by the
//! fixed nonces [`FILE_NONCE`] and [`THUMBNAIL_NONCE`], so the pair can
//! be encrypted without coordinating random nonces.

use crypto_secretbox::aead::{Aead, Key, KeyInit, Nonce as AeadNonce};
use crypto_secretbox::XSalsa20Poly1305;
use threema_gateway_types::{GatewayError, Nonce, Result, SharedKey};

use crate::random::random_array;

/// Nonce for the file blob: 23 zero bytes followed by `0x01`.
pub const FILE_NONCE: Nonce = Nonce::new([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1,
]);

/// Nonce for the thumbnail blob: 23 zero bytes followed by `0x02`.
pub const THUMBNAIL_NONCE: Nonce = Nonce::new([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2,
]);

fn cipher(key: &SharedKey) -> XSalsa20Poly1305 {
    XSalsa20Poly1305::new(Key::<XSalsa20Poly1305>::from_slice(key.as_bytes()))
}

/// Seals `plaintext` under `key`.
///
/// # Parameters
///
/// - `plaintext` - blob content to encrypt.
/// - `nonce` - [`FILE_NONCE`] or [`THUMBNAIL_NONCE`] for blob uploads.
/// - `key` - the per-file shared key.
///
/// # Returns
///
/// Tag followed by ciphertext, 16 bytes longer than `plaintext`.
///
/// # Errors
///
/// [`GatewayError::MalformedInput`] if the cipher rejects the input
/// length.
pub fn seal_symmetric(plaintext: &[u8], nonce: &Nonce, key: &SharedKey) -> Result<Vec<u8>> {
    cipher(key)
        .encrypt(AeadNonce::<XSalsa20Poly1305>::from_slice(nonce.as_bytes()), plaintext)
        .map_err(|_| GatewayError::MalformedInput {
            reason: "secretbox encryption rejected the plaintext".into(),
        })
}

/// Opens a secretbox sealed under `key`.
///
/// # Errors
///
/// [`GatewayError::AuthenticationFailed`] if the tag does not verify.
pub fn open_symmetric(boxed: &[u8], nonce: &Nonce, key: &SharedKey) -> Result<Vec<u8>> {
    cipher(key)
        .decrypt(AeadNonce::<XSalsa20Poly1305>::from_slice(nonce.as_bytes()), boxed)
        .map_err(|_| GatewayError::AuthenticationFailed {
            reason: "secretbox authentication tag mismatch".into(),
        })
}

/// Generates a fresh random shared key for one file transfer.
///
/// # Errors
///
/// [`GatewayError::RandomSource`] if the OS random source fails.
pub fn generate_shared_key() -> Result<SharedKey> {
    random_array::<{ SharedKey::LEN }>().map(SharedKey::new)
}
