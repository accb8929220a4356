//! Known-vector and cross-module tests for the gateway primitives.
//!
//! Test vectors sourced from:
//! - X25519: RFC 7748 §6.1
//! - HMAC-SHA256: RFC 4231 test case 1

use threema_gateway_crypto::mac::{hmac_sha256, verify_hmac_sha256_parts};
use threema_gateway_crypto::padding::{generate_padding, strip_padding};
use threema_gateway_crypto::public_box::{
    open_asymmetric, public_key_of, seal_asymmetric, BOX_OVERHEAD,
};
use threema_gateway_crypto::random::generate_nonce;
use threema_gateway_crypto::secret_box::{
    generate_shared_key, open_symmetric, seal_symmetric, FILE_NONCE, THUMBNAIL_NONCE,
};
use threema_gateway_types::{GatewayError, Nonce, SecretKey};

fn hex32(value: &str) -> [u8; 32] {
    let mut out = [0u8; 32];
    hex::decode_to_slice(value, &mut out).unwrap();
    out
}

// ===================================================================
// X25519 - RFC 7748 §6.1
// ===================================================================

#[test]
fn x25519_rfc7748_public_keys() {
    let alice = SecretKey::new(hex32(
        "77076d0a7318a57d3c16c17251b26645df4c2f87ebc0992ab177fba51db92c2a",
    ));
    let bob = SecretKey::new(hex32(
        "5dab087e624a8a4b79e17f8b83800ee66f3bb1292618b6fd1c2f8b27ff88e0eb",
    ));

    assert_eq!(
        public_key_of(&alice).to_string(),
        "8520f0098930a754748b7ddcb43ef75a0dbf3a0d26381af4eba4a98eaa9b4e6a"
    );
    assert_eq!(
        public_key_of(&bob).to_string(),
        "de9edb7d7b7dc1b4d35b61c2ece435373f8343c85b78674dadfc7e146f882b4f"
    );
}

#[test]
fn box_key_is_symmetric_between_peers() -> std::result::Result<(), GatewayError> {
    let alice = SecretKey::new([0x11; 32]);
    let bob = SecretKey::new([0x22; 32]);
    let nonce = Nonce::new([0x33; 24]);

    let from_alice = seal_asymmetric(b"ping", &nonce, &public_key_of(&bob), &alice)?;
    let from_bob = seal_asymmetric(b"ping", &nonce, &public_key_of(&alice), &bob)?;
    assert_eq!(from_alice, from_bob);
    Ok(())
}

// ===================================================================
// HMAC-SHA256 - RFC 4231
// ===================================================================

#[test]
fn hmac_rfc4231_test_case_1() -> std::result::Result<(), GatewayError> {
    let tag = hmac_sha256(&[0x0b; 20], b"Hi There")?;
    assert_eq!(
        hex::encode(tag),
        "b0344c61d8db38535ca8afceaf0bf12b881dc200c9833da726e9376c2e32cff7"
    );
    Ok(())
}

#[test]
fn hmac_parts_verify_against_single_buffer() -> std::result::Result<(), GatewayError> {
    let tag = hmac_sha256(b"Jefe", b"what do ya want for nothing?")?;
    verify_hmac_sha256_parts(b"Jefe", &[b"what do ya ", b"want for ", b"nothing?"], &tag)?;
    Ok(())
}

// ===================================================================
// Envelopes
// ===================================================================

#[test]
fn padded_payload_survives_box() -> std::result::Result<(), GatewayError> {
    let alice = SecretKey::new([0xA1; 32]);
    let bob = SecretKey::new([0xB2; 32]);
    let nonce = generate_nonce()?;

    let mut payload = vec![0x01];
    payload.extend_from_slice(b"hello");
    payload.extend(generate_padding()?);

    let boxed = seal_asymmetric(&payload, &nonce, &public_key_of(&bob), &alice)?;
    assert_eq!(boxed.len(), payload.len() + BOX_OVERHEAD);

    let opened = open_asymmetric(&boxed, &nonce, &public_key_of(&alice), &bob)?;
    assert_eq!(strip_padding(&opened)?, b"\x01hello");
    Ok(())
}

#[test]
fn file_and_thumbnail_share_key_under_distinct_nonces() -> std::result::Result<(), GatewayError> {
    let key = generate_shared_key()?;
    let file = seal_symmetric(b"same bytes", &FILE_NONCE, &key)?;
    let thumb = seal_symmetric(b"same bytes", &THUMBNAIL_NONCE, &key)?;
    assert_ne!(file, thumb);
    assert_eq!(open_symmetric(&file, &FILE_NONCE, &key)?, b"same bytes");
    assert_eq!(open_symmetric(&thumb, &THUMBNAIL_NONCE, &key)?, b"same bytes");
    Ok(())
}
