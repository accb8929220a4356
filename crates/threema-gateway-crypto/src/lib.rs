//! Cryptographic primitives for the Threema Gateway E2E protocol.
//!
//! This crate is the only place in the workspace that touches raw
//! cryptography. Higher layers pass keys and buffers in as values; no
//! function here keeps state between calls.
//!
//! # Modules
//!
//! - [`random`] - OS CSPRNG access with explicit failure reporting
//! - [`padding`] - self-describing random padding (PKCS#7-style, 1..=255)
//! - [`public_box`] - X25519 + XSalsa20-Poly1305 (NaCl `crypto_box`)
//! - [`secret_box`] - XSalsa20-Poly1305 under a shared key (NaCl `secretbox`)
//! - [`mac`] - HMAC-SHA256 for callback authentication

pub mod mac;
pub mod padding;
pub mod public_box;
pub mod random;
pub mod secret_box;
