//! Core shared types for the Threema Gateway end-to-end protocol.
//!
//! This crate defines the fixed-size identifiers and key material used on
//! the wire, the gateway identity type, and the central [`GatewayError`].
//! Every other crate in the workspace builds on these definitions.

pub mod config;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

// ---------------------------------------------------------------------------
// Hex helpers
// ---------------------------------------------------------------------------

/// Decodes `value` as exactly `N` bytes of lowercase or uppercase hex.
///
/// `what` names the field in the error message.
fn decode_fixed_hex<const N: usize>(value: &str, what: &str) -> Result<[u8; N]> {
    if value.len() != N * 2 {
        return Err(GatewayError::MalformedInput {
            reason: format!(
                "{what}: expected {} hex chars, got {}",
                N * 2,
                value.len()
            ),
        });
    }
    let mut out = [0u8; N];
    hex::decode_to_slice(value, &mut out).map_err(|e| GatewayError::MalformedInput {
        reason: format!("{what}: invalid hex encoding: {e}"),
    })?;
    Ok(out)
}

/// Declares a public, copyable fixed-size byte identifier with hex
/// display and parsing.
macro_rules! fixed_id {
    ($(#[$meta:meta])* $name:ident, $len:expr, $what:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
        pub struct $name([u8; $len]);

        impl $name {
            /// The fixed byte length of this value.
            pub const LEN: usize = $len;

            /// Creates a new value from raw bytes.
            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// Returns the underlying bytes.
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Parses the hex wire representation.
            ///
            /// # Errors
            ///
            /// [`GatewayError::MalformedInput`] on wrong length or invalid hex.
            pub fn from_hex(value: &str) -> Result<Self> {
                decode_fixed_hex::<$len>(value, $what).map(Self)
            }

            /// Copies exactly `LEN` bytes out of `slice`.
            ///
            /// # Errors
            ///
            /// [`GatewayError::MalformedInput`] if `slice` has the wrong length.
            pub fn from_slice(slice: &[u8]) -> Result<Self> {
                let bytes: [u8; $len] =
                    slice.try_into().map_err(|_| GatewayError::MalformedInput {
                        reason: format!(
                            "{}: expected {} bytes, got {}",
                            $what,
                            $len,
                            slice.len()
                        ),
                    })?;
                Ok(Self(bytes))
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", hex::encode(self.0))
            }
        }

        impl FromStr for $name {
            type Err = GatewayError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

fixed_id!(
    /// Message identifier assigned by the sender (8 bytes, hex on the wire).
    ///
    /// Referenced by delivery receipts and carried by inbound callbacks.
    MessageId,
    8,
    "message id"
);

fixed_id!(
    /// Identifier of an uploaded ciphertext blob (16 bytes).
    BlobId,
    16,
    "blob id"
);

fixed_id!(
    /// Identifier of a group chat (8 bytes).
    GroupId,
    8,
    "group id"
);

fixed_id!(
    /// 24-byte XSalsa20 nonce.
    ///
    /// Must be unique per (key pair, message). Outbound messages use a
    /// fresh random nonce; file blobs use the fixed blob nonces.
    Nonce,
    24,
    "nonce"
);

fixed_id!(
    /// X25519 public key (32 bytes).
    PublicKey,
    32,
    "public key"
);

// ---------------------------------------------------------------------------
// Secret key material
// ---------------------------------------------------------------------------

/// X25519 secret key (32 bytes) of the sending gateway identity.
///
/// Zeroized on drop. Does not implement `Clone`, and its `Debug` output
/// never contains key bytes.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; 32]);

impl SecretKey {
    /// The fixed byte length of a secret key.
    pub const LEN: usize = 32;

    /// Creates a secret key from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parses a 64-character hex secret key.
    pub fn from_hex(value: &str) -> Result<Self> {
        decode_fixed_hex::<32>(value, "secret key").map(Self)
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

/// Symmetric per-file key (32 bytes) for XSalsa20-Poly1305 secretbox.
///
/// Generated fresh for each file transfer and sent to the recipient
/// inside the asymmetrically encrypted file message.
#[derive(Clone, Eq, PartialEq, Zeroize, ZeroizeOnDrop)]
pub struct SharedKey([u8; 32]);

impl SharedKey {
    /// The fixed byte length of a shared key.
    pub const LEN: usize = 32;

    /// Creates a shared key from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parses a 64-character hex shared key.
    pub fn from_hex(value: &str) -> Result<Self> {
        decode_fixed_hex::<32>(value, "shared key").map(Self)
    }

    /// Copies exactly 32 bytes out of `slice`.
    pub fn from_slice(slice: &[u8]) -> Result<Self> {
        let bytes: [u8; 32] = slice.try_into().map_err(|_| GatewayError::MalformedInput {
            reason: format!("shared key: expected 32 bytes, got {}", slice.len()),
        })?;
        Ok(Self(bytes))
    }

    /// Lowercase hex encoding, as carried in the file message body.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for SharedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedKey(..)")
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// An 8-character Threema identity, e.g. `ECHOECHO` or the gateway
/// identity `*MYGATEW`.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    /// Number of characters in every identity.
    pub const LEN: usize = 8;

    /// Validates and wraps an identity string.
    ///
    /// # Errors
    ///
    /// [`GatewayError::MalformedInput`] unless `value` is exactly 8 ASCII
    /// characters.
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.len() != Self::LEN || !value.is_ascii() {
            return Err(GatewayError::MalformedInput {
                reason: format!("identity must be {} ASCII characters, got {value:?}", Self::LEN),
            });
        }
        Ok(Self(value))
    }

    /// Returns the identity string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the identity as its 8 wire bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl TryFrom<String> for Identity {
    type Error = GatewayError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Identity> for String {
    fn from(identity: Identity) -> Self {
        identity.0
    }
}

impl FromStr for Identity {
    type Err = GatewayError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// EncryptedMessage
// ---------------------------------------------------------------------------

/// A boxed message together with the nonce it was sealed under.
///
/// Opaque until opened with the matching key pair.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EncryptedMessage {
    /// Nonce used for the box.
    pub nonce: Nonce,
    /// NaCl box: 16-byte Poly1305 tag followed by the ciphertext.
    pub boxed: Vec<u8>,
}

// ---------------------------------------------------------------------------
// GatewayError
// ---------------------------------------------------------------------------

/// Central error type for the gateway protocol.
///
/// All crates in the workspace report failures through this enum.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A fixed-length field has the wrong size, a buffer is truncated, or
    /// an encoding (hex, decimal) is invalid.
    #[error("malformed input: {reason}")]
    MalformedInput {
        /// Human-readable description.
        reason: String,
    },

    /// A packed payload is too short to carry a type byte and padding.
    #[error("payload empty or too short ({len} bytes)")]
    EmptyOrTooShort {
        /// Length of the rejected buffer.
        len: usize,
    },

    /// The trailing padding length is zero or longer than the payload.
    #[error("invalid padding: {reason}")]
    InvalidPadding {
        /// Human-readable description.
        reason: String,
    },

    /// A known message type failed to decode.
    #[error("cannot decode message type {message_type:#04x}: {reason}")]
    VariantDecode {
        /// Wire type byte of the offending message.
        message_type: u8,
        /// Human-readable description.
        reason: String,
    },

    /// A box or secretbox failed to open (authentication tag mismatch).
    #[error("authentication failed: {reason}")]
    AuthenticationFailed {
        /// Human-readable description.
        reason: String,
    },

    /// The callback MAC does not match the computed HMAC.
    #[error("callback mac does not match")]
    MacMismatch,

    /// The OS random source failed. Not retryable.
    #[error("random source failure: {reason}")]
    RandomSource {
        /// Human-readable description.
        reason: String,
    },

    /// A protocol rule would be broken (e.g. shared key used for a third blob).
    #[error("protocol violation: {reason}")]
    ProtocolViolation {
        /// Human-readable description.
        reason: String,
    },

    /// A configuration value is invalid or missing.
    #[error("config error: {reason}")]
    ConfigError {
        /// Human-readable description.
        reason: String,
    },

    /// The external transport reported a failure.
    #[error("transport error: {reason}")]
    TransportError {
        /// Human-readable description.
        reason: String,
    },

    /// The public-key store reported a failure.
    #[error("key store error: {reason}")]
    KeyStoreError {
        /// Human-readable description.
        reason: String,
    },

    /// Reading a local file failed.
    #[error("i/o error: {reason}")]
    IoError {
        /// Human-readable description.
        reason: String,
    },
}

/// Coarse classification of [`GatewayError`] variants.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Wrong field length, truncated buffer, undecodable variant.
    MalformedInput,
    /// Zero or over-length padding.
    InvalidPadding,
    /// MAC mismatch or box-open failure.
    AuthenticationFailed,
    /// CSPRNG failure.
    RandomSourceFailure,
    /// Protocol rule violation.
    ProtocolViolation,
    /// Configuration problem.
    Config,
    /// Transport collaborator failure.
    Transport,
    /// Key-store collaborator failure.
    KeyStore,
    /// Local file access failure.
    Io,
}

impl GatewayError {
    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedInput { .. }
            | Self::EmptyOrTooShort { .. }
            | Self::VariantDecode { .. } => ErrorKind::MalformedInput,
            Self::InvalidPadding { .. } => ErrorKind::InvalidPadding,
            Self::AuthenticationFailed { .. } | Self::MacMismatch => {
                ErrorKind::AuthenticationFailed
            }
            Self::RandomSource { .. } => ErrorKind::RandomSourceFailure,
            Self::ProtocolViolation { .. } => ErrorKind::ProtocolViolation,
            Self::ConfigError { .. } => ErrorKind::Config,
            Self::TransportError { .. } => ErrorKind::Transport,
            Self::KeyStoreError { .. } => ErrorKind::KeyStore,
            Self::IoError { .. } => ErrorKind::Io,
        }
    }
}

// ---------------------------------------------------------------------------
// Result alias
// ---------------------------------------------------------------------------

/// Convenience result type using [`GatewayError`].
pub type Result<T> = std::result::Result<T, GatewayError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
