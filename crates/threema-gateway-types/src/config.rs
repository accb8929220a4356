//! Gateway configuration with sensible defaults.
//!
//! Loaded from a JSON file or built in code. Every value has a documented
//! default matching the limits of the Threema Gateway callback interface.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{GatewayError, Identity, Result, SecretKey};

/// Default capacity of the inbound callback queue.
pub const DEFAULT_CALLBACK_QUEUE_CAPACITY: usize = 256;

/// Maximum decoded size of a callback `box` field, in bytes.
pub const DEFAULT_MAX_BOX_BYTES: usize = 4000;

/// Maximum length of the (unauthenticated) sender nickname.
pub const DEFAULT_MAX_NICKNAME_CHARS: usize = 32;

/// Gateway configuration.
///
/// Example `gateway.json`:
/// ```json
/// {
///   "identity": "*MYGATEW",
///   "api_secret": "s3cr3t",
///   "secret_key_hex": "0101010101010101010101010101010101010101010101010101010101010101"
/// }
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Gateway identity used as sender (8 characters, usually `*`-prefixed).
    pub identity: Identity,

    /// API secret shared with the gateway. Keys the callback MAC.
    pub api_secret: String,

    /// Hex-encoded X25519 secret key of the gateway identity.
    pub secret_key_hex: String,

    /// Capacity of the bounded inbound callback queue.
    #[serde(default = "default_callback_queue_capacity")]
    pub callback_queue_capacity: usize,

    /// Maximum decoded size of an inbound box.
    #[serde(default = "default_max_box_bytes")]
    pub max_box_bytes: usize,

    /// Nicknames longer than this are truncated.
    #[serde(default = "default_max_nickname_chars")]
    pub max_nickname_chars: usize,

    /// Whether inbound callbacks must carry a valid MAC.
    ///
    /// Only disable for local testing against a fake gateway.
    #[serde(default = "default_true")]
    pub verify_callback_mac: bool,
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("identity", &self.identity)
            .field("api_secret", &"..")
            .field("secret_key_hex", &"..")
            .field("callback_queue_capacity", &self.callback_queue_capacity)
            .field("max_box_bytes", &self.max_box_bytes)
            .field("max_nickname_chars", &self.max_nickname_chars)
            .field("verify_callback_mac", &self.verify_callback_mac)
            .finish()
    }
}

fn default_callback_queue_capacity() -> usize {
    DEFAULT_CALLBACK_QUEUE_CAPACITY
}

fn default_max_box_bytes() -> usize {
    DEFAULT_MAX_BOX_BYTES
}

fn default_max_nickname_chars() -> usize {
    DEFAULT_MAX_NICKNAME_CHARS
}

fn default_true() -> bool {
    true
}

impl GatewayConfig {
    /// Builds a configuration with default limits.
    pub fn new(identity: Identity, api_secret: impl Into<String>, secret_key_hex: impl Into<String>) -> Self {
        Self {
            identity,
            api_secret: api_secret.into(),
            secret_key_hex: secret_key_hex.into(),
            callback_queue_capacity: DEFAULT_CALLBACK_QUEUE_CAPACITY,
            max_box_bytes: DEFAULT_MAX_BOX_BYTES,
            max_nickname_chars: DEFAULT_MAX_NICKNAME_CHARS,
            verify_callback_mac: true,
        }
    }

    /// Loads and validates a JSON config file.
    ///
    /// # Errors
    ///
    /// [`GatewayError::ConfigError`] if the file cannot be read, is not
    /// valid JSON, or fails [`GatewayConfig::validate`].
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| GatewayError::ConfigError {
            reason: format!("failed to read config file {}: {e}", path.display()),
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|e| GatewayError::ConfigError {
            reason: format!("invalid config JSON: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validates all configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.api_secret.is_empty() {
            return Err(GatewayError::ConfigError {
                reason: "api_secret must not be empty".into(),
            });
        }

        if SecretKey::from_hex(&self.secret_key_hex).is_err() {
            return Err(GatewayError::ConfigError {
                reason: "secret_key_hex must be 64 hex characters".into(),
            });
        }

        if self.callback_queue_capacity == 0 {
            return Err(GatewayError::ConfigError {
                reason: "callback_queue_capacity must be greater than 0".into(),
            });
        }

        if self.max_box_bytes == 0 {
            return Err(GatewayError::ConfigError {
                reason: "max_box_bytes must be greater than 0".into(),
            });
        }

        if self.max_nickname_chars == 0 {
            return Err(GatewayError::ConfigError {
                reason: "max_nickname_chars must be greater than 0".into(),
            });
        }

        Ok(())
    }

    /// Parses the configured secret key.
    pub fn secret_key(&self) -> Result<SecretKey> {
        SecretKey::from_hex(&self.secret_key_hex).map_err(|e| GatewayError::ConfigError {
            reason: format!("secret_key_hex: {e}"),
        })
    }
}
