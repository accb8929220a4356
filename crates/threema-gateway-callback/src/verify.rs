//! Callback MAC verification.
//!
//! The gateway computes
//! `HMAC-SHA256(api_secret, from ++ to ++ messageId ++ date ++ nonce ++ box)`
//! over the fields exactly as they appear in the form, i.e. the hex
//! strings and the decimal date, not their decoded bytes. The nickname
//! is not covered and stays untrusted.

use std::fmt;

use threema_gateway_crypto::mac::{hmac_sha256_parts, verify_hmac_sha256_parts, HMAC_SHA256_LEN};
use threema_gateway_types::config::GatewayConfig;
use threema_gateway_types::Result;

/// The authenticated callback fields, as wire strings.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CallbackFields<'a> {
    pub from: &'a str,
    pub to: &'a str,
    /// 16 hex characters.
    pub message_id: &'a str,
    /// Decimal UNIX timestamp.
    pub date: &'a str,
    /// 48 hex characters.
    pub nonce: &'a str,
    /// Hex-encoded box.
    pub box_hex: &'a str,
}

impl CallbackFields<'_> {
    fn parts(&self) -> [&[u8]; 6] {
        [
            self.from.as_bytes(),
            self.to.as_bytes(),
            self.message_id.as_bytes(),
            self.date.as_bytes(),
            self.nonce.as_bytes(),
            self.box_hex.as_bytes(),
        ]
    }
}

/// Computes the MAC the gateway attaches to `fields`.
pub fn compute_mac(fields: &CallbackFields<'_>, api_secret: &str) -> Result<[u8; HMAC_SHA256_LEN]> {
    hmac_sha256_parts(api_secret.as_bytes(), &fields.parts())
}

/// Verifies `provided_mac` over `fields` in constant time.
///
/// # Errors
///
/// [`threema_gateway_types::GatewayError::MacMismatch`] on mismatch.
pub fn verify(
    fields: &CallbackFields<'_>,
    provided_mac: &[u8; HMAC_SHA256_LEN],
    api_secret: &str,
) -> Result<()> {
    verify_hmac_sha256_parts(api_secret.as_bytes(), &fields.parts(), provided_mac)
}

// ---------------------------------------------------------------------------
// MacPolicy
// ---------------------------------------------------------------------------

/// Whether inbound callbacks must carry a valid MAC.
#[derive(Clone)]
pub enum MacPolicy {
    /// Verify against this API secret.
    Verify(String),
    /// Accept every callback. Only for local testing against a fake
    /// gateway.
    Skip,
}

impl MacPolicy {
    /// Picks the policy configured in `config`.
    pub fn from_config(config: &GatewayConfig) -> Self {
        if config.verify_callback_mac {
            Self::Verify(config.api_secret.clone())
        } else {
            Self::Skip
        }
    }

    /// Applies the policy to one callback.
    pub fn check(&self, fields: &CallbackFields<'_>, provided_mac: &[u8; HMAC_SHA256_LEN]) -> Result<()> {
        match self {
            Self::Verify(secret) => verify(fields, provided_mac, secret),
            Self::Skip => {
                tracing::warn!(
                    from = fields.from,
                    message_id = fields.message_id,
                    "callback MAC verification skipped"
                );
                Ok(())
            }
        }
    }
}

impl fmt::Debug for MacPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verify(_) => f.write_str("Verify(..)"),
            Self::Skip => f.write_str("Skip"),
        }
    }
}
