//! Raw callback fields and their authenticated, decoded form.
//!
//! [`RawCallback::from_form`] only checks presence and string lengths.
//! Nothing is hex-decoded or parsed until the MAC has been verified in
//! [`RawCallback::authenticate_with`]; the MAC itself is the single
//! exception, since it has to be decoded to be compared.

use chrono::{DateTime, TimeZone, Utc};
use threema_gateway_crypto::mac::HMAC_SHA256_LEN;
use threema_gateway_crypto::public_box::open_asymmetric;
use threema_gateway_protocol::codec::unpack;
use threema_gateway_protocol::message::Message;
use threema_gateway_types::config::{
    GatewayConfig, DEFAULT_MAX_BOX_BYTES, DEFAULT_MAX_NICKNAME_CHARS,
};
use threema_gateway_types::{
    EncryptedMessage, GatewayError, Identity, MessageId, Nonce, PublicKey, Result, SecretKey,
};

use crate::verify::{CallbackFields, MacPolicy};

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Size limits applied to inbound callbacks.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CallbackLimits {
    /// Maximum decoded box size in bytes.
    pub max_box_bytes: usize,
    /// Longer nicknames are truncated to this many characters.
    pub max_nickname_chars: usize,
}

impl Default for CallbackLimits {
    fn default() -> Self {
        Self {
            max_box_bytes: DEFAULT_MAX_BOX_BYTES,
            max_nickname_chars: DEFAULT_MAX_NICKNAME_CHARS,
        }
    }
}

impl From<&GatewayConfig> for CallbackLimits {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            max_box_bytes: config.max_box_bytes,
            max_nickname_chars: config.max_nickname_chars,
        }
    }
}

// ---------------------------------------------------------------------------
// RawCallback
// ---------------------------------------------------------------------------

/// Callback form fields exactly as received.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawCallback {
    pub from: String,
    pub to: String,
    pub message_id: String,
    pub date: String,
    pub nonce: String,
    pub box_hex: String,
    pub mac: String,
    /// Public nickname of the sender, already truncated. Not covered by
    /// the MAC.
    pub nickname: Option<String>,
    limits: CallbackLimits,
}

fn fixed_len_field(value: Option<String>, name: &str, len: usize) -> Result<String> {
    let value = value.filter(|v| !v.is_empty()).ok_or_else(|| GatewayError::MalformedInput {
        reason: format!("missing callback parameter {name}"),
    })?;
    if value.len() != len {
        return Err(GatewayError::MalformedInput {
            reason: format!("callback parameter {name} must be {len} chars, got {}", value.len()),
        });
    }
    Ok(value)
}

impl RawCallback {
    /// Extracts the callback fields from decoded form pairs with the
    /// default limits.
    pub fn from_form<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self::from_form_with_limits(pairs, CallbackLimits::default())
    }

    /// Extracts the callback fields from decoded form pairs.
    ///
    /// When a key repeats, its first value wins. Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// [`GatewayError::MalformedInput`] if `from`, `to`, `messageId`,
    /// `nonce` or `mac` is missing or has the wrong length.
    pub fn from_form_with_limits<I, K, V>(pairs: I, limits: CallbackLimits) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut from = None;
        let mut to = None;
        let mut message_id = None;
        let mut date = None;
        let mut nonce = None;
        let mut box_hex = None;
        let mut mac = None;
        let mut nickname = None;

        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "from" => &mut from,
                "to" => &mut to,
                "messageId" => &mut message_id,
                "date" => &mut date,
                "nonce" => &mut nonce,
                "box" => &mut box_hex,
                "mac" => &mut mac,
                "nickname" => &mut nickname,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into());
            }
        }

        Ok(Self {
            from: fixed_len_field(from, "from", Identity::LEN)?,
            to: fixed_len_field(to, "to", Identity::LEN)?,
            message_id: fixed_len_field(message_id, "messageId", MessageId::LEN * 2)?,
            date: date.unwrap_or_default(),
            nonce: fixed_len_field(nonce, "nonce", Nonce::LEN * 2)?,
            box_hex: box_hex.unwrap_or_default(),
            mac: fixed_len_field(mac, "mac", HMAC_SHA256_LEN * 2)?,
            nickname: nickname
                .filter(|n: &String| !n.is_empty())
                .map(|n| n.chars().take(limits.max_nickname_chars).collect()),
            limits,
        })
    }

    /// The MAC-covered fields.
    pub fn fields(&self) -> CallbackFields<'_> {
        CallbackFields {
            from: &self.from,
            to: &self.to,
            message_id: &self.message_id,
            date: &self.date,
            nonce: &self.nonce,
            box_hex: &self.box_hex,
        }
    }

    /// Verifies the MAC against `api_secret`, then decodes the fields.
    pub fn authenticate(&self, api_secret: &str) -> Result<CallbackMessage> {
        self.authenticate_with(&MacPolicy::Verify(api_secret.to_owned()))
    }

    /// Applies `policy`, then decodes the fields.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::MalformedInput`] if the MAC is not hex.
    /// - [`GatewayError::MacMismatch`] if verification fails.
    /// - [`GatewayError::MalformedInput`] if any field fails to decode
    ///   after verification or the box exceeds the size limit.
    pub fn authenticate_with(&self, policy: &MacPolicy) -> Result<CallbackMessage> {
        let mut mac = [0u8; HMAC_SHA256_LEN];
        hex::decode_to_slice(&self.mac, &mut mac).map_err(|e| GatewayError::MalformedInput {
            reason: format!("callback mac is not hex: {e}"),
        })?;

        policy.check(&self.fields(), &mac)?;

        let seconds = parse_unix_seconds(&self.date)?;
        let date = Utc
            .timestamp_opt(seconds, 0)
            .single()
            .ok_or_else(|| GatewayError::MalformedInput {
                reason: format!("callback date {seconds} out of range"),
            })?;

        if self.box_hex.len() > self.limits.max_box_bytes * 2 {
            return Err(GatewayError::MalformedInput {
                reason: format!(
                    "callback box exceeds {} bytes",
                    self.limits.max_box_bytes
                ),
            });
        }
        let boxed = hex::decode(&self.box_hex).map_err(|e| GatewayError::MalformedInput {
            reason: format!("callback box is not hex: {e}"),
        })?;

        Ok(CallbackMessage {
            from: Identity::new(self.from.as_str())?,
            to: Identity::new(self.to.as_str())?,
            message_id: MessageId::from_hex(&self.message_id)?,
            date,
            nonce: Nonce::from_hex(&self.nonce)?,
            boxed,
            mac,
            nickname: self.nickname.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// CallbackMessage
// ---------------------------------------------------------------------------

/// An inbound callback whose MAC has been checked.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CallbackMessage {
    /// Sender identity.
    pub from: Identity,
    /// Gateway identity the message was sent to.
    pub to: Identity,
    pub message_id: MessageId,
    pub date: DateTime<Utc>,
    pub nonce: Nonce,
    pub boxed: Vec<u8>,
    pub mac: [u8; HMAC_SHA256_LEN],
    pub nickname: Option<String>,
}

impl CallbackMessage {
    /// The box and nonce as an [`EncryptedMessage`].
    pub fn encrypted(&self) -> EncryptedMessage {
        EncryptedMessage {
            nonce: self.nonce,
            boxed: self.boxed.clone(),
        }
    }

    /// Opens the box with the gateway's secret key and unpacks the
    /// message.
    ///
    /// `sender` must be the public key of [`CallbackMessage::from`].
    pub fn open(&self, recipient: &SecretKey, sender: &PublicKey) -> Result<Message> {
        let payload = open_asymmetric(&self.boxed, &self.nonce, sender, recipient)?;
        unpack(&payload)
    }
}

/// Parses a decimal UNIX timestamp: ASCII digits only, no sign.
fn parse_unix_seconds(date: &str) -> Result<i64> {
    let not_timestamp = || GatewayError::MalformedInput {
        reason: format!("callback date {date:?} is not a UNIX timestamp"),
    };
    if date.is_empty() || !date.bytes().all(|b| b.is_ascii_digit()) {
        return Err(not_timestamp());
    }
    let seconds: u64 = date.parse().map_err(|_| not_timestamp())?;
    i64::try_from(seconds).map_err(|_| GatewayError::MalformedInput {
        reason: format!("callback date {seconds} out of range"),
    })
}
