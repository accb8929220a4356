//! Typed end-to-end messages.
//!
//! A [`Message`] is what the caller builds on the outbound path and what
//! [`crate::codec::unpack`] produces on the inbound path. Each variant
//! knows its wire type byte and how to serialize its own content; the
//! codec adds the type byte and padding around it.

use std::fmt;

use threema_gateway_types::{BlobId, GatewayError, GroupId, MessageId, Nonce, Result, SharedKey};

use crate::file::FileMessage;

/// Length of the fixed-size content of an image message.
pub const IMAGE_CONTENT_LEN: usize = BlobId::LEN + 4 + Nonce::LEN;

/// Length of the fixed-size content of a voice message.
pub const VOICE_CONTENT_LEN: usize = 2 + BlobId::LEN + 4 + SharedKey::LEN;

// ---------------------------------------------------------------------------
// MessageType
// ---------------------------------------------------------------------------

/// Wire type tags of the message variants this crate understands.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// Plain text.
    Text = 0x01,
    /// Image stored as an asymmetrically boxed blob.
    Image = 0x02,
    /// Voice recording stored as a secretbox blob.
    Voice = 0x14,
    /// File (and optional thumbnail) stored as secretbox blobs.
    File = 0x17,
    /// Text message sent to a group.
    GroupText = 0x41,
    /// Delivery or read receipt for earlier messages.
    DeliveryReceipt = 0x80,
}

impl MessageType {
    /// Returns the wire byte.
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Maps a wire byte to a known type, or `None` for unknown tags.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::Text),
            0x02 => Some(Self::Image),
            0x14 => Some(Self::Voice),
            0x17 => Some(Self::File),
            0x41 => Some(Self::GroupText),
            0x80 => Some(Self::DeliveryReceipt),
            _ => None,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Voice => "voice",
            Self::File => "file",
            Self::GroupText => "group-text",
            Self::DeliveryReceipt => "delivery-receipt",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// DeliveryReceiptKind
// ---------------------------------------------------------------------------

/// Status reported by a delivery receipt.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum DeliveryReceiptKind {
    Received = 0x01,
    Read = 0x02,
    /// Explicit "thumbs up" by the user.
    Acknowledged = 0x03,
    /// Explicit "thumbs down" by the user.
    Declined = 0x04,
}

impl DeliveryReceiptKind {
    /// Returns the wire byte.
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Maps a wire byte to a receipt kind, or `None` outside `1..=4`.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::Received),
            0x02 => Some(Self::Read),
            0x03 => Some(Self::Acknowledged),
            0x04 => Some(Self::Declined),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// An end-to-end message, one variant per wire type.
///
/// Unknown type tags decode to [`Message::Other`] so that newer message
/// types pass through instead of failing.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Message {
    /// Text content. Normally UTF-8, but carried as raw bytes.
    Text {
        content: Vec<u8>,
    },
    /// Image blob, boxed with the same key pair as the message itself.
    Image {
        blob_id: BlobId,
        /// Size of the image in bytes.
        size: u32,
        /// Nonce the image blob was boxed under.
        nonce: Nonce,
    },
    /// File blob with optional thumbnail, see [`FileMessage`].
    File(FileMessage),
    /// Voice recording blob.
    Voice {
        /// Duration in seconds.
        seconds: u16,
        blob_id: BlobId,
        size: u32,
        /// Secretbox key of the audio blob.
        shared_key: SharedKey,
    },
    /// Receipt for one or more earlier messages.
    DeliveryReceipt {
        kind: DeliveryReceiptKind,
        message_ids: Vec<MessageId>,
    },
    /// Text posted to a group.
    GroupText {
        /// Identity of the group creator, as 8 raw bytes.
        sender_id: [u8; 8],
        group_id: GroupId,
        content: String,
    },
    /// Any message with a type tag not listed in [`MessageType`].
    Other {
        raw_type: u8,
        content: Vec<u8>,
    },
}

impl Message {
    /// Builds a text message from a string.
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into().into_bytes(),
        }
    }

    /// Returns the wire type byte of this message.
    pub fn type_byte(&self) -> u8 {
        match self {
            Self::Text { .. } => MessageType::Text.as_byte(),
            Self::Image { .. } => MessageType::Image.as_byte(),
            Self::File(_) => MessageType::File.as_byte(),
            Self::Voice { .. } => MessageType::Voice.as_byte(),
            Self::DeliveryReceipt { .. } => MessageType::DeliveryReceipt.as_byte(),
            Self::GroupText { .. } => MessageType::GroupText.as_byte(),
            Self::Other { raw_type, .. } => *raw_type,
        }
    }

    /// Returns the known message type, or `None` for [`Message::Other`].
    pub fn message_type(&self) -> Option<MessageType> {
        match self {
            Self::Other { .. } => None,
            _ => MessageType::from_byte(self.type_byte()),
        }
    }

    /// Serializes the variant content, without type byte or padding.
    ///
    /// # Errors
    ///
    /// [`GatewayError::MalformedInput`] for a delivery receipt without
    /// message ids, which could not be decoded again.
    ///
    /// [`GatewayError::ProtocolViolation`] for [`Message::Other`] carrying
    /// the tag of a known type; it would decode as that type instead.
    pub fn pack_content(&self) -> Result<Vec<u8>> {
        match self {
            Self::Text { content } => Ok(content.clone()),
            Self::Other { raw_type, content } => {
                if let Some(known) = MessageType::from_byte(*raw_type) {
                    return Err(GatewayError::ProtocolViolation {
                        reason: format!(
                            "raw type 0x{raw_type:02x} is reserved for {known:?} messages"
                        ),
                    });
                }
                Ok(content.clone())
            }
            Self::Image {
                blob_id,
                size,
                nonce,
            } => {
                let mut out = Vec::with_capacity(IMAGE_CONTENT_LEN);
                out.extend_from_slice(blob_id.as_bytes());
                out.extend_from_slice(&size.to_le_bytes());
                out.extend_from_slice(nonce.as_bytes());
                Ok(out)
            }
            Self::File(file) => file.to_json(),
            Self::Voice {
                seconds,
                blob_id,
                size,
                shared_key,
            } => {
                let mut out = Vec::with_capacity(VOICE_CONTENT_LEN);
                out.extend_from_slice(&seconds.to_le_bytes());
                out.extend_from_slice(blob_id.as_bytes());
                out.extend_from_slice(&size.to_le_bytes());
                out.extend_from_slice(shared_key.as_bytes());
                Ok(out)
            }
            Self::DeliveryReceipt { kind, message_ids } => {
                if message_ids.is_empty() {
                    return Err(GatewayError::MalformedInput {
                        reason: "delivery receipt needs at least one message id".into(),
                    });
                }
                let mut out = Vec::with_capacity(1 + message_ids.len() * MessageId::LEN);
                out.push(kind.as_byte());
                for id in message_ids {
                    out.extend_from_slice(id.as_bytes());
                }
                Ok(out)
            }
            Self::GroupText {
                sender_id,
                group_id,
                content,
            } => {
                let mut out = Vec::with_capacity(16 + content.len());
                out.extend_from_slice(sender_id);
                out.extend_from_slice(group_id.as_bytes());
                out.extend_from_slice(content.as_bytes());
                Ok(out)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Quoting
// ---------------------------------------------------------------------------

/// Formats a reply that quotes an earlier text.
///
/// Every line of `quote` is prefixed with `"> "`. The sender label is
/// placed directly before the first quoted line, and `response` follows
/// on its own line.
///
/// ```
/// use threema_gateway_protocol::message::quote_text;
///
/// let reply = quote_text("ECHOECHO: ", "hi\nthere", "hello");
/// assert_eq!(reply, "> ECHOECHO: hi\n> there\nhello");
/// ```
pub fn quote_text(sender: &str, quote: &str, response: &str) -> String {
    let quoted = quote.split('\n').collect::<Vec<_>>().join("\n> ");
    format!("> {sender}{quoted}\n{response}")
}
