//! Padded payload codec.
//!
//! A packed payload is `type byte ++ content ++ padding`. The padding
//! comes from [`threema_gateway_crypto::padding`] and is always at least
//! one byte, so the shortest valid payload is two bytes long.

use threema_gateway_crypto::padding::{generate_padding, strip_padding};
use threema_gateway_types::{BlobId, GatewayError, GroupId, MessageId, Nonce, Result, SharedKey};

use crate::file::FileMessage;
use crate::message::{
    DeliveryReceiptKind, Message, MessageType, IMAGE_CONTENT_LEN, VOICE_CONTENT_LEN,
};

/// Shortest payload that can hold a type byte and padding.
pub const MIN_PAYLOAD_LEN: usize = 2;

/// Packs `message` into a padded payload ready for boxing.
///
/// # Errors
///
/// Propagates content encoding errors and
/// [`GatewayError::RandomSource`] from padding generation.
pub fn pack(message: &Message) -> Result<Vec<u8>> {
    let content = message.pack_content()?;
    let padding = generate_padding()?;

    let mut payload = Vec::with_capacity(1 + content.len() + padding.len());
    payload.push(message.type_byte());
    payload.extend_from_slice(&content);
    payload.extend_from_slice(&padding);

    tracing::debug!(
        message_type = message.type_byte(),
        len = payload.len(),
        "packed message"
    );
    Ok(payload)
}

/// Unpacks a padded payload into a [`Message`].
///
/// Unknown type bytes yield [`Message::Other`].
///
/// # Errors
///
/// - [`GatewayError::EmptyOrTooShort`] below [`MIN_PAYLOAD_LEN`] bytes.
/// - [`GatewayError::InvalidPadding`] for a zero padding length or one
///   that would consume the type byte.
/// - [`GatewayError::VariantDecode`] if a known type has invalid content.
pub fn unpack(payload: &[u8]) -> Result<Message> {
    if payload.len() < MIN_PAYLOAD_LEN {
        return Err(GatewayError::EmptyOrTooShort { len: payload.len() });
    }
    let body = strip_padding(payload)?;
    let (&type_byte, content) = body
        .split_first()
        .ok_or(GatewayError::EmptyOrTooShort { len: payload.len() })?;

    let Some(message_type) = MessageType::from_byte(type_byte) else {
        return Ok(Message::Other {
            raw_type: type_byte,
            content: content.to_vec(),
        });
    };

    decode_content(message_type, content).map_err(|e| GatewayError::VariantDecode {
        message_type: type_byte,
        reason: e.to_string(),
    })
}

fn decode_content(message_type: MessageType, content: &[u8]) -> Result<Message> {
    match message_type {
        MessageType::Text => Ok(Message::Text {
            content: content.to_vec(),
        }),
        MessageType::Image => decode_image(content),
        MessageType::File => FileMessage::from_json(content).map(Message::File),
        MessageType::Voice => decode_voice(content),
        MessageType::DeliveryReceipt => decode_receipt(content),
        MessageType::GroupText => decode_group_text(content),
    }
}

fn expect_len(content: &[u8], expected: usize, what: &str) -> Result<()> {
    if content.len() != expected {
        return Err(GatewayError::MalformedInput {
            reason: format!("{what} content must be {expected} bytes, got {}", content.len()),
        });
    }
    Ok(())
}

fn read_u32_le(bytes: &[u8]) -> Result<u32> {
    let array: [u8; 4] = bytes.try_into().map_err(|_| GatewayError::MalformedInput {
        reason: "truncated 32-bit field".into(),
    })?;
    Ok(u32::from_le_bytes(array))
}

fn decode_image(content: &[u8]) -> Result<Message> {
    expect_len(content, IMAGE_CONTENT_LEN, "image")?;
    let (blob_id, rest) = content.split_at(BlobId::LEN);
    let (size, nonce) = rest.split_at(4);
    Ok(Message::Image {
        blob_id: BlobId::from_slice(blob_id)?,
        size: read_u32_le(size)?,
        nonce: Nonce::from_slice(nonce)?,
    })
}

fn decode_voice(content: &[u8]) -> Result<Message> {
    expect_len(content, VOICE_CONTENT_LEN, "voice")?;
    let (seconds, rest) = content.split_at(2);
    let (blob_id, rest) = rest.split_at(BlobId::LEN);
    let (size, shared_key) = rest.split_at(4);
    Ok(Message::Voice {
        seconds: u16::from_le_bytes([seconds[0], seconds[1]]),
        blob_id: BlobId::from_slice(blob_id)?,
        size: read_u32_le(size)?,
        shared_key: SharedKey::from_slice(shared_key)?,
    })
}

fn decode_receipt(content: &[u8]) -> Result<Message> {
    if content.len() < 1 + MessageId::LEN || (content.len() - 1) % MessageId::LEN != 0 {
        return Err(GatewayError::MalformedInput {
            reason: format!("invalid delivery receipt length {}", content.len()),
        });
    }
    let kind = DeliveryReceiptKind::from_byte(content[0]).ok_or_else(|| {
        GatewayError::MalformedInput {
            reason: format!("unknown delivery receipt kind {:#04x}", content[0]),
        }
    })?;
    let message_ids = content[1..]
        .chunks_exact(MessageId::LEN)
        .map(MessageId::from_slice)
        .collect::<Result<Vec<_>>>()?;
    Ok(Message::DeliveryReceipt { kind, message_ids })
}

fn decode_group_text(content: &[u8]) -> Result<Message> {
    if content.len() < 8 + GroupId::LEN {
        return Err(GatewayError::MalformedInput {
            reason: format!("group text too short ({} bytes)", content.len()),
        });
    }
    let (sender, rest) = content.split_at(8);
    let (group_id, text) = rest.split_at(GroupId::LEN);
    let mut sender_id = [0u8; 8];
    sender_id.copy_from_slice(sender);
    let content = String::from_utf8(text.to_vec()).map_err(|e| GatewayError::MalformedInput {
        reason: format!("group text is not UTF-8: {e}"),
    })?;
    Ok(Message::GroupText {
        sender_id,
        group_id: GroupId::from_slice(group_id)?,
        content,
    })
}
