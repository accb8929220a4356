//! Integration tests for the payload codec.
//!
//! Round trips use random field values; the padding is random too and
//! must be discarded by `unpack`.

use rand::Rng;
use threema_gateway_protocol::codec::{pack, unpack};
use threema_gateway_protocol::file::FileMessage;
use threema_gateway_protocol::message::{DeliveryReceiptKind, Message};
use threema_gateway_types::{
    BlobId, ErrorKind, GatewayError, GroupId, MessageId, Nonce, SharedKey,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn assert_roundtrip(msg: &Message) -> std::result::Result<(), GatewayError> {
    let packed = pack(msg)?;
    assert_eq!(packed[0], msg.type_byte());
    let padding = usize::from(*packed.last().unwrap_or(&0));
    assert!((1..=255).contains(&padding));
    assert_eq!(&unpack(&packed)?, msg);
    Ok(())
}

fn random_text(rng: &mut impl Rng) -> String {
    let len = rng.gen_range(0..200);
    (0..len).map(|_| rng.gen_range('a'..='z')).collect()
}

// ---------------------------------------------------------------------------
// Round trips
// ---------------------------------------------------------------------------

#[test]
fn every_variant_roundtrips() -> std::result::Result<(), GatewayError> {
    let mut rng = rand::thread_rng();
    for _ in 0..50 {
        let messages = [
            Message::Text {
                content: random_text(&mut rng).into_bytes(),
            },
            Message::Image {
                blob_id: BlobId::new(rng.gen()),
                size: rng.gen(),
                nonce: Nonce::new(rng.gen()),
            },
            Message::File(FileMessage {
                file_blob_id: BlobId::new(rng.gen()),
                thumbnail_blob_id: rng.gen_bool(0.5).then(|| BlobId::new(rng.gen())),
                shared_key: SharedKey::new(rng.gen()),
                mime_type: "application/pdf".into(),
                file_name: random_text(&mut rng),
                size: rng.gen(),
                description: random_text(&mut rng),
            }),
            Message::Voice {
                seconds: rng.gen(),
                blob_id: BlobId::new(rng.gen()),
                size: rng.gen(),
                shared_key: SharedKey::new(rng.gen()),
            },
            Message::DeliveryReceipt {
                kind: DeliveryReceiptKind::Acknowledged,
                message_ids: (0..rng.gen_range(1..10))
                    .map(|_| MessageId::new(rng.gen()))
                    .collect(),
            },
            Message::GroupText {
                sender_id: *b"ECHOECHO",
                group_id: GroupId::new(rng.gen()),
                content: random_text(&mut rng),
            },
            Message::Other {
                raw_type: 0xFE,
                content: random_text(&mut rng).into_bytes(),
            },
        ];
        for msg in &messages {
            assert_roundtrip(msg)?;
        }
    }
    Ok(())
}

#[test]
fn non_ascii_text_roundtrips() -> std::result::Result<(), GatewayError> {
    assert_roundtrip(&Message::text("Grüße 👋"))?;
    assert_roundtrip(&Message::GroupText {
        sender_id: *b"*GATEWAY",
        group_id: GroupId::new([1; 8]),
        content: "ünïcödé".into(),
    })
}

// ---------------------------------------------------------------------------
// Unknown types
// ---------------------------------------------------------------------------

#[test]
fn unknown_type_decodes_to_other() -> std::result::Result<(), GatewayError> {
    let payload = [0xFE, b'a', b'b', b'c', 0x02, 0x02];
    let msg = unpack(&payload)?;
    assert_eq!(
        msg,
        Message::Other {
            raw_type: 0xFE,
            content: b"abc".to_vec(),
        }
    );
    Ok(())
}

#[test]
fn unknown_type_with_empty_content() -> std::result::Result<(), GatewayError> {
    let msg = unpack(&[0x7A, 0x01])?;
    assert_eq!(
        msg,
        Message::Other {
            raw_type: 0x7A,
            content: Vec::new(),
        }
    );
    Ok(())
}

#[test]
fn other_with_known_tag_cannot_be_packed() {
    let text_tag = Message::Other {
        raw_type: 0x01,
        content: b"abc".to_vec(),
    };
    let receipt_tag = Message::Other {
        raw_type: 0x80,
        content: b"abc".to_vec(),
    };
    assert!(matches!(pack(&text_tag), Err(GatewayError::ProtocolViolation { .. })));
    assert!(matches!(pack(&receipt_tag), Err(GatewayError::ProtocolViolation { .. })));
}

// ---------------------------------------------------------------------------
// Delivery receipts
// ---------------------------------------------------------------------------

#[test]
fn read_receipt_with_two_ids() -> std::result::Result<(), GatewayError> {
    let mut payload = vec![0x80, 0x02];
    payload.extend_from_slice(&[0x11; 8]);
    payload.extend_from_slice(&[0x22; 8]);
    payload.extend_from_slice(&[0x03; 3]);

    let msg = unpack(&payload)?;
    assert_eq!(
        msg,
        Message::DeliveryReceipt {
            kind: DeliveryReceiptKind::Read,
            message_ids: vec![MessageId::new([0x11; 8]), MessageId::new([0x22; 8])],
        }
    );
    Ok(())
}

#[test]
fn misaligned_receipt_is_malformed() {
    let mut payload = vec![0x80, 0x02];
    payload.extend_from_slice(&[0x11; 10]);
    payload.push(0x01);

    let err = unpack(&payload).err();
    assert!(matches!(
        err,
        Some(GatewayError::VariantDecode { message_type: 0x80, .. })
    ));
    assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::MalformedInput));
}

#[test]
fn receipt_without_ids_is_malformed() {
    let result = unpack(&[0x80, 0x01, 0x01]);
    assert!(matches!(result, Err(GatewayError::VariantDecode { .. })));
}

// ---------------------------------------------------------------------------
// Fixed-size variants
// ---------------------------------------------------------------------------

#[test]
fn voice_with_trailing_bytes_rejected() {
    let mut payload = vec![0x14];
    payload.extend_from_slice(&[0u8; 55]);
    payload.push(0x01);
    assert!(matches!(
        unpack(&payload),
        Err(GatewayError::VariantDecode { message_type: 0x14, .. })
    ));
}

#[test]
fn file_with_invalid_json_rejected() {
    let mut payload = vec![0x17];
    payload.extend_from_slice(b"{not json");
    payload.push(0x01);
    assert!(matches!(
        unpack(&payload),
        Err(GatewayError::VariantDecode { message_type: 0x17, .. })
    ));
}
