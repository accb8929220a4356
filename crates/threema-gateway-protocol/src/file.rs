//! JSON body of file messages.
//!
//! File messages carry their metadata as a compact JSON object with
//! single-letter keys:
//!
//! | Key | Meaning | Presence |
//! |-----|---------|----------|
//! | `b` | file blob id (32 hex chars) | required |
//! | `t` | thumbnail blob id | omitted when absent |
//! | `k` | shared key (64 hex chars) | required |
//! | `m` | mime type | always written |
//! | `n` | file name | omitted when empty |
//! | `s` | plaintext size in bytes | always written |
//! | `i` | format version, always `0` | ignored on read |
//! | `d` | description | omitted when empty |

use serde::{Deserialize, Serialize};
use threema_gateway_types::{BlobId, GatewayError, Result, SharedKey};

/// Metadata of a file transfer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileMessage {
    /// Blob holding the secretbox-sealed file.
    pub file_blob_id: BlobId,
    /// Blob holding the sealed thumbnail, if one was uploaded.
    pub thumbnail_blob_id: Option<BlobId>,
    /// Key both blobs were sealed with.
    pub shared_key: SharedKey,
    pub mime_type: String,
    pub file_name: String,
    /// Plaintext size of the file.
    pub size: u32,
    pub description: String,
}

#[derive(Serialize, Deserialize)]
struct FileBody {
    #[serde(rename = "b")]
    file_blob_id: String,
    #[serde(rename = "t", default, skip_serializing_if = "Option::is_none")]
    thumbnail_blob_id: Option<String>,
    #[serde(rename = "k")]
    shared_key: String,
    #[serde(rename = "m", default)]
    mime_type: String,
    #[serde(rename = "n", default, skip_serializing_if = "String::is_empty")]
    file_name: String,
    #[serde(rename = "s", default)]
    size: u64,
    #[serde(rename = "i", default)]
    version: i64,
    #[serde(rename = "d", default, skip_serializing_if = "String::is_empty")]
    description: String,
}

impl FileMessage {
    /// Serializes the JSON body.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        let body = FileBody {
            file_blob_id: self.file_blob_id.to_string(),
            thumbnail_blob_id: self.thumbnail_blob_id.map(|id| id.to_string()),
            shared_key: self.shared_key.to_hex(),
            mime_type: self.mime_type.clone(),
            file_name: self.file_name.clone(),
            size: u64::from(self.size),
            version: 0,
            description: self.description.clone(),
        };
        serde_json::to_vec(&body).map_err(|e| GatewayError::MalformedInput {
            reason: format!("cannot encode file message: {e}"),
        })
    }

    /// Parses the JSON body.
    ///
    /// An empty `t` is treated like an absent one.
    ///
    /// # Errors
    ///
    /// [`GatewayError::MalformedInput`] on invalid JSON, a missing blob id
    /// or key, wrong hex lengths, or a size that does not fit `u32`.
    pub fn from_json(content: &[u8]) -> Result<Self> {
        let body: FileBody =
            serde_json::from_slice(content).map_err(|e| GatewayError::MalformedInput {
                reason: format!("invalid file message JSON: {e}"),
            })?;

        let thumbnail_blob_id = match body.thumbnail_blob_id.as_deref() {
            None | Some("") => None,
            Some(hex) => Some(BlobId::from_hex(hex)?),
        };
        let size = u32::try_from(body.size).map_err(|_| GatewayError::MalformedInput {
            reason: format!("file size {} does not fit 32 bits", body.size),
        })?;

        Ok(Self {
            file_blob_id: BlobId::from_hex(&body.file_blob_id)?,
            thumbnail_blob_id,
            shared_key: SharedKey::from_hex(&body.shared_key)?,
            mime_type: body.mime_type,
            file_name: body.file_name,
            size,
            description: body.description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FileMessage {
        FileMessage {
            file_blob_id: BlobId::new([0x11; 16]),
            thumbnail_blob_id: None,
            shared_key: SharedKey::new([0x22; 32]),
            mime_type: "text/plain".into(),
            file_name: String::new(),
            size: 12,
            description: String::new(),
        }
    }

    #[test]
    fn optional_keys_omitted() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let json: serde_json::Value = serde_json::from_slice(&sample().to_json()?)?;
        let object = json.as_object().ok_or("not an object")?;
        assert!(object.contains_key("b"));
        assert!(object.contains_key("k"));
        assert!(object.contains_key("m"));
        assert!(object.contains_key("s"));
        assert_eq!(object.get("i"), Some(&serde_json::json!(0)));
        assert!(!object.contains_key("t"));
        assert!(!object.contains_key("n"));
        assert!(!object.contains_key("d"));
        Ok(())
    }

    #[test]
    fn all_keys_written_when_set() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let file = FileMessage {
            thumbnail_blob_id: Some(BlobId::new([0x33; 16])),
            file_name: "notes.txt".into(),
            description: "meeting notes".into(),
            ..sample()
        };
        let json: serde_json::Value = serde_json::from_slice(&file.to_json()?)?;
        assert_eq!(json["t"], "33".repeat(16));
        assert_eq!(json["k"], "22".repeat(32));
        assert_eq!(json["n"], "notes.txt");
        assert_eq!(json["d"], "meeting notes");
        assert_eq!(FileMessage::from_json(&file.to_json()?)?, file);
        Ok(())
    }

    #[test]
    fn missing_key_rejected() {
        let json = format!(r#"{{"b":"{}","m":"x","s":1,"i":0}}"#, "11".repeat(16));
        assert!(FileMessage::from_json(json.as_bytes()).is_err());
    }

    #[test]
    fn missing_blob_id_rejected() {
        let json = format!(r#"{{"k":"{}","m":"x","s":1,"i":0}}"#, "22".repeat(32));
        assert!(FileMessage::from_json(json.as_bytes()).is_err());
    }

    #[test]
    fn short_key_rejected() {
        let json = format!(r#"{{"b":"{}","k":"2222","m":"x","s":1}}"#, "11".repeat(16));
        assert!(FileMessage::from_json(json.as_bytes()).is_err());
    }

    #[test]
    fn oversized_size_rejected() {
        let json = format!(
            r#"{{"b":"{}","k":"{}","m":"x","s":4294967296}}"#,
            "11".repeat(16),
            "22".repeat(32)
        );
        assert!(FileMessage::from_json(json.as_bytes()).is_err());
    }

    #[test]
    fn empty_thumbnail_means_none() -> std::result::Result<(), GatewayError> {
        let json = format!(
            r#"{{"b":"{}","t":"","k":"{}","m":"x","s":3,"i":1}}"#,
            "11".repeat(16),
            "22".repeat(32)
        );
        let file = FileMessage::from_json(json.as_bytes())?;
        assert_eq!(file.thumbnail_blob_id, None);
        assert_eq!(file.size, 3);
        Ok(())
    }
}
