//! Blob references and shared-key blob sealing.
//!
//! Media content does not travel inside the message box. It is sealed,
//! uploaded to the blob service, and the message only carries a
//! reference to it. Files use a fresh [`SharedKey`] that seals at most
//! two blobs, the file itself and its thumbnail, each under its own
//! fixed nonce.

use threema_gateway_crypto::secret_box::{
    generate_shared_key, open_symmetric, seal_symmetric, FILE_NONCE, THUMBNAIL_NONCE,
};
use threema_gateway_types::{BlobId, GatewayError, Nonce, Result, SharedKey};

use crate::message::Message;

// ---------------------------------------------------------------------------
// BlobReference
// ---------------------------------------------------------------------------

/// Points at an uploaded ciphertext blob.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BlobReference {
    blob_id: BlobId,
    size: u32,
    nonce: Nonce,
}

impl BlobReference {
    /// Creates a reference from the upload result.
    ///
    /// `size` is the plaintext size and `nonce` the one used for sealing.
    pub fn new(blob_id: BlobId, size: u32, nonce: Nonce) -> Self {
        Self {
            blob_id,
            size,
            nonce,
        }
    }

    pub fn blob_id(&self) -> &BlobId {
        &self.blob_id
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn nonce(&self) -> &Nonce {
        &self.nonce
    }

    /// Builds the image message announcing this blob.
    pub fn to_image_message(&self) -> Message {
        Message::Image {
            blob_id: self.blob_id,
            size: self.size,
            nonce: self.nonce,
        }
    }
}

// ---------------------------------------------------------------------------
// BlobSealer
// ---------------------------------------------------------------------------

/// Which of the two blobs of a file transfer a ciphertext belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BlobSlot {
    File,
    Thumbnail,
}

impl BlobSlot {
    /// The fixed nonce of this slot.
    pub fn nonce(self) -> Nonce {
        match self {
            Self::File => FILE_NONCE,
            Self::Thumbnail => THUMBNAIL_NONCE,
        }
    }
}

/// A sealed blob waiting for upload.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SealedBlob {
    pub slot: BlobSlot,
    /// Secretbox output (tag followed by ciphertext).
    pub ciphertext: Vec<u8>,
    /// Size of the plaintext that was sealed.
    pub plaintext_len: u32,
}

impl SealedBlob {
    /// Turns the upload result into a [`BlobReference`].
    pub fn into_reference(self, blob_id: BlobId) -> BlobReference {
        BlobReference::new(blob_id, self.plaintext_len, self.slot.nonce())
    }
}

/// Seals the blobs of one file transfer under a single shared key.
///
/// Each slot accepts exactly one blob. Reusing a slot would encrypt two
/// plaintexts under the same key and nonce and is rejected.
#[derive(Debug)]
pub struct BlobSealer {
    key: SharedKey,
    file_sealed: bool,
    thumbnail_sealed: bool,
}

impl BlobSealer {
    /// Creates a sealer with a freshly generated shared key.
    pub fn new() -> Result<Self> {
        Ok(Self::with_key(generate_shared_key()?))
    }

    /// Creates a sealer around an existing key.
    pub fn with_key(key: SharedKey) -> Self {
        Self {
            key,
            file_sealed: false,
            thumbnail_sealed: false,
        }
    }

    /// The key the receiver needs to open the blobs.
    pub fn shared_key(&self) -> &SharedKey {
        &self.key
    }

    /// Seals the file blob under [`FILE_NONCE`].
    ///
    /// # Errors
    ///
    /// [`GatewayError::ProtocolViolation`] if a file blob was already
    /// sealed with this key.
    pub fn seal_file(&mut self, plaintext: &[u8]) -> Result<SealedBlob> {
        self.seal(BlobSlot::File, plaintext)
    }

    /// Seals the thumbnail blob under [`THUMBNAIL_NONCE`].
    ///
    /// # Errors
    ///
    /// [`GatewayError::ProtocolViolation`] if a thumbnail was already
    /// sealed with this key.
    pub fn seal_thumbnail(&mut self, plaintext: &[u8]) -> Result<SealedBlob> {
        self.seal(BlobSlot::Thumbnail, plaintext)
    }

    fn seal(&mut self, slot: BlobSlot, plaintext: &[u8]) -> Result<SealedBlob> {
        let used = match slot {
            BlobSlot::File => &mut self.file_sealed,
            BlobSlot::Thumbnail => &mut self.thumbnail_sealed,
        };
        if *used {
            return Err(GatewayError::ProtocolViolation {
                reason: format!("{slot:?} blob already sealed with this shared key"),
            });
        }
        let plaintext_len =
            u32::try_from(plaintext.len()).map_err(|_| GatewayError::MalformedInput {
                reason: format!("blob of {} bytes exceeds 32-bit size", plaintext.len()),
            })?;
        let ciphertext = seal_symmetric(plaintext, &slot.nonce(), &self.key)?;
        *used = true;

        tracing::debug!(?slot, len = ciphertext.len(), "sealed blob");
        Ok(SealedBlob {
            slot,
            ciphertext,
            plaintext_len,
        })
    }
}

/// Opens a downloaded blob of a file transfer.
///
/// # Errors
///
/// [`GatewayError::AuthenticationFailed`] if the blob does not open
/// under `key` and the slot's nonce.
pub fn open_blob(slot: BlobSlot, ciphertext: &[u8], key: &SharedKey) -> Result<Vec<u8>> {
    open_symmetric(ciphertext, &slot.nonce(), key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_accessors() {
        let reference = BlobReference::new(BlobId::new([1; 16]), 42, Nonce::new([2; 24]));
        assert_eq!(reference.blob_id(), &BlobId::new([1; 16]));
        assert_eq!(reference.size(), 42);
        assert_eq!(reference.nonce(), &Nonce::new([2; 24]));
    }

    #[test]
    fn reference_builds_image_message() {
        let reference = BlobReference::new(BlobId::new([1; 16]), 42, Nonce::new([2; 24]));
        assert_eq!(
            reference.to_image_message(),
            Message::Image {
                blob_id: BlobId::new([1; 16]),
                size: 42,
                nonce: Nonce::new([2; 24]),
            }
        );
    }

    #[test]
    fn file_and_thumbnail_use_distinct_nonces() -> std::result::Result<(), GatewayError> {
        let mut sealer = BlobSealer::new()?;
        let file = sealer.seal_file(b"document")?;
        let thumb = sealer.seal_thumbnail(b"preview")?;
        let file_ref = file.into_reference(BlobId::new([1; 16]));
        let thumb_ref = thumb.into_reference(BlobId::new([2; 16]));
        assert_ne!(file_ref.nonce(), thumb_ref.nonce());
        assert_eq!(file_ref.nonce().as_bytes()[23], 0x01);
        assert_eq!(thumb_ref.nonce().as_bytes()[23], 0x02);
        assert_eq!(file_ref.size(), 8);
        Ok(())
    }

    #[test]
    fn slot_reuse_rejected() -> std::result::Result<(), GatewayError> {
        let mut sealer = BlobSealer::new()?;
        sealer.seal_file(b"one")?;
        let again = sealer.seal_file(b"two");
        assert!(matches!(again, Err(GatewayError::ProtocolViolation { .. })));

        sealer.seal_thumbnail(b"thumb")?;
        assert!(sealer.seal_thumbnail(b"thumb").is_err());
        Ok(())
    }

    #[test]
    fn sealed_blob_opens_only_in_its_slot() -> std::result::Result<(), GatewayError> {
        let mut sealer = BlobSealer::with_key(SharedKey::new([9; 32]));
        let sealed = sealer.seal_thumbnail(b"tiny picture")?;
        let key = sealer.shared_key();
        assert_eq!(open_blob(BlobSlot::Thumbnail, &sealed.ciphertext, key)?, b"tiny picture");
        assert!(open_blob(BlobSlot::File, &sealed.ciphertext, key).is_err());
        Ok(())
    }
}
