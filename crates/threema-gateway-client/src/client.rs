//! Encrypted client.
//!
//! Every send follows the same path:
//!
//! 1. Resolve the recipient's public key (cache first, then gateway).
//! 2. Pack the message with random padding.
//! 3. Box it under a fresh random nonce with the gateway secret key.
//! 4. Submit nonce and box through the transport.
//!
//! Media is uploaded as a blob before the announcing message is sent:
//! images are boxed with the same key pair as messages, files and their
//! thumbnails are sealed with a per-file shared key.

use threema_gateway_protocol::blob::{BlobReference, BlobSealer, SealedBlob};
use threema_gateway_protocol::e2e::EncryptionHelper;
use threema_gateway_protocol::file::FileMessage;
use threema_gateway_protocol::message::Message;
use threema_gateway_types::config::GatewayConfig;
use threema_gateway_types::{GatewayError, Identity, PublicKey, Result, SecretKey};

use crate::file::{FileSource, DEFAULT_MIME_TYPE};
use crate::keystore::{NoKeyStore, PublicKeyStore};
use crate::transport::Transport;

/// Sends end-to-end encrypted messages as one gateway identity.
#[derive(Debug)]
pub struct EncryptedClient<T, S = NoKeyStore> {
    identity: Identity,
    helper: EncryptionHelper,
    transport: T,
    key_store: S,
}

impl<T: Transport> EncryptedClient<T, NoKeyStore> {
    /// Creates a client without key caching.
    pub fn new(identity: Identity, secret_key: SecretKey, transport: T) -> Self {
        Self::with_key_store(identity, secret_key, transport, NoKeyStore)
    }
}

impl<T: Transport, S: PublicKeyStore> EncryptedClient<T, S> {
    /// Creates a client that caches recipient keys in `key_store`.
    pub fn with_key_store(identity: Identity, secret_key: SecretKey, transport: T, key_store: S) -> Self {
        Self {
            identity,
            helper: EncryptionHelper::new(secret_key),
            transport,
            key_store,
        }
    }

    /// Creates a client from a validated configuration.
    pub fn from_config(config: &GatewayConfig, transport: T, key_store: S) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_key_store(
            config.identity.clone(),
            config.secret_key()?,
            transport,
            key_store,
        ))
    }

    /// The sending gateway identity.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn encryption_helper(&self) -> &EncryptionHelper {
        &self.helper
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn key_store(&self) -> &S {
        &self.key_store
    }

    /// Resolves the public key of `recipient`.
    ///
    /// A cached key is used when present. Otherwise the gateway is asked
    /// and the answer cached. Key store failures are logged and do not
    /// fail the lookup.
    pub async fn lookup_public_key(&self, recipient: &Identity) -> Result<PublicKey> {
        match self.key_store.fetch(recipient) {
            Ok(Some(key)) => return Ok(key),
            Ok(None) => {}
            Err(e) => tracing::warn!(%e, %recipient, "public key cache read failed"),
        }

        let key = self.transport.lookup_public_key(recipient).await?;
        if let Err(e) = self.key_store.save(recipient, key) {
            tracing::warn!(%e, %recipient, "failed to cache public key");
        }
        Ok(key)
    }

    /// Encrypts and sends `message`, returning the gateway message id.
    pub async fn send_message(&self, recipient: &Identity, message: &Message) -> Result<String> {
        let public_key = self.lookup_public_key(recipient).await?;
        let encrypted = self.helper.encrypt_message(message, &public_key)?;
        let message_id = self.transport.send_e2e(recipient, &encrypted).await?;

        tracing::debug!(
            %recipient,
            message_type = message.type_byte(),
            %message_id,
            "sent message"
        );
        Ok(message_id)
    }

    /// Sends a text message.
    pub async fn send_text(&self, recipient: &Identity, text: &str) -> Result<String> {
        self.send_message(recipient, &Message::text(text)).await
    }

    /// Boxes `image` for `recipient`, uploads it and sends the image
    /// message that references it.
    pub async fn send_image(&self, recipient: &Identity, image: &[u8]) -> Result<String> {
        let public_key = self.lookup_public_key(recipient).await?;
        let size = blob_size(image)?;
        let encrypted = self.helper.encrypt_bytes(image, &public_key)?;
        let blob_id = self.transport.upload_blob(encrypted.boxed).await?;

        let reference = BlobReference::new(blob_id, size, encrypted.nonce);
        self.send_message(recipient, &reference.to_image_message()).await
    }

    /// Uploads a sealed blob and returns its reference.
    pub async fn upload_file(&self, sealed: SealedBlob) -> Result<BlobReference> {
        let SealedBlob {
            slot,
            ciphertext,
            plaintext_len,
        } = sealed;
        let blob_id = self.transport.upload_blob(ciphertext).await?;
        tracing::debug!(%blob_id, ?slot, "uploaded blob");
        Ok(BlobReference::new(blob_id, plaintext_len, slot.nonce()))
    }

    /// Seals and uploads `file` (and its thumbnail) under a fresh shared
    /// key, returning the file message without description.
    pub async fn prepare_file(&self, file: &impl FileSource) -> Result<FileMessage> {
        let mut sealer = BlobSealer::new()?;

        let content = file.read()?;
        let file_ref = self.upload_file(sealer.seal_file(&content)?).await?;

        let thumbnail_blob_id = match file.read_thumbnail()? {
            Some(thumbnail) => {
                let thumb_ref = self.upload_file(sealer.seal_thumbnail(&thumbnail)?).await?;
                Some(*thumb_ref.blob_id())
            }
            None => None,
        };

        Ok(FileMessage {
            file_blob_id: *file_ref.blob_id(),
            thumbnail_blob_id,
            shared_key: sealer.shared_key().clone(),
            mime_type: file.mime_type().unwrap_or_else(|| DEFAULT_MIME_TYPE.to_owned()),
            file_name: file.name(),
            size: file_ref.size(),
            description: String::new(),
        })
    }

    /// Uploads `file` and sends the file message to `recipient`.
    ///
    /// The recipient key is looked up before anything is uploaded, so an
    /// unknown recipient costs no blob upload.
    pub async fn send_file(
        &self,
        recipient: &Identity,
        file: &impl FileSource,
        description: &str,
    ) -> Result<String> {
        self.lookup_public_key(recipient).await?;
        let mut message = self.prepare_file(file).await?;
        message.description = description.to_owned();
        self.send_message(recipient, &Message::File(message)).await
    }
}

fn blob_size(data: &[u8]) -> Result<u32> {
    u32::try_from(data.len()).map_err(|_| GatewayError::MalformedInput {
        reason: format!("blob of {} bytes exceeds 32-bit size", data.len()),
    })
}
