//! End-to-end envelope helper.
//!
//! [`EncryptionHelper`] owns the gateway's secret key and combines the
//! payload codec with NaCl box sealing:
//!
//! ```text
//! outbound: Message -> pack -> seal_asymmetric(random nonce) -> EncryptedMessage
//! inbound:  EncryptedMessage -> open_asymmetric -> unpack -> Message
//! ```

use threema_gateway_crypto::public_box::{open_asymmetric, public_key_of, seal_asymmetric};
use threema_gateway_crypto::random::generate_nonce;
use threema_gateway_types::{EncryptedMessage, Nonce, PublicKey, Result, SecretKey};

use crate::codec::{pack, unpack};
use crate::message::Message;

/// Seals and opens messages with the gateway identity's key pair.
#[derive(Debug)]
pub struct EncryptionHelper {
    secret_key: SecretKey,
}

impl EncryptionHelper {
    pub fn new(secret_key: SecretKey) -> Self {
        Self { secret_key }
    }

    /// Builds a helper from a 64-character hex secret key.
    pub fn from_hex(secret_key_hex: &str) -> Result<Self> {
        SecretKey::from_hex(secret_key_hex).map(Self::new)
    }

    /// Public key matching the held secret key.
    pub fn public_key(&self) -> PublicKey {
        public_key_of(&self.secret_key)
    }

    /// Boxes raw bytes for `recipient` under a fresh random nonce.
    pub fn encrypt_bytes(&self, content: &[u8], recipient: &PublicKey) -> Result<EncryptedMessage> {
        let nonce = generate_nonce()?;
        self.encrypt_bytes_with_nonce(content, recipient, nonce)
    }

    /// Boxes raw bytes for `recipient` under a caller-chosen nonce.
    ///
    /// The caller is responsible for never reusing `nonce` with the same
    /// recipient.
    pub fn encrypt_bytes_with_nonce(
        &self,
        content: &[u8],
        recipient: &PublicKey,
        nonce: Nonce,
    ) -> Result<EncryptedMessage> {
        let boxed = seal_asymmetric(content, &nonce, recipient, &self.secret_key)?;
        Ok(EncryptedMessage { nonce, boxed })
    }

    /// Packs `message` and boxes it for `recipient`.
    pub fn encrypt_message(&self, message: &Message, recipient: &PublicKey) -> Result<EncryptedMessage> {
        let payload = pack(message)?;
        let encrypted = self.encrypt_bytes(&payload, recipient)?;
        tracing::debug!(
            message_type = message.type_byte(),
            len = encrypted.boxed.len(),
            "sealed message"
        );
        Ok(encrypted)
    }

    /// Opens a box from `sender`, e.g. a downloaded image blob.
    pub fn decrypt_bytes(&self, encrypted: &EncryptedMessage, sender: &PublicKey) -> Result<Vec<u8>> {
        open_asymmetric(&encrypted.boxed, &encrypted.nonce, sender, &self.secret_key)
    }

    /// Opens a box from `sender` and unpacks the message inside.
    ///
    /// # Errors
    ///
    /// [`threema_gateway_types::GatewayError::AuthenticationFailed`] if the
    /// box does not open, or any [`unpack`] error.
    pub fn decrypt_message(&self, encrypted: &EncryptedMessage, sender: &PublicKey) -> Result<Message> {
        unpack(&self.decrypt_bytes(encrypted, sender)?)
    }
}
