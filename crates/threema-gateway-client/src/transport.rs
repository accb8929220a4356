//! Seam to the gateway HTTP API.

use std::future::Future;

use threema_gateway_types::{BlobId, EncryptedMessage, Identity, PublicKey, Result};

/// Gateway operations the client needs from the HTTP layer.
///
/// Implementations report failures as
/// [`threema_gateway_types::GatewayError::TransportError`]. Retries and
/// rate limiting are their business, not the client's.
pub trait Transport: Send + Sync {
    /// Submits an end-to-end encrypted message and returns the message id
    /// assigned by the gateway.
    fn send_e2e(
        &self,
        recipient: &Identity,
        message: &EncryptedMessage,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Uploads a ciphertext blob.
    fn upload_blob(&self, data: Vec<u8>) -> impl Future<Output = Result<BlobId>> + Send;

    /// Fetches the public key registered for `identity`.
    fn lookup_public_key(
        &self,
        identity: &Identity,
    ) -> impl Future<Output = Result<PublicKey>> + Send;
}
