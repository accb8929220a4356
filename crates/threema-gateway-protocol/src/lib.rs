//! Message protocol for the Threema Gateway end-to-end mode.
//!
//! Defines the typed message model, the padded binary payload format
//! exchanged inside NaCl boxes, references to uploaded blobs, and a
//! small helper that joins packing with sealing.
//!
//! # Modules
//!
//! - [`message`] - `Message` enum, wire type tags, receipt kinds, quoting
//! - [`file`] - JSON body of file messages
//! - [`codec`] - `pack` / `unpack` of padded payloads
//! - [`blob`] - `BlobReference` and the two-slot `BlobSealer`
//! - [`e2e`] - `EncryptionHelper` (pack + box, open + unpack)

pub mod blob;
pub mod codec;
pub mod e2e;
pub mod file;
pub mod message;
