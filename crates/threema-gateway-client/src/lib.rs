//! Encrypted sending for the Threema Gateway end-to-end mode.
//!
//! [`client::EncryptedClient`] looks up recipient keys, packs and seals
//! messages, uploads blobs and submits the result through a
//! [`transport::Transport`]. The HTTP API client itself is supplied by
//! the caller; this crate performs no network I/O.
//!
//! # Modules
//!
//! - [`client`] - `EncryptedClient` send operations
//! - [`transport`] - `Transport` trait for the gateway HTTP API
//! - [`keystore`] - `PublicKeyStore` trait, `NoKeyStore`, `InMemoryKeyStore`
//! - [`file`] - `FileSource` trait, `FilePath`, `FileBytes`

pub mod client;
pub mod file;
pub mod keystore;
pub mod transport;
