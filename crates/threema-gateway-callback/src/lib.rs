//! Inbound callback handling for the Threema Gateway.
//!
//! The gateway delivers incoming messages as form-encoded webhook
//! requests signed with HMAC-SHA256 under the API secret. This crate
//! turns the decoded form pairs into an authenticated
//! [`raw::CallbackMessage`] and hands it to a bounded queue. It does not
//! run an HTTP server; the caller feeds it the form fields.
//!
//! # Modules
//!
//! - [`raw`] - form field extraction and post-MAC decoding
//! - [`verify`] - callback MAC computation and `MacPolicy`
//! - [`queue`] - bounded non-blocking inbound queue
//! - [`handler`] - parse, verify and enqueue in one call

pub mod handler;
pub mod queue;
pub mod raw;
pub mod verify;
