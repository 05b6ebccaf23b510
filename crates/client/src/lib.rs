//! Blocking TCP client for the clamd malware-scanning daemon.
//!
//! The daemon speaks a small line/binary protocol: NUL-terminated commands,
//! length-prefixed upload chunks (INSTREAM), and one-line text replies.
//! [`ClamClient`] opens a fresh connection per operation and hands replies
//! to [`clamber_core::ScanResult`] for classification.

pub mod client;
pub mod protocol;
pub mod transport;

pub use client::ClamClient;
pub use transport::Session;
