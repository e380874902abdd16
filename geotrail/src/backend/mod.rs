//! HTTP backend access.
//!
//! The [`BackendClient`](client::BackendClient) trait abstracts the tracking
//! server's REST surface so the poller can run against a mock in tests. The
//! [`HttpBackendClient`](client::HttpBackendClient) implementation talks to
//! the real server via `reqwest`.

pub mod client;
pub mod error;

pub use client::{BackendClient, HttpBackendClient, SnapshotFetch};
pub use error::BackendError;
