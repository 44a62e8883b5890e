//! REST client for the Matcha HR platform.
//!
//! One [`ApiClient`] carries the HTTP plumbing (base URL, bearer token,
//! JSON encoding/decoding); each domain surface hangs its endpoints off
//! it in its own module. Failures are never retried here: every error is
//! returned to the caller, which decides how to surface it.

pub mod brokers;
pub mod client;
pub mod employees;
pub mod error;
pub mod import;
pub mod policies;
pub mod rooms;

pub use client::ApiClient;
pub use error::ApiError;
