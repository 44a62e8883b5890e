//! Shared utilities for the Matcha client crates.
//!
//! Holds the concerns every binary and crate in the workspace needs:
//! logging setup, a clock abstraction, and the client-side key/value
//! storage used for feature-guide tracking.

pub mod guides;
pub mod logger;
pub mod storage;
pub mod time;
