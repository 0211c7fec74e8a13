//! Utility functions and helpers for flightcache.
//!
//! This module provides cross-cutting concerns like structured logging,
//! credential redaction, and retry logic with backoff.
//!
//! # Submodules
//!
//! - `logging`: Tracing initialization and URL redaction.
//! - `retry`: Bounded retries for store connection attempts.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod logging;
pub mod retry;
