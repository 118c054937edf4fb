//! REST API client module for the academy backend.
//!
//! This module provides the `ApiClient` for fetching directory snapshots
//! (the candidate recipients an audience is resolved against) and for
//! submitting announcements and SMS messages with their `target_audience`.
//!
//! Requests authenticate with a bearer token supplied by configuration.

pub mod client;
pub mod error;

pub use client::{ApiClient, MessageReceipt};
pub use error::ApiError;
