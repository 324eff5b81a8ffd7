//! REST client for the sessions and billing endpoints.
//!
//! Fetches records as immutable snapshots and hands them to
//! `sportsync-core` for evaluation. Quota snapshots are re-fetched after
//! every quota-consuming call.

pub mod api;
pub mod config;

pub use api::{ApiError, JoinOutcome, SportsApi};
pub use config::ClientConfig;
