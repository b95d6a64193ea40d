//! Domain core for the media generation service.
//!
//! Pure logic only: job records and their lifecycle state machine, request
//! validation, the provider parameter transform and the retry backoff
//! policy. Lives in `core` to keep zero internal dependencies and no I/O.

pub mod error;
pub mod job;
pub mod lifecycle;
pub mod params;
pub mod retry;
pub mod types;
