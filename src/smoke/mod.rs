//! Live smoke test of the hosted API.
//!
//! Requests go out one at a time with a flat timeout and a fixed delay
//! between them. A failed or timed-out request is recorded and the batch
//! moves on; there are no retries.

pub mod catalog;
pub mod client;
pub mod runner;

pub use catalog::{default_targets, targets_from_paths, ProbeTarget};
pub use client::{HttpProbe, ProbeResponse, UreqProbe};
pub use runner::{ProbeOutcome, ProbeResult, SmokeReport, SmokeRunner, SmokeSummary};
