//! A thin, failover-agnostic HTTP client for a single beacon node.
//!
//! This crate models the external contract the proposal pipeline and
//! registration scheduler depend on: versioned proposal retrieval/submission,
//! proposer duties, and validator registration/preparation submission.
//! Multi-endpoint failover is layered on top by `beacon_node_fallback`; this
//! crate only ever talks to one node.

mod client;
mod error;
pub mod types;

pub use client::{BeaconNodeClient, BeaconNodeHttpClient};
pub use error::Error;
