//! Fork-risk engine library surface.
//!
//! A run walks the oracle's on-chain state once and emits a single JSON artifact
//! (`src/main.rs`). `src/bin/probe_rpc.rs` is an operator aid for picking an endpoint.

pub mod contracts;
pub mod disputes;
pub mod engine;
pub mod error;
pub mod report;
pub mod risk;
pub mod runtime;
pub mod scanner;
pub mod storage;
pub mod utils;

pub mod config {
    pub mod chains;
}
