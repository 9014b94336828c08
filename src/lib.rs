//! # kvprobe
//!
//! A command-conformance harness for Redis-compatible servers.
//!
//! kvprobe connects to a running server, exercises string, hash, list, set,
//! sorted-set, key, transaction, pub/sub and scripting commands, records a
//! pass/fail result per check, and writes a JSON run report plus a
//! per-command coverage cross-reference.

pub mod backend;
pub mod config;
pub mod error;
pub mod harness;
pub mod pattern;
pub mod recorder;
pub mod registry;
pub mod report;
pub mod suite;

use backend::RedisConnector;
use config::Config;
use error::ProbeResult;
use harness::{Harness, RunOutcome};

/// Connect to the server described by `config` and run every suite.
pub async fn run(config: Config) -> ProbeResult<RunOutcome> {
    let mut harness = Harness::connect(&RedisConnector, config).await?;
    harness.run().await
}
