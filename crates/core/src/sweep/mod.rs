//! Multi-server deletion sweep.
//!
//! One `ServerWorker` per configured server runs concurrently and returns a
//! `ServerOutcome` without touching shared state. The `Aggregator` merges the
//! outcomes in completion order under a single lock around the ledger and the
//! console. The `Orchestrator` does the fail-fast loading around it.

mod aggregator;
mod console;
mod orchestrator;
mod types;
mod worker;

pub use aggregator::Aggregator;
pub use console::Console;
pub use orchestrator::{Orchestrator, SweepError};
pub use types::*;
pub use worker::ServerWorker;
