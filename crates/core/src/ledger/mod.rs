//! Deletion ledger.
//!
//! Two artifacts survive a sweep: a plain-text append log that is only ever
//! written, and a JSON record store that is read once at start and rewritten
//! once at the end of a live sweep that deleted something.

mod store;
mod types;

pub use store::*;
pub use types::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Ledger I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}
