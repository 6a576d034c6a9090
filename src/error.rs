//! Error types
//!
//! Nothing in the core is fatal. Each of these is returned to the caller (or
//! carried inside an outcome) and the session keeps running.

use thiserror::Error;

use crate::session::{SessionAction, SessionPhase};

/// Local profile storage failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// No storage backend is reachable (private browsing, quota, missing dir)
    #[error("local storage unavailable: {0}")]
    Unavailable(String),

    /// The stored record could not be encoded or decoded
    #[error("corrupt profile record for {key}: {reason}")]
    Corrupt {
        /// Storage key of the bad record.
        key: String,
        /// Decoder message.
        reason: String,
    },

    /// A write was attempted and rejected
    #[error("write rejected for {key}: {reason}")]
    WriteFailed {
        /// Storage key being written.
        key: String,
        /// Backend message.
        reason: String,
    },
}

/// Remote ledger failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// No ledger endpoint is configured, or the backend cannot be reached
    #[error("ledger unavailable")]
    Unavailable,

    /// The request needs an identity and none is connected
    #[error("no identity connected")]
    NoIdentity,

    /// The ledger refused the call
    #[error("ledger rejected request: {0}")]
    Rejected(String),

    /// The request was not resolved before its deadline
    #[error("ledger request {id} timed out after {after_ms} ms")]
    Timeout {
        /// Request id.
        id: u64,
        /// Time waited before giving up.
        after_ms: u64,
    },
}

/// Refused session transitions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Start/retry with an empty energy bar
    #[error("no energy left, next refill in {refill_in_ms} ms")]
    NoEnergy {
        /// Time until the bar refills.
        refill_in_ms: u64,
    },

    /// The action has no edge out of the current phase
    #[error("cannot {action:?} while {phase:?}")]
    InvalidTransition {
        /// Phase the session was in.
        phase: SessionPhase,
        /// Action that was refused.
        action: SessionAction,
    },
}

/// Settings loading failures
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Settings file could not be read
    #[error("cannot read settings from {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Settings document is malformed
    #[error("invalid settings: {0}")]
    Parse(#[from] serde_json::Error),

    /// Settings parse but violate a simulation invariant
    #[error("invalid tuning: {0}")]
    Tuning(String),
}
