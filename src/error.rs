//! Unified error types for Arbor.
//!
//! Pipeline refusals (lock required, vetoes, denied external access) are not
//! errors: they are ordinary outcomes rendered to response strings, and every
//! one of them is recoverable by issuing a new command. The error type here
//! covers the faults that are not part of normal command flow, above all the
//! construction-time policy integrity check, which must stop the core from
//! being built at all.

use std::io;
use thiserror::Error;

/// The main error type for Arbor operations.
#[derive(Error, Debug)]
pub enum ArborError {
    /// The policy table signature did not match its recorded value.
    #[error("policy integrity fault: recorded signature {recorded}, recomputed {recomputed}")]
    Integrity { recorded: String, recomputed: String },

    /// A policy table failed structural validation.
    #[error("policy error: {message}")]
    Policy { message: String },

    /// I/O errors from the REPL input loop.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// A specialized Result type for Arbor operations.
pub type Result<T> = std::result::Result<T, ArborError>;

impl ArborError {
    /// Create an integrity error from the two signature values.
    pub fn integrity(recorded: impl Into<String>, recomputed: impl Into<String>) -> Self {
        Self::Integrity {
            recorded: recorded.into(),
            recomputed: recomputed.into(),
        }
    }

    /// Create a policy validation error.
    pub fn policy(message: impl Into<String>) -> Self {
        Self::Policy {
            message: message.into(),
        }
    }
}
