//! Error types for the bus model, trace sinks and transactor.
//!
//! [`SimError`] covers session and trace failures. [`AxiError`] is what a
//! master-side transaction reports when the slave never answers or answers
//! with an error response.

use std::io;

/// Errors raised while attaching, writing or finalizing a trace.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// An I/O error occurred while opening or writing the trace destination.
    #[error("trace I/O error: {0}")]
    TraceIo(#[from] io::Error),

    /// A trace entry could not be encoded.
    #[error("trace encoding error: {reason}")]
    TraceEncode {
        /// Description of the encoding failure.
        reason: String,
    },

    /// The trace destination cannot be handed to the model.
    #[error("invalid trace path: {reason}")]
    InvalidTracePath {
        /// Why the path was rejected.
        reason: String,
    },
}

impl From<serde_json::Error> for SimError {
    fn from(e: serde_json::Error) -> Self {
        SimError::TraceEncode {
            reason: e.to_string(),
        }
    }
}

/// Failure of a single AXI4-Lite transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AxiError {
    /// The handshake did not complete within the cycle budget.
    #[error("transaction timed out after {cycles} cycles")]
    Timeout {
        /// The cycle budget that was exhausted.
        cycles: u32,
    },

    /// The slave answered with SLVERR.
    #[error("slave error response")]
    SlvErr,

    /// The slave answered with DECERR.
    #[error("decode error response")]
    DecErr,
}
