//! Error taxonomy for a run.
//!
//! The retry controller classifies errors by variant: validation failures
//! abort immediately with their own exit code, everything else is considered
//! transient and retried on a fresh session.

use std::path::PathBuf;
use thiserror::Error;

/// Exit code for locally detected misuse (unsupported identifier kind,
/// empty identifier list).
pub const EXIT_VALIDATION: u8 = 3;

/// Exit code when every retry attempt has failed.
pub const EXIT_RETRIES_EXHAUSTED: u8 = 4;

#[derive(Debug, Error)]
pub enum RunError {
    /// DNS/TCP/TLS failure, send failure, or a dropped response body.
    #[error("cannot reach service at {endpoint}")]
    Connectivity {
        endpoint: String,
        #[source]
        source: Box<ureq::Error>,
    },

    /// The service answered with a SOAP fault or a non-success status.
    #[error("service fault during {operation}: {message}")]
    ServiceFault {
        operation: &'static str,
        message: String,
    },

    /// The response arrived but did not have the expected shape.
    #[error("malformed {operation} response: {detail}")]
    MalformedResponse {
        operation: &'static str,
        detail: String,
    },

    /// The configured identifier kind is not in the service vocabulary.
    #[error("identifier kind {kind:?} is not supported by the service (supported: {})", supported.join(", "))]
    UnsupportedIdentifierKind {
        kind: String,
        supported: Vec<String>,
    },

    #[error("failed to write report {}", path.display())]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Terminal wrapper produced by the retry controller; `last` is the
    /// error from the final attempt.
    #[error("gave up after {attempts} attempts")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<RunError>,
    },
}

impl RunError {
    /// Validation errors are local misuse; retrying cannot fix them.
    pub fn is_validation(&self) -> bool {
        matches!(self, RunError::UnsupportedIdentifierKind { .. })
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            RunError::UnsupportedIdentifierKind { .. } => EXIT_VALIDATION,
            RunError::RetriesExhausted { .. } => EXIT_RETRIES_EXHAUSTED,
            _ => 1,
        }
    }
}
