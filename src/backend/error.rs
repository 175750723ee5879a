//! Failures of a query call.

use reqwest::StatusCode;
use thiserror::Error;

/// Why a query produced no answer.
///
/// The `Display` text is what the user sees after the `Error: ` prefix.
#[derive(Error, Debug)]
pub enum QueryError {
    /// The request never completed (connection refused, reset, DNS, ...).
    #[error("{0}")]
    Network(#[source] reqwest::Error),

    /// The backend answered with a non-success status. The body is ignored.
    #[error("Failed to fetch response from the server")]
    BadStatus {
        /// Status returned by the backend.
        status: StatusCode,
    },

    /// The success body was not valid JSON of the expected shape.
    #[error("{0}")]
    Decode(#[source] serde_json::Error),
}

impl QueryError {
    /// Short tag for structured logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::BadStatus { .. } => "bad_status",
            Self::Decode(_) => "decode",
        }
    }
}
