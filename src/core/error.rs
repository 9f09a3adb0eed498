//! Error types for quote fetching and report generation

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Failure to obtain a quote for one identifier.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (connect, timeout, body read).
    #[error("network error for {identifier}: {source}")]
    Network {
        identifier: String,
        #[source]
        source: reqwest::Error,
    },

    /// Upstream answered with a non-2xx status.
    #[error("upstream returned {status} for {identifier}")]
    Status {
        identifier: String,
        status: reqwest::StatusCode,
    },

    /// Response body is not the expected JSON envelope.
    #[error("failed to decode quote for {identifier}: {message}")]
    Decode { identifier: String, message: String },

    /// The fetch was aborted before it reported back.
    #[error("fetch for {identifier} was cancelled")]
    Cancelled { identifier: String },

    /// The worker fetching this identifier panicked.
    #[error("fetch for {identifier} panicked")]
    Panicked { identifier: String },
}

impl FetchError {
    pub fn identifier(&self) -> &str {
        match self {
            FetchError::Network { identifier, .. }
            | FetchError::Status { identifier, .. }
            | FetchError::Decode { identifier, .. }
            | FetchError::Cancelled { identifier }
            | FetchError::Panicked { identifier } => identifier,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled { .. })
    }
}

/// A per-identifier failure as carried inside a partial report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchFailure {
    #[serde(rename = "Id")]
    pub identifier: String,
    #[serde(rename = "Error")]
    pub message: String,
}

impl From<&FetchError> for FetchFailure {
    fn from(err: &FetchError) -> Self {
        FetchFailure {
            identifier: err.identifier().to_string(),
            message: err.to_string(),
        }
    }
}

/// Failure to produce a report for a whole run.
#[derive(Debug, Error)]
pub enum ReportError {
    /// No instruments were requested.
    #[error("no instruments requested")]
    NoInstruments,

    /// The summed weight is zero or not finite.
    #[error("total weight is zero or not finite, weighted average is undefined")]
    DivisionByZero,

    /// A fetch failed and the run was configured to fail fast.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Every fetch failed.
    #[error("no quote could be fetched ({} failures)", .failures.len())]
    NoData { failures: Vec<FetchFailure> },

    /// The run deadline expired before all fetches resolved.
    #[error("quote collection timed out after {timeout:?}")]
    Timeout { timeout: Duration },
}
