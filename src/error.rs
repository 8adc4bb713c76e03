//! Error taxonomy for the ingestion pipeline.
//!
//! Only [`PipelineError::StoreUnavailable`] aborts a cycle. Everything else is
//! scoped to a single URL or candidate and ends up in the cycle statistics.

use std::time::Duration;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// A single page could not be retrieved.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("request to {url} timed out after {}s", .timeout.as_secs())]
    Timeout { url: String, timeout: Duration },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// A fetched page did not yield a usable article.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionFailure {
    #[error("no paragraph text found")]
    EmptyBody,

    #[error("body too short ({length} < {minimum} chars)")]
    TooShort { length: usize, minimum: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("extraction failed for {url}: {reason}")]
    Extraction {
        url: String,
        reason: ExtractionFailure,
    },

    #[error("intelligence store unavailable: {0}")]
    StoreUnavailable(#[source] sqlx::Error),

    #[error("database error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    /// Whether the error should abort the running cycle.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PipelineError::StoreUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_store_unavailable_is_fatal() {
        let fatal = PipelineError::StoreUnavailable(sqlx::Error::PoolTimedOut);
        assert!(fatal.is_fatal());

        let extraction = PipelineError::Extraction {
            url: "https://example.com/a".to_string(),
            reason: ExtractionFailure::TooShort {
                length: 80,
                minimum: 100,
            },
        };
        assert!(!extraction.is_fatal());
        assert!(!PipelineError::Store(sqlx::Error::RowNotFound).is_fatal());
    }

    #[test]
    fn test_error_messages() {
        let err = FetchError::Timeout {
            url: "https://example.com".to_string(),
            timeout: Duration::from_secs(15),
        };
        assert_eq!(
            err.to_string(),
            "request to https://example.com timed out after 15s"
        );

        let reason = ExtractionFailure::TooShort {
            length: 80,
            minimum: 100,
        };
        assert_eq!(reason.to_string(), "body too short (80 < 100 chars)");
    }
}
