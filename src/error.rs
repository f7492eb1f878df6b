//! Error types for the hazard pipeline
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for the hazard pipeline
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Credential variable '{variable}' is not set")]
    MissingCredential { variable: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Rate limited, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Fetch failed after {attempts} attempts, last error: {last}")]
    RetriesExhausted { attempts: u32, last: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Transform Errors
    // ============================================================================
    #[error("Path '{path}' expected {expected}, found {found}")]
    PathType {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    #[error("XML parsing error: {message}")]
    XmlParse { message: String },

    // ============================================================================
    // Cache Store Errors
    // ============================================================================
    #[error("Cache store error: {message}")]
    CacheStore { message: String },

    // ============================================================================
    // I/O and Generic Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Classification of a failed collector run
///
/// Drives both retry decisions (only transient failures are retried) and
/// the `error_kind` field of structured run logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Timeout, connection reset, 5xx, 429: worth retrying
    TransientNetwork,
    /// 4xx other than 429, malformed response body: retrying cannot fix
    PermanentUpstream,
    /// Path navigation type mismatch, required field missing
    Transform,
    /// Cache connection or write failure
    CacheStore,
}

impl FailureKind {
    /// Stable label used in structured log events
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::TransientNetwork => "transient-network",
            FailureKind::PermanentUpstream => "permanent-upstream",
            FailureKind::Transform => "transform",
            FailureKind::CacheStore => "cache-store",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing credential error
    pub fn missing_credential(variable: impl Into<String>) -> Self {
        Self::MissingCredential {
            variable: variable.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a path type mismatch error
    pub fn path_type(path: impl Into<String>, expected: &'static str, found: &'static str) -> Self {
        Self::PathType {
            path: path.into(),
            expected,
            found,
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create an XML parse error
    pub fn xml(message: impl Into<String>) -> Self {
        Self::XmlParse {
            message: message.into(),
        }
    }

    /// Create a cache store error
    pub fn cache(message: impl Into<String>) -> Self {
        Self::CacheStore {
            message: message.into(),
        }
    }

    /// Classify this error into the run-failure taxonomy
    pub fn classification(&self) -> FailureKind {
        match self {
            Error::Http(_)
            | Error::RateLimited { .. }
            | Error::Timeout { .. }
            | Error::RetriesExhausted { .. } => FailureKind::TransientNetwork,
            Error::HttpStatus { status, .. } if is_transient_status(*status) => {
                FailureKind::TransientNetwork
            }
            Error::PathType { .. } => FailureKind::Transform,
            Error::CacheStore { .. } => FailureKind::CacheStore,
            _ => FailureKind::PermanentUpstream,
        }
    }

    /// Check if this error is worth retrying
    pub fn is_transient(&self) -> bool {
        self.classification() == FailureKind::TransientNetwork
    }
}

/// Check if an HTTP status code indicates a transient failure
pub fn is_transient_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Result type alias for the hazard pipeline
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(429, true; "too many requests")]
    #[test_case(500, true; "internal server error")]
    #[test_case(503, true; "service unavailable")]
    #[test_case(400, false; "bad request")]
    #[test_case(404, false; "not found")]
    fn test_transient_status_codes(status: u16, transient: bool) {
        assert_eq!(is_transient_status(status), transient);
    }

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::missing_credential("NOAA_TOKEN");
        assert_eq!(
            err.to_string(),
            "Credential variable 'NOAA_TOKEN' is not set"
        );

        let err = Error::http_status(404, "Not found");
        assert_eq!(err.to_string(), "HTTP 404: Not found");

        let err = Error::path_type("list.stations", "sequence", "string");
        assert_eq!(
            err.to_string(),
            "Path 'list.stations' expected sequence, found string"
        );
    }

    #[test]
    fn test_transient_classification() {
        assert!(Error::RateLimited {
            retry_after_seconds: 60
        }
        .is_transient());
        assert!(Error::Timeout { timeout_ms: 1000 }.is_transient());
        assert!(Error::http_status(429, "").is_transient());
        assert!(Error::http_status(500, "").is_transient());
        assert!(Error::http_status(503, "").is_transient());

        assert!(!Error::http_status(400, "").is_transient());
        assert!(!Error::http_status(401, "").is_transient());
        assert!(!Error::http_status(404, "").is_transient());
        assert!(!Error::config("test").is_transient());
    }

    #[test]
    fn test_four_way_classification() {
        assert_eq!(
            Error::RetriesExhausted {
                attempts: 3,
                last: "timeout".into()
            }
            .classification(),
            FailureKind::TransientNetwork
        );
        assert_eq!(
            Error::http_status(404, "").classification(),
            FailureKind::PermanentUpstream
        );
        assert_eq!(
            Error::decode("not json").classification(),
            FailureKind::PermanentUpstream
        );
        assert_eq!(
            Error::path_type("a.b", "sequence", "number").classification(),
            FailureKind::Transform
        );
        assert_eq!(
            Error::cache("connection refused").classification(),
            FailureKind::CacheStore
        );
    }

    #[test]
    fn test_failure_kind_labels() {
        assert_eq!(FailureKind::TransientNetwork.as_str(), "transient-network");
        assert_eq!(
            FailureKind::PermanentUpstream.as_str(),
            "permanent-upstream"
        );
        assert_eq!(FailureKind::Transform.as_str(), "transform");
        assert_eq!(FailureKind::CacheStore.as_str(), "cache-store");
    }
}
