//! Error types for extractbench-providers

use extractbench_core::CollaboratorError;
use thiserror::Error;

/// Errors raised by the reference collaborators
#[derive(Error, Debug)]
pub enum ProviderError {
    /// AI id without a `<provider>:<model>` shape
    #[error("invalid ai id `{0}`: expected <provider>:<model>")]
    InvalidAiId(String),

    /// Required environment variable is unset
    #[error("environment variable {0} is not set")]
    MissingEnv(String),

    /// Extraction strategy not known to this crate
    #[error("unsupported extractor `{0}`")]
    UnsupportedExtractor(String),

    /// Candidate option with the wrong shape
    #[error("invalid option `{key}`: {reason}")]
    InvalidOption { key: String, reason: String },

    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// Non-success status
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// Response that could not be interpreted
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Unparseable URL
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ProviderError::Status {
                status: status.as_u16(),
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            },
            None => ProviderError::Http(err.to_string()),
        }
    }
}

impl From<ProviderError> for CollaboratorError {
    fn from(err: ProviderError) -> Self {
        CollaboratorError::Provider(err.to_string())
    }
}

/// Result type for provider operations
pub type Result<T> = std::result::Result<T, ProviderError>;
