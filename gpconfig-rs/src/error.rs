/* Error type shared by every capability of the configuration client. */

use thiserror::Error;

/* Result alias used throughout the crate. */
pub type ApiResult<T> = Result<T, ApiError>;

/* A fault raised while talking to the controller.
 *
 * `Unreachable` and `Rejected` are kept apart so callers can tell a missing
 * device from a device that refused the request. */
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("cannot load configuration {path}: {message}")]
    Config { path: String, message: String },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("cannot build HTTP client: {0}")]
    ClientBuild(String),

    #[error("controller unreachable at {url}: {message}")]
    Unreachable { url: String, message: String },

    #[error("{path} rejected the request with HTTP {status}")]
    Rejected {
        path: String,
        status: u16,
        body: String,
    },

    #[error("malformed response from {path}: {message}")]
    MalformedBody { path: String, message: String },

    #[error("cannot encode request body for {path}: {message}")]
    Encode { path: String, message: String },
}

impl ApiError {
    /* True when the controller answered but refused the request. */
    pub fn is_rejection(&self) -> bool {
        matches!(self, ApiError::Rejected { .. })
    }

    /* True when no answer came back at all. */
    pub fn is_unreachable(&self) -> bool {
        matches!(self, ApiError::Unreachable { .. })
    }

    pub(crate) fn malformed(path: &str, err: impl std::fmt::Display) -> Self {
        ApiError::MalformedBody {
            path: path.to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn encode(path: &str, err: impl std::fmt::Display) -> Self {
        ApiError::Encode {
            path: path.to_string(),
            message: err.to_string(),
        }
    }
}
