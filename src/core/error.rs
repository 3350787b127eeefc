use thiserror::Error;

/// The primary error type for all fallible operations in this crate.
///
/// `ApiError` is `Clone` because a single outcome of a deduplicated request is
/// handed to every caller attached to it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Every attempt exceeded its timeout.
    #[error("request to {url} timed out after {attempts} attempt(s)")]
    Timeout {
        /// The URL that timed out.
        url: String,
        /// Total number of attempts made.
        attempts: u32,
    },

    /// The connection could not be established or broke mid-request.
    #[error("network unavailable for {url} after {attempts} attempt(s): {message}")]
    NetworkUnavailable {
        /// The URL that was being requested.
        url: String,
        /// Transport-level description of the failure.
        message: String,
        /// Total number of attempts made.
        attempts: u32,
    },

    /// The server answered with a 5xx status on every attempt.
    #[error("server error {status} at {url} after {attempts} attempt(s)")]
    Server {
        /// The HTTP status code.
        status: u16,
        /// The URL that returned the error.
        url: String,
        /// Total number of attempts made.
        attempts: u32,
    },

    /// The server rejected the request with a 4xx status. Never retried.
    #[error("client error {status} at {url}")]
    Client {
        /// The HTTP status code.
        status: u16,
        /// The URL that returned the error.
        url: String,
        /// Raw response body, kept for error reporting.
        body: String,
    },

    /// A non-2xx status outside the 4xx/5xx ranges (e.g. an unfollowed redirect).
    #[error("unexpected response status: {status} at {url}")]
    UnexpectedStatus {
        /// The HTTP status code.
        status: u16,
        /// The URL that returned it.
        url: String,
    },

    /// A response declared JSON but its body could not be decoded.
    #[error("failed to parse response from {url}: {message}")]
    Parse {
        /// The URL whose response failed to parse.
        url: String,
        /// Decoder error message.
        message: String,
    },

    /// The caller cancelled its wait for the response.
    #[error("request aborted by caller")]
    Aborted,

    /// The request body could not be serialized to JSON.
    #[error("failed to encode request body: {0}")]
    Encode(String),

    /// An endpoint could not be resolved into a valid URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The client configuration was rejected at construction time.
    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// Whether a failed attempt with this error should be retried.
    ///
    /// Timeouts, connection failures and 5xx responses are transient; every
    /// other failure is terminal on first occurrence.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::Timeout { .. } | ApiError::NetworkUnavailable { .. } | ApiError::Server { .. }
        )
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. }
            | ApiError::Client { status, .. }
            | ApiError::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Number of attempts made before the error surfaced.
    ///
    /// Terminal failures that are never retried report a single attempt;
    /// errors raised before dispatch report zero.
    pub fn attempts(&self) -> u32 {
        match self {
            ApiError::Timeout { attempts, .. }
            | ApiError::NetworkUnavailable { attempts, .. }
            | ApiError::Server { attempts, .. } => *attempts,
            ApiError::Client { .. } | ApiError::UnexpectedStatus { .. } | ApiError::Parse { .. } => 1,
            ApiError::Aborted
            | ApiError::Encode(_)
            | ApiError::InvalidUrl(_)
            | ApiError::Config(_) => 0,
        }
    }

    /// Re-tags a retryable error with the final attempt count.
    pub(crate) fn with_attempts(self, n: u32) -> Self {
        match self {
            ApiError::Timeout { url, .. } => ApiError::Timeout { url, attempts: n },
            ApiError::NetworkUnavailable { url, message, .. } => ApiError::NetworkUnavailable {
                url,
                message,
                attempts: n,
            },
            ApiError::Server { status, url, .. } => ApiError::Server {
                status,
                url,
                attempts: n,
            },
            other => other,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Encode(e.to_string())
    }
}
