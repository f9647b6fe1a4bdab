use std::fmt;
use thiserror::Error;

use crate::util::UrlValidationError;

/// Closed classification of gateway failures.
///
/// This is what the feed controller stores in `FeedStatus::Failed`; callers
/// match on it instead of poking at HTTP status codes themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Provider signalled too many requests.
    RateLimited,
    /// Provider signalled that the plan or daily quota is used up.
    QuotaExceeded,
    /// No response at all (DNS, connect, TLS, reset, timeout).
    Network,
    /// Any other non-2xx status.
    Api(u16),
    /// 2xx response that could not be decoded or was too large.
    InvalidResponse,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::RateLimited => write!(f, "Too many requests, try again in a moment"),
            ErrorKind::QuotaExceeded => write!(f, "News provider quota exceeded"),
            ErrorKind::Network => write!(f, "Network error, check your connection"),
            ErrorKind::Api(status) => write!(f, "News provider error (HTTP {status})"),
            ErrorKind::InvalidResponse => write!(f, "News provider sent an unreadable response"),
        }
    }
}

/// Errors from a single gateway request.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Rate limited by provider")]
    RateLimited,
    #[error("Provider quota exceeded: {0}")]
    QuotaExceeded(String),
    #[error("HTTP error: status {status}")]
    Api {
        status: u16,
        message: Option<String>,
    },
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Invalid response: {0}")]
    Decode(String),
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::Network(_) => ErrorKind::Network,
            GatewayError::RateLimited => ErrorKind::RateLimited,
            GatewayError::QuotaExceeded(_) => ErrorKind::QuotaExceeded,
            GatewayError::Api { status, .. } => ErrorKind::Api(*status),
            GatewayError::ResponseTooLarge(_) | GatewayError::Decode(_) => {
                ErrorKind::InvalidResponse
            }
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        // Strip the URL: for some providers it carries the API key as a query parameter.
        GatewayError::Network(err.without_url().to_string())
    }
}

/// Errors constructing a gateway.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Invalid provider base URL: {0}")]
    BaseUrl(#[from] UrlValidationError),
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
