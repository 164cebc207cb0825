//! Readable classification of HTTP error statuses.

use reqwest::StatusCode;

/// An HTTP response that ended the fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpStatusError {
    /// HTTP 404
    NotFound,
    /// HTTP 401
    AuthenticationFailed,
    /// HTTP 403
    Forbidden,
    /// HTTP 429
    RateLimited,
    /// Any other 4xx
    ClientError(u16),
    /// Any 5xx
    ServerError(u16),
}

impl std::fmt::Display for HttpStatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpStatusError::NotFound => write!(f, "Not found (HTTP 404)"),
            HttpStatusError::AuthenticationFailed => {
                write!(f, "Authentication failed (HTTP 401)")
            }
            HttpStatusError::Forbidden => write!(f, "Access forbidden (HTTP 403)"),
            HttpStatusError::RateLimited => {
                write!(f, "Too many requests (HTTP 429). Try again later.")
            }
            HttpStatusError::ClientError(code) => write!(f, "Request error (HTTP {})", code),
            HttpStatusError::ServerError(code) => write!(f, "Server error (HTTP {})", code),
        }
    }
}

impl std::error::Error for HttpStatusError {}

impl HttpStatusError {
    pub fn from_status(status: StatusCode) -> Option<Self> {
        match status {
            StatusCode::NOT_FOUND => Some(HttpStatusError::NotFound),
            StatusCode::UNAUTHORIZED => Some(HttpStatusError::AuthenticationFailed),
            StatusCode::FORBIDDEN => Some(HttpStatusError::Forbidden),
            StatusCode::TOO_MANY_REQUESTS => Some(HttpStatusError::RateLimited),
            s if s.is_client_error() => Some(HttpStatusError::ClientError(s.as_u16())),
            s if s.is_server_error() => Some(HttpStatusError::ServerError(s.as_u16())),
            _ => None,
        }
    }
}

/// Converts an error status into an [`HttpStatusError`].
pub fn check_status(status: StatusCode) -> Result<(), HttpStatusError> {
    match HttpStatusError::from_status(status) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
