//! API error classification
//!
//! Every failure is either retryable (transient infrastructure trouble) or
//! permanent (the request itself is bad). Unknown failure modes count as
//! permanent; the retry loop only ever repeats calls known to be transient.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Network-level failure before a status code was received
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status, message extracted from the response body
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Token endpoint answered without an access token
    #[error("token response did not contain an access_token")]
    MissingToken,
}

impl ApiError {
    /// Whether the retry loop may attempt this call again.
    ///
    /// Connection failures, timeouts and 5xx responses (except 501) are
    /// transient. 4xx responses and anything unrecognized are permanent.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport(err) => err.is_connect() || err.is_timeout(),
            ApiError::Http { status, .. } => *status >= 500 && *status != 501,
            ApiError::MissingToken => false,
        }
    }

    /// HTTP status of the failed call, when one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Transport(err) => err.status().map(|s| s.as_u16()),
            ApiError::MissingToken => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16) -> ApiError {
        ApiError::Http {
            status,
            message: "test".to_string(),
        }
    }

    #[test]
    fn test_5xx_is_retryable_except_501() {
        assert!(http(500).is_retryable());
        assert!(http(502).is_retryable());
        assert!(http(503).is_retryable());
        assert!(!http(501).is_retryable());
    }

    #[test]
    fn test_4xx_is_permanent() {
        for status in [400, 401, 403, 404, 409, 422] {
            assert!(!http(status).is_retryable(), "HTTP {} must not retry", status);
        }
    }

    #[test]
    fn test_missing_token_is_permanent() {
        assert!(!ApiError::MissingToken.is_retryable());
    }
}
