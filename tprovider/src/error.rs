//! Gateway error kinds, plus the HTTP status mapping every gateway shares.
//!
//! ```rust
//! use tprovider::{ProviderError, ProviderErrorKind};
//!
//! let throttled = ProviderError::from_http_status(429, "slow down");
//! assert_eq!(throttled.kind, ProviderErrorKind::RateLimited);
//! assert!(throttled.retryable);
//! assert_eq!(throttled.http_status, Some(429));
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    Authentication,
    RateLimited,
    InvalidRequest,
    Timeout,
    Transport,
    Unavailable,
    /// The gateway answered but produced no usable choice.
    EmptyResponse,
    Other,
}

impl ProviderErrorKind {
    /// Kind for a non-success HTTP status returned by the upstream service.
    pub fn for_http_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Authentication,
            429 => Self::RateLimited,
            408 | 504 => Self::Timeout,
            400 | 422 => Self::InvalidRequest,
            502 | 503 => Self::Unavailable,
            _ => Self::Transport,
        }
    }

    pub fn default_retryable(self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::Timeout | Self::Transport | Self::Unavailable
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    pub retryable: bool,
    pub http_status: Option<u16>,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
            http_status: None,
        }
    }

    fn of_kind(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self::new(kind, message, kind.default_retryable())
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::of_kind(ProviderErrorKind::Authentication, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::of_kind(ProviderErrorKind::RateLimited, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::of_kind(ProviderErrorKind::InvalidRequest, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::of_kind(ProviderErrorKind::Timeout, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::of_kind(ProviderErrorKind::Transport, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::of_kind(ProviderErrorKind::Unavailable, message)
    }

    pub fn empty_response(message: impl Into<String>) -> Self {
        Self::of_kind(ProviderErrorKind::EmptyResponse, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::of_kind(ProviderErrorKind::Other, message)
    }

    pub fn from_http_status(status: u16, message: impl Into<String>) -> Self {
        Self::of_kind(ProviderErrorKind::for_http_status(status), message).with_http_status(status)
    }

    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.http_status {
            Some(status) => write!(f, "{:?} (HTTP {status}): {}", self.kind, self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl Error for ProviderError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helper_builders_assign_expected_retryability() {
        let auth = ProviderError::authentication("bad key");
        assert!(!auth.retryable);
        assert_eq!(auth.kind, ProviderErrorKind::Authentication);
        assert_eq!(auth.http_status, None);

        assert!(ProviderError::rate_limited("try later").retryable);
        assert!(ProviderError::timeout("slow").retryable);
        assert!(!ProviderError::other("odd").retryable);

        let empty = ProviderError::empty_response("no choices");
        assert!(!empty.retryable);
        assert_eq!(empty.kind, ProviderErrorKind::EmptyResponse);
    }

    #[test]
    fn http_statuses_map_onto_kinds() {
        let cases = [
            (401, ProviderErrorKind::Authentication, false),
            (403, ProviderErrorKind::Authentication, false),
            (429, ProviderErrorKind::RateLimited, true),
            (408, ProviderErrorKind::Timeout, true),
            (504, ProviderErrorKind::Timeout, true),
            (400, ProviderErrorKind::InvalidRequest, false),
            (422, ProviderErrorKind::InvalidRequest, false),
            (502, ProviderErrorKind::Unavailable, true),
            (503, ProviderErrorKind::Unavailable, true),
            (500, ProviderErrorKind::Transport, true),
            (404, ProviderErrorKind::Transport, true),
        ];

        for (status, kind, retryable) in cases {
            let error = ProviderError::from_http_status(status, "upstream said no");
            assert_eq!(error.kind, kind, "status {status}");
            assert_eq!(error.retryable, retryable, "status {status}");
            assert_eq!(error.http_status, Some(status));
        }
    }

    #[test]
    fn display_includes_kind_status_and_message() {
        let error = ProviderError::unavailable("upstream down");
        assert_eq!(error.to_string(), "Unavailable: upstream down");

        let error = ProviderError::from_http_status(503, "upstream down");
        assert_eq!(error.to_string(), "Unavailable (HTTP 503): upstream down");
    }
}
