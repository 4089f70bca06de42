//! Provider error types.
//!
//! A failed call is classified by transport symptom; the router treats every
//! kind the same way (count it and fail over), so the classification exists
//! for diagnostics and operator-facing error strings.

/// Error from a provider call.
#[derive(Debug, Clone)]
pub struct ProviderError {
    /// The kind of error
    pub kind: ProviderErrorKind,
    /// HTTP status code, if applicable
    pub status_code: Option<u16>,
    /// Error message
    pub message: String,
}

impl ProviderError {
    /// Create an error from a non-success HTTP status.
    pub fn from_status(status_code: u16, message: String) -> Self {
        Self {
            kind: classify_http_status(status_code),
            status_code: Some(status_code),
            message,
        }
    }

    /// Create a timeout error.
    pub fn timeout(message: String) -> Self {
        Self {
            kind: ProviderErrorKind::Timeout,
            status_code: None,
            message,
        }
    }

    /// Create a network error.
    pub fn network(message: String) -> Self {
        Self {
            kind: ProviderErrorKind::Network,
            status_code: None,
            message,
        }
    }

    /// Create a response-parse error.
    pub fn parse(message: String) -> Self {
        Self {
            kind: ProviderErrorKind::Parse,
            status_code: None,
            message,
        }
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "{} (HTTP {}): {}", self.kind, code, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Classification of provider errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Rate limited (429)
    RateLimited,
    /// Server error (5xx)
    Server,
    /// Client error (other 4xx)
    Client,
    /// Connection-level failure
    Network,
    /// Request exceeded the call timeout
    Timeout,
    /// Response body did not match the expected shape
    Parse,
}

impl std::fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderErrorKind::RateLimited => write!(f, "Rate limited"),
            ProviderErrorKind::Server => write!(f, "Server error"),
            ProviderErrorKind::Client => write!(f, "Client error"),
            ProviderErrorKind::Network => write!(f, "Network error"),
            ProviderErrorKind::Timeout => write!(f, "Timeout"),
            ProviderErrorKind::Parse => write!(f, "Parse error"),
        }
    }
}

/// Parse HTTP status code into error kind.
pub fn classify_http_status(status: u16) -> ProviderErrorKind {
    match status {
        429 => ProviderErrorKind::RateLimited,
        400..=499 => ProviderErrorKind::Client,
        _ => ProviderErrorKind::Server,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_classification() {
        assert_eq!(classify_http_status(429), ProviderErrorKind::RateLimited);
        assert_eq!(classify_http_status(500), ProviderErrorKind::Server);
        assert_eq!(classify_http_status(503), ProviderErrorKind::Server);
        assert_eq!(classify_http_status(400), ProviderErrorKind::Client);
        assert_eq!(classify_http_status(401), ProviderErrorKind::Client);
        assert_eq!(classify_http_status(404), ProviderErrorKind::Client);
    }

    #[test]
    fn test_display_includes_status() {
        let err = ProviderError::from_status(502, "bad gateway".to_string());
        let rendered = err.to_string();
        assert!(rendered.contains("502"));
        assert!(rendered.contains("bad gateway"));
    }

    #[test]
    fn test_timeout_has_no_status() {
        let err = ProviderError::timeout("deadline exceeded".to_string());
        assert_eq!(err.kind, ProviderErrorKind::Timeout);
        assert!(err.status_code.is_none());
    }
}
