use thiserror::Error;

/// Terminal outcome of a fetch: the full response body, or a classified failure.
pub type FetchResult = Result<String, FetchError>;

/// Classified fetch failure.
///
/// Every error raised during a fetch attempt is caught and converted into one
/// of these variants; nothing escapes to the caller as a panic or an
/// unclassified fault. Only [`FetchError::Trust`] makes the fetcher retry over
/// plain HTTP; all other kinds are terminal.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Transport-level connect error (DNS lookup, TCP connect).
    #[error("Connect failed: {0}")]
    Connect(String),

    /// TLS negotiation failure. The classification is structural (the error
    /// came out of the handshake step) rather than a substring match on the
    /// transport's message wording.
    #[error("TLS negotiation failed: {0}")]
    Trust(String),

    /// The exchange produced no usable response (the legacy "status -1" case).
    #[error("Connection failed: {0}")]
    Protocol(String),

    /// Non-2xx status code.
    #[error("HTTP {0}")]
    Response(u16),

    /// Failure while streaming the response body.
    #[error("Body read failed: {0}")]
    Read(String),
}

impl FetchError {
    /// True for failures that permit the single insecure fallback attempt.
    pub fn allows_fallback(&self) -> bool {
        matches!(self, FetchError::Trust(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_displays_status_code() {
        assert_eq!(FetchError::Response(404).to_string(), "HTTP 404");
        assert_eq!(FetchError::Response(503).to_string(), "HTTP 503");
    }

    #[test]
    fn only_trust_allows_fallback() {
        assert!(FetchError::Trust("handshake failed".into()).allows_fallback());
        assert!(!FetchError::Connect("connection refused".into()).allows_fallback());
        assert!(!FetchError::Response(404).allows_fallback());
        assert!(!FetchError::Protocol("no response".into()).allows_fallback());
        assert!(!FetchError::Read("connection reset".into()).allows_fallback());
    }
}
