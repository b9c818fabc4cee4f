use crate::infra::tls::TrustPolicy;
use std::time::Duration;

/// Connect-phase budget per attempt (DNS, TCP, TLS handshake).
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Read-phase budget per attempt (response headers, body).
pub const READ_TIMEOUT: Duration = Duration::from_secs(20);

/// Client identifier sent with every request.
pub const USER_AGENT: &str = concat!("trmnl-fetch/", env!("CARGO_PKG_VERSION"), " (legacy-eink)");

/// One resilient fetch: a secure target plus an optional plain-HTTP fallback
/// used only after a trust failure on the secure attempt.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub secure_url: String,
    pub insecure_url: Option<String>,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub trust_policy: TrustPolicy,
}

impl FetchRequest {
    /// GET request with the legacy-device defaults: 15s connect / 20s read,
    /// no fallback URL, and [`TrustPolicy::AcceptAll`].
    ///
    /// Note the trust default: accept-all performs **no certificate
    /// validation**. It is the right default only for the legacy devices
    /// this crate targets, whose bundled root stores cannot anchor current
    /// chains. Hosts that can validate certificates must opt back into
    /// [`TrustPolicy::Strict`] via
    /// [`with_trust_policy`](Self::with_trust_policy).
    pub fn get(secure_url: impl Into<String>) -> Self {
        Self {
            secure_url: secure_url.into(),
            insecure_url: None,
            connect_timeout: CONNECT_TIMEOUT,
            read_timeout: READ_TIMEOUT,
            trust_policy: TrustPolicy::AcceptAll,
        }
    }

    pub fn with_insecure_fallback(mut self, url: Option<String>) -> Self {
        self.insecure_url = url;
        self
    }

    pub fn with_trust_policy(mut self, policy: TrustPolicy) -> Self {
        self.trust_policy = policy;
        self
    }

    pub fn with_timeouts(mut self, connect: Duration, read: Duration) -> Self {
        self.connect_timeout = connect;
        self.read_timeout = read;
        self
    }
}
