//! Resilient API fetch client for TRMNL e-ink devices with legacy TLS stacks.
//!
//! Two pieces carry the weight here:
//!
//! - [`prefs`]: canonicalizes a user-supplied API base URL into one
//!   authoritative form (self-healing the stored preference on read) and
//!   resolves credential presence.
//! - [`fetch`]: a two-attempt fetch that tries HTTPS with a configurable
//!   [`TrustPolicy`] and falls back to plain HTTP exactly once when the
//!   secure attempt dies during TLS negotiation.
//!
//! The accept-all trust policy exists because these devices ship root stores
//! too old to anchor current certificate chains. It is opt-in, named, and
//! bounded to this compatibility case.

pub mod config;
pub mod error;
pub mod fetch;
pub mod infra;
pub mod prefs;

pub use config::Config;
pub use error::{FetchError, FetchResult};
pub use fetch::{FetchRequest, FetchService, FetchSubscription, ResilientFetcher};
pub use infra::tls::TrustPolicy;
pub use prefs::{
    has_credentials, insecure_variant, normalize_base_url, ApiPrefs, JsonFileStore, MemoryStore,
    PrefsStore, DEFAULT_BASE_URL,
};
