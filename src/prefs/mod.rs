//! Device preferences: credentials, custom base URL, gift-mode text.
//!
//! [`ApiPrefs`] wraps a [`PrefsStore`] with the typed accessors the device
//! app works with. The base URL is canonicalized on every read; when the
//! stored value is malformed, the corrected form is written back so the
//! stored preference self-heals on next access.

pub mod store;

pub use store::{JsonFileStore, MemoryStore, PrefsStore, StoreError};

use url::Url;

/// Compiled-in API root used when no base URL preference is set.
pub const DEFAULT_BASE_URL: &str = "https://usetrmnl.com/api";

const KEY_API_ID: &str = "api_id";
const KEY_API_TOKEN: &str = "api_token";
const KEY_API_BASE_URL: &str = "api_base_url";
const KEY_DEVICE_CODE: &str = "friendly_device_code";
const KEY_GIFT_FROM: &str = "gift_from_name";
const KEY_GIFT_TO: &str = "gift_to_name";
const KEY_GIFT_WEB_SETUP: &str = "gift_web_setup";

/// Canonicalizes a base-URL string.
///
/// Rules, in load-bearing order:
/// 1. trim; an empty result returns `default` verbatim;
/// 2. strip every trailing `/`;
/// 3. collapse a doubled `/api/api` suffix down to one `/api`;
/// 4. append `/api` when it is not already the suffix.
///
/// The result never ends with a slash and always ends with exactly one
/// `/api`. Idempotent.
pub fn normalize_base_url(raw: &str, default: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return default.to_string();
    }

    let mut url = trimmed.trim_end_matches('/').to_string();
    while url.ends_with("/api/api") {
        url.truncate(url.len() - 4);
    }
    if !url.ends_with("/api") {
        url.push_str("/api");
    }
    url
}

/// True iff both credential halves are present and non-blank after trimming.
/// A partial pair counts the same as a fully absent one.
pub fn has_credentials(api_id: Option<&str>, api_token: Option<&str>) -> bool {
    let present = |value: Option<&str>| value.is_some_and(|v| !v.trim().is_empty());
    present(api_id) && present(api_token)
}

/// Derives the plain-HTTP variant of a secure URL for the fallback attempt.
///
/// Returns `None` for anything that is not an `https` URL.
pub fn insecure_variant(secure_url: &str) -> Option<String> {
    let mut parsed = Url::parse(secure_url).ok()?;
    if parsed.scheme() != "https" {
        return None;
    }
    parsed.set_scheme("http").ok()?;
    Some(parsed.to_string())
}

/// Typed accessors over a preference store.
pub struct ApiPrefs<S> {
    store: S,
}

impl<S: PrefsStore> ApiPrefs<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Reads a key, treating blank values as absent. Store errors degrade to
    /// "absent" with a warning; a broken preference file must never take the
    /// display down.
    fn get_trimmed(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(Some(value)) => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(key, error = %e, "preference read failed");
                None
            }
        }
    }

    pub fn api_id(&self) -> Option<String> {
        self.get_trimmed(KEY_API_ID)
    }

    pub fn api_token(&self) -> Option<String> {
        self.get_trimmed(KEY_API_TOKEN)
    }

    pub fn has_credentials(&self) -> bool {
        has_credentials(self.api_id().as_deref(), self.api_token().as_deref())
    }

    pub fn save_credentials(
        &self,
        api_id: Option<&str>,
        api_token: Option<&str>,
    ) -> Result<(), StoreError> {
        self.store
            .set(KEY_API_ID, api_id.map(str::trim).unwrap_or(""))?;
        self.store
            .set(KEY_API_TOKEN, api_token.map(str::trim).unwrap_or(""))
    }

    /// Resolves the canonical base URL.
    ///
    /// An absent or blank preference yields `default` unchanged. Otherwise
    /// the stored text is normalized and, when that changed it, the corrected
    /// value is written back. The write-back is at most once per call and a
    /// failed write never fails the read.
    pub fn base_url(&self, default: &str) -> String {
        let stored = match self.store.get(KEY_API_BASE_URL) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "base url read failed, using default");
                return default.to_string();
            }
        };

        let stored = match stored {
            Some(s) if !s.trim().is_empty() => s,
            _ => return default.to_string(),
        };

        let normalized = normalize_base_url(&stored, default);
        if normalized != stored.trim() {
            tracing::debug!(from = %stored.trim(), to = %normalized, "healing stored base url");
            if let Err(e) = self.store.set(KEY_API_BASE_URL, &normalized) {
                tracing::warn!(error = %e, "base url write-back failed");
            }
        }
        normalized
    }

    pub fn set_base_url(&self, raw: &str) -> Result<(), StoreError> {
        self.store
            .set(KEY_API_BASE_URL, &normalize_base_url(raw, DEFAULT_BASE_URL))
    }

    pub fn friendly_device_code(&self) -> Option<String> {
        self.get_trimmed(KEY_DEVICE_CODE)
    }

    pub fn save_friendly_device_code(&self, code: &str) -> Result<(), StoreError> {
        self.store.set(KEY_DEVICE_CODE, code.trim())
    }

    pub fn gift_from_name(&self) -> Option<String> {
        self.get_trimmed(KEY_GIFT_FROM)
    }

    pub fn save_gift_from_name(&self, name: &str) -> Result<(), StoreError> {
        self.store.set(KEY_GIFT_FROM, name.trim())
    }

    pub fn gift_to_name(&self) -> Option<String> {
        self.get_trimmed(KEY_GIFT_TO)
    }

    pub fn save_gift_to_name(&self, name: &str) -> Result<(), StoreError> {
        self.store.set(KEY_GIFT_TO, name.trim())
    }

    pub fn gift_web_setup(&self) -> bool {
        self.get_trimmed(KEY_GIFT_WEB_SETUP)
            .map(|v| v == "true")
            .unwrap_or(false)
    }

    pub fn set_gift_web_setup(&self, enabled: bool) -> Result<(), StoreError> {
        self.store
            .set(KEY_GIFT_WEB_SETUP, if enabled { "true" } else { "false" })
    }
}
