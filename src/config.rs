use std::env;
use std::path::PathBuf;

pub struct Config {
    /// Path of the JSON preference file.
    pub prefs_path: PathBuf,
    /// Endpoint path appended to the canonical base URL.
    pub endpoint: String,
    /// Base URL override, bypassing the stored preference when set.
    pub base_url_override: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            prefs_path: env::var("TRMNL_PREFS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("trmnl_prefs.json")),
            endpoint: env::var("TRMNL_ENDPOINT").unwrap_or_else(|_| "/display".to_string()),
            base_url_override: env::var("TRMNL_BASE_URL").ok(),
        }
    }
}
