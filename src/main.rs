use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trmnl_fetch::{
    insecure_variant, normalize_base_url, ApiPrefs, Config, FetchRequest, FetchSubscription,
    JsonFileStore, ResilientFetcher, DEFAULT_BASE_URL,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trmnl_fetch=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let prefs = ApiPrefs::new(JsonFileStore::new(config.prefs_path.clone()));

    if !prefs.has_credentials() {
        tracing::warn!("no API credentials configured, fetching anonymously");
    }

    let base_url = match &config.base_url_override {
        Some(raw) => normalize_base_url(raw, DEFAULT_BASE_URL),
        None => prefs.base_url(DEFAULT_BASE_URL),
    };
    let secure_url = format!("{}{}", base_url, config.endpoint);
    let insecure_url = insecure_variant(&secure_url);

    tracing::info!(url = %secure_url, "fetching display content");

    let request = FetchRequest::get(secure_url).with_insecure_fallback(insecure_url);
    let subscription = FetchSubscription::spawn(ResilientFetcher::arc(), request);

    match subscription.recv().await {
        Some(Ok(body)) => println!("{body}"),
        Some(Err(error)) => {
            eprintln!("Error: {error}");
            std::process::exit(1);
        }
        None => {
            eprintln!("Error: fetch task ended without a result");
            std::process::exit(1);
        }
    }
}
