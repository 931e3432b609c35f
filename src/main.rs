use anyhow::{Context, Result};
use contextual::integration::{language_tag_from_locale, AppConfig, SidebarSession, TEST_PHRASE};
use contextual::settings::{JsonFileStore, SettingsStore};
use contextual::speech::{PlaybackState, SimulatedEngine};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SETTINGS_ENV: &str = "CONTEXTUAL_SETTINGS";
const DEFAULT_SETTINGS_PATH: &str = "contextual-settings.json";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "contextual=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting contextual speech demo");

    let path = std::env::var(SETTINGS_ENV).unwrap_or_else(|_| DEFAULT_SETTINGS_PATH.to_string());
    let store: Arc<dyn SettingsStore> = Arc::new(JsonFileStore::new(&path));

    let mut config = AppConfig::default();
    if let Some(tag) = std::env::var("LANG").ok().as_deref().and_then(language_tag_from_locale) {
        config = config.with_language(tag);
    }

    let engine = Arc::new(SimulatedEngine::default());
    let mut session = SidebarSession::initialize(engine, store, config)
        .await
        .with_context(|| format!("failed to initialize from {}", path))?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let text = if args.is_empty() {
        TEST_PHRASE.to_string()
    } else {
        args.join(" ")
    };

    session.speak_answer(&text)?;

    loop {
        match session.poll() {
            Ok(PlaybackState::Idle) => break,
            Ok(_) => tokio::time::sleep(Duration::from_millis(50)).await,
            Err(e) => {
                error!("{}", e.user_message());
                return Err(e.into());
            }
        }
    }

    info!("Done");
    Ok(())
}
