mod app;

use anyhow::Result;
use std::fs::{self, OpenOptions};

use tracing_subscriber::{prelude::*, EnvFilter};
use tui21_core::{
    config::{self, AppConfig},
    onboarding::OnboardingTracker,
    session::TrainingEngine,
    store::SessionStore,
};

fn main() -> Result<()> {
    init_logging()?;

    config::ensure_default_config()?;
    let config = AppConfig::load()?;

    let store = SessionStore::new(&config.data_root);
    let engine = TrainingEngine::new(store.clone());
    let onboarding = OnboardingTracker::new(store.clone());

    let mut app = app::TrainerApp::new(config, engine, onboarding, store);
    app.run()
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("21tui.log");

    let env_filter = EnvFilter::from_default_env();

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
