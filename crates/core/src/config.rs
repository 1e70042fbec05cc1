//! Application configuration.
//!
//! Layered sources: built-in defaults, then `config.toml` under the user
//! config dir, then `TUI21_`-prefixed environment variables.

use std::num::NonZeroU32;
use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::models::{CountCheckPolicy, DealSpeed, DeckCount, TableRules};
use crate::store::SessionStore;

/// Directory under the user config dir holding `config.toml`.
pub const CONFIG_DIR: &str = "21tui";

const DEFAULT_CONFIG: &str = r#"# 21tui configuration.
# Settings here are defaults for new sessions; each session keeps the
# rules it started with.

# Decks in the shoe: 1, 2, 6, or 8.
default_decks = 6

# Deal pacing: "slow", "normal", or "fast".
default_deal_speed = "normal"

# Prompt for a count verification every N resolved hands. 0 disables.
count_check_every_hands = 4

# Where trainer state (sessions, history, onboarding) is stored.
# Defaults to the platform data directory.
# data_root = "/path/to/state"
"#;

/// Settings read at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding persisted trainer state.
    pub data_root: PathBuf,
    /// Decks in the shoe for new sessions (1, 2, 6, or 8).
    pub default_decks: u32,
    /// Deal pacing for new sessions.
    pub default_deal_speed: DealSpeed,
    /// Prompt a count verification every this many hands; 0 disables.
    pub count_check_every_hands: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_root: SessionStore::default_root(),
            default_decks: 6,
            default_deal_speed: DealSpeed::Normal,
            count_check_every_hands: 4,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file, and environment.
    pub fn load() -> Result<Self> {
        let defaults =
            Config::try_from(&AppConfig::default()).context("failed to build default config")?;
        let settings = Config::builder()
            .add_source(defaults)
            .add_source(File::from(config_path()).required(false))
            .add_source(Environment::with_prefix("TUI21"))
            .build()
            .context("failed to load configuration")?;
        settings
            .try_deserialize()
            .context("invalid configuration")
    }

    /// Table rules for a new session, validated against supported values.
    pub fn table_rules(&self) -> Result<TableRules> {
        let decks = DeckCount::from_decks(self.default_decks).with_context(|| {
            format!(
                "unsupported deck count {} (expected 1, 2, 6, or 8)",
                self.default_decks
            )
        })?;
        let count_check = match NonZeroU32::new(self.count_check_every_hands) {
            Some(cadence) => CountCheckPolicy::EveryHands(cadence),
            None => CountCheckPolicy::Never,
        };
        Ok(TableRules {
            decks,
            deal_speed: self.default_deal_speed,
            count_check,
        })
    }
}

/// Path of the configuration file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join("config.toml")
}

/// Write a commented default config file if none exists yet.
pub fn ensure_default_config() -> Result<()> {
    let path = config_path();
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))
}
