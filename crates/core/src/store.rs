//! Durable slot persistence for sessions, history, and onboarding.
//!
//! Each slot is a single JSON document replaced wholesale on write. A
//! missing slot reads as `None`; a corrupt slot is reported and treated
//! the same, never surfaced as a hard failure.

use std::{fs, io, path::PathBuf};

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use crate::onboarding::OnboardingProgress;
use crate::session::{SessionSnapshot, SessionSummary};

/// Directory under the user data dir holding trainer state.
pub const DEFAULT_STORE_DIR: &str = "21tui";

const ACTIVE_SESSION_SLOT: &str = "active_session.json";
const HISTORY_SLOT: &str = "history.json";
const ONBOARDING_SLOT: &str = "onboarding.json";

/// Gateway to the on-disk slots.
#[derive(Debug, Clone)]
pub struct SessionStore {
    root: PathBuf,
}

impl SessionStore {
    /// Create a store rooted at the provided directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default location under the user's data directory.
    pub fn default_root() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_STORE_DIR)
    }

    /// Overwrite the active-session slot with the given snapshot.
    pub fn save_active(&self, snapshot: &SessionSnapshot) -> Result<()> {
        self.write_slot(ACTIVE_SESSION_SLOT, snapshot)
    }

    /// Read the active-session slot. `None` when absent or unreadable.
    pub fn load_active(&self) -> Result<Option<SessionSnapshot>> {
        self.read_slot(ACTIVE_SESSION_SLOT)
    }

    /// Remove the active-session slot. Clearing an empty slot succeeds.
    pub fn clear_active(&self) -> Result<()> {
        self.clear_slot(ACTIVE_SESSION_SLOT)
    }

    /// All completed-session records, oldest first.
    pub fn load_history(&self) -> Result<Vec<SessionSummary>> {
        Ok(self.read_slot(HISTORY_SLOT)?.unwrap_or_default())
    }

    /// Append a completed-session record to the history slot.
    pub fn append_history(&self, summary: &SessionSummary) -> Result<()> {
        let mut records = self.load_history()?;
        records.push(summary.clone());
        self.write_slot(HISTORY_SLOT, &records)
    }

    /// Remove all history records.
    pub fn clear_history(&self) -> Result<()> {
        self.clear_slot(HISTORY_SLOT)
    }

    /// Read the onboarding slot. `None` when absent or unreadable.
    pub fn load_onboarding(&self) -> Result<Option<OnboardingProgress>> {
        self.read_slot(ONBOARDING_SLOT)
    }

    /// Overwrite the onboarding slot.
    pub fn save_onboarding(&self, progress: &OnboardingProgress) -> Result<()> {
        self.write_slot(ONBOARDING_SLOT, progress)
    }

    /// Remove the onboarding slot. Idempotent.
    pub fn clear_onboarding(&self) -> Result<()> {
        self.clear_slot(ONBOARDING_SLOT)
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        self.root.join(slot)
    }

    fn write_slot<T: Serialize>(&self, slot: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("failed to create {}", self.root.display()))?;
        let path = self.slot_path(slot);
        let serialised = serde_json::to_vec_pretty(value)?;
        fs::write(&path, serialised).with_context(|| format!("failed to write {}", path.display()))
    }

    fn read_slot<T: DeserializeOwned>(&self, slot: &str) -> Result<Option<T>> {
        let path = self.slot_path(slot);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read {}", path.display()))
            }
        };
        match serde_json::from_str(&content) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!("Discarding corrupt slot {}: {err}", path.display());
                Ok(None)
            }
        }
    }

    fn clear_slot(&self, slot: &str) -> Result<()> {
        let path = self.slot_path(slot);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("failed to remove {}", path.display())),
        }
    }
}
