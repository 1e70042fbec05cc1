//! Onboarding curriculum: a fixed, ordered checklist of training steps.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::session::SessionSummary;
use crate::store::SessionStore;

/// One step of the onboarding curriculum, in fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OnboardingStep {
    /// Count down a full deck.
    DeckCountdown,
    /// Keep a running count.
    CountingDrill,
    /// Convert to true counts.
    TrueCount,
    /// Play full hands while counting.
    PlayAndCount,
}

impl OnboardingStep {
    /// The curriculum in its fixed order.
    pub const ORDER: [OnboardingStep; 4] = [
        OnboardingStep::DeckCountdown,
        OnboardingStep::CountingDrill,
        OnboardingStep::TrueCount,
        OnboardingStep::PlayAndCount,
    ];

    /// User-facing label.
    pub fn label(self) -> &'static str {
        match self {
            OnboardingStep::DeckCountdown => "Deck Countdown",
            OnboardingStep::CountingDrill => "Counting Drill",
            OnboardingStep::TrueCount => "True Count",
            OnboardingStep::PlayAndCount => "Play & Count",
        }
    }
}

/// Persisted progress through the curriculum. Steps may be completed in any
/// order; the current step is always the first incomplete one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OnboardingProgress {
    completed_steps: Vec<OnboardingStep>,
}

impl OnboardingProgress {
    /// Steps completed so far, in completion order.
    pub fn completed_steps(&self) -> &[OnboardingStep] {
        &self.completed_steps
    }

    /// Whether the given step has been completed.
    pub fn is_completed(&self, step: OnboardingStep) -> bool {
        self.completed_steps.contains(&step)
    }

    /// First step in fixed order not yet completed, or `None` when done.
    pub fn current_step(&self) -> Option<OnboardingStep> {
        OnboardingStep::ORDER
            .iter()
            .copied()
            .find(|step| !self.is_completed(*step))
    }

    /// Whether every step has been completed.
    pub fn is_complete(&self) -> bool {
        OnboardingStep::ORDER
            .iter()
            .all(|step| self.is_completed(*step))
    }

    /// Mark a step completed. Completing a completed step is a no-op.
    pub fn complete(&mut self, step: OnboardingStep) {
        if !self.is_completed(step) {
            self.completed_steps.push(step);
        }
    }
}

/// Store-backed progress tracker exposed to the front-end.
#[derive(Debug, Clone)]
pub struct OnboardingTracker {
    store: SessionStore,
}

impl OnboardingTracker {
    /// Create a tracker over the given store.
    pub fn new(store: SessionStore) -> Self {
        Self { store }
    }

    /// Current progress. Unreadable storage degrades to a fresh checklist.
    pub fn progress(&self) -> OnboardingProgress {
        match self.store.load_onboarding() {
            Ok(Some(progress)) => progress,
            Ok(None) => OnboardingProgress::default(),
            Err(err) => {
                warn!("failed to load onboarding progress: {err:#}");
                OnboardingProgress::default()
            }
        }
    }

    /// Complete a step and persist the result. Idempotent.
    pub fn complete_step(&self, step: OnboardingStep) -> Result<OnboardingProgress> {
        let mut progress = self.progress();
        progress.complete(step);
        self.store.save_onboarding(&progress)?;
        Ok(progress)
    }

    /// Discard all progress.
    pub fn reset(&self) -> Result<()> {
        self.store.clear_onboarding()
    }
}

/// A user is new only while no onboarding step has been completed and no
/// session has ever finished.
pub fn is_new_user(progress: &OnboardingProgress, history: &[SessionSummary]) -> bool {
    progress.completed_steps().is_empty() && history.is_empty()
}
