//! Session state, snapshots, and completed-session summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{TableRules, TrainingMode};

/// Discrete lifecycle stage of a training session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// No session in progress. Sole initial phase.
    #[default]
    Idle,
    /// Session started, first hand not yet dealt.
    Ready,
    /// Cards going out for the current hand.
    Dealing,
    /// Waiting on a player decision.
    AwaitingPlayerAction,
    /// Dealer playing out their hand.
    DealerTurn,
    /// Hand finished, outcome known, not yet scored.
    HandResolved,
    /// Count-verification prompt showing.
    CountPromptOpen,
    /// Session suspended; resumes into the phase it paused from.
    Paused,
    /// Session over. Terminal until an explicit reset.
    Completed,
}

impl Phase {
    /// Active phases sit between session start and completion; they can be
    /// paused and are worth snapshotting.
    pub fn is_active(self) -> bool {
        !matches!(self, Phase::Idle | Phase::Completed)
    }
}

/// Mutable session aggregate, owned exclusively by the session machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Current lifecycle phase.
    pub phase: Phase,
    /// Hands resolved so far. Never decreases within a session.
    pub hands_played: u32,
    /// Count-verification prompts answered. Never decreases.
    pub count_checks: u32,
    /// Hi-Lo running count since session start.
    pub running_count: i32,
    /// Undealt cards left in the shoe.
    pub cards_remaining: u32,
    /// Training mode chosen at session start.
    pub mode: TrainingMode,
    /// Table rules fixed at session start.
    pub rules: TableRules,
    /// Phase to resume into after a pause.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused_from: Option<Phase>,
}

impl SessionState {
    /// Idle placeholder with zeroed counters and default rules.
    pub fn idle() -> Self {
        Self {
            phase: Phase::Idle,
            hands_played: 0,
            count_checks: 0,
            running_count: 0,
            cards_remaining: 0,
            mode: TrainingMode::default(),
            rules: TableRules::default(),
            paused_from: None,
        }
    }

    /// Fresh state for a newly started session: zeroed counters and a full
    /// shoe sized from the rules.
    pub(crate) fn fresh(mode: TrainingMode, rules: TableRules) -> Self {
        Self {
            phase: Phase::Ready,
            hands_played: 0,
            count_checks: 0,
            running_count: 0,
            cards_remaining: rules.shoe_size(),
            mode,
            rules,
            paused_from: None,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::idle()
    }
}

/// Serializable projection of [`SessionState`] written to the active-session
/// slot. Used only for recovery prompts, never as the live source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Phase at the time of the snapshot.
    pub phase: Phase,
    /// Hands resolved when the snapshot was taken.
    pub hands_played: u32,
    /// Count checks answered when the snapshot was taken.
    pub count_checks: u32,
    /// Running count when the snapshot was taken.
    pub running_count: i32,
    /// Shoe depth when the snapshot was taken.
    pub cards_remaining: u32,
    /// Training mode of the session.
    pub mode: TrainingMode,
    /// Table rules of the session.
    pub rules: TableRules,
    /// Pause origin, if the session was paused.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused_from: Option<Phase>,
    /// When the snapshot was written.
    pub saved_at: DateTime<Utc>,
}

impl SessionSnapshot {
    /// Project the given state into a snapshot stamped with the current time.
    pub fn of(state: &SessionState) -> Self {
        Self {
            phase: state.phase,
            hands_played: state.hands_played,
            count_checks: state.count_checks,
            running_count: state.running_count,
            cards_remaining: state.cards_remaining,
            mode: state.mode,
            rules: state.rules,
            paused_from: state.paused_from,
            saved_at: Utc::now(),
        }
    }

    /// A snapshot with no hands played is stale, not worth recovering.
    pub fn is_recoverable(&self) -> bool {
        self.hands_played > 0
    }

    pub(crate) fn into_state(self) -> SessionState {
        SessionState {
            phase: self.phase,
            hands_played: self.hands_played,
            count_checks: self.count_checks,
            running_count: self.running_count,
            cards_remaining: self.cards_remaining,
            mode: self.mode,
            rules: self.rules,
            paused_from: self.paused_from,
        }
    }
}

/// Completed-session record appended to the history slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Training mode of the finished session.
    pub mode: TrainingMode,
    /// Hands resolved over the session.
    pub hands_played: u32,
    /// Count checks answered over the session.
    pub count_checks: u32,
    /// When the session completed.
    pub completed_at: DateTime<Utc>,
}

impl SessionSummary {
    /// Summarise a completed session.
    pub fn of(state: &SessionState) -> Self {
        Self {
            mode: state.mode,
            hands_played: state.hands_played,
            count_checks: state.count_checks,
            completed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_projects_state() {
        let mut state = SessionState::fresh(TrainingMode::PlayAndCount, TableRules::default());
        state.hands_played = 3;
        state.running_count = -2;
        state.cards_remaining = 200;

        let snapshot = SessionSnapshot::of(&state);
        assert_eq!(snapshot.phase, Phase::Ready);
        assert_eq!(snapshot.hands_played, 3);
        assert_eq!(snapshot.running_count, -2);
        assert_eq!(snapshot.into_state(), state);
    }

    #[test]
    fn snapshot_with_zero_hands_is_not_recoverable() {
        let state = SessionState::fresh(TrainingMode::CountingDrill, TableRules::default());
        assert!(!SessionSnapshot::of(&state).is_recoverable());

        let mut played = state;
        played.hands_played = 1;
        assert!(SessionSnapshot::of(&played).is_recoverable());
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let state = SessionState::fresh(TrainingMode::TrueCount, TableRules::default());
        let snapshot = SessionSnapshot::of(&state);
        let raw = serde_json::to_string(&snapshot).unwrap();
        let parsed: SessionSnapshot = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, snapshot);
    }

    #[test]
    fn phase_activity() {
        assert!(!Phase::Idle.is_active());
        assert!(!Phase::Completed.is_active());
        assert!(Phase::Dealing.is_active());
        assert!(Phase::Paused.is_active());
        assert!(Phase::CountPromptOpen.is_active());
    }
}
