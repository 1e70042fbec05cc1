//! Couples the session machine to the persistence store.
//!
//! Every accepted event is followed by a snapshot write before the next
//! event is taken, so recovery is never more than one event stale. Store
//! failures are logged and swallowed; the in-memory session is the source
//! of truth and must not be corrupted by a failing disk.

use tracing::{info, warn};

use crate::models::{Card, TableRules, TrainingMode};
use crate::store::SessionStore;

use super::machine::{SessionEvent, SessionMachine, TransitionError};
use super::models::{Phase, SessionSnapshot, SessionState, SessionSummary};

/// Orchestrates a training session's lifecycle and durability.
#[derive(Debug)]
pub struct TrainingEngine {
    machine: SessionMachine,
    store: SessionStore,
}

impl TrainingEngine {
    /// New engine in the idle phase over the given store.
    pub fn new(store: SessionStore) -> Self {
        Self {
            machine: SessionMachine::new(),
            store,
        }
    }

    /// Saved snapshot worth offering for recovery, if any. Snapshots with
    /// no hands played are stale and never surfaced.
    pub fn recovery_candidate(&self) -> Option<SessionSnapshot> {
        match self.store.load_active() {
            Ok(Some(snapshot)) if snapshot.is_recoverable() => Some(snapshot),
            Ok(_) => None,
            Err(err) => {
                warn!("failed to read saved session: {err:#}");
                None
            }
        }
    }

    /// Resume a previously interrupted session from its snapshot.
    pub fn restore_session(&mut self, snapshot: SessionSnapshot) -> Result<(), TransitionError> {
        if self.machine.state().phase != Phase::Idle {
            return Err(TransitionError::Rejected {
                phase: self.machine.state().phase,
                event: "restoreSession",
            });
        }
        info!(
            hands = snapshot.hands_played,
            "restoring interrupted session"
        );
        self.machine = SessionMachine::restore(snapshot);
        self.persist();
        Ok(())
    }

    /// Throw away the saved snapshot without restoring it.
    pub fn discard_recovery(&self) {
        if let Err(err) = self.store.clear_active() {
            warn!("failed to discard saved session: {err:#}");
        }
    }

    /// Apply an event, then persist the outcome.
    pub fn apply(&mut self, event: SessionEvent) -> Result<Phase, TransitionError> {
        let phase = self.machine.apply(event)?;
        match phase {
            Phase::Completed => {
                // The summary becomes a history record; the active slot is
                // no longer worth recovering.
                let summary = SessionSummary::of(self.machine.state());
                if let Err(err) = self.store.append_history(&summary) {
                    warn!("failed to record session history: {err:#}");
                }
                if let Err(err) = self.store.clear_active() {
                    warn!("failed to clear saved session: {err:#}");
                }
            }
            Phase::Idle => {
                if let Err(err) = self.store.clear_active() {
                    warn!("failed to clear saved session: {err:#}");
                }
            }
            _ => self.persist(),
        }
        Ok(phase)
    }

    /// Start a new session. Idle only.
    pub fn start_session(
        &mut self,
        mode: TrainingMode,
        rules: TableRules,
    ) -> Result<Phase, TransitionError> {
        self.apply(SessionEvent::Start { mode, rules })
    }

    /// Begin dealing the first hand.
    pub fn begin_deal(&mut self) -> Result<Phase, TransitionError> {
        self.apply(SessionEvent::BeginDeal)
    }

    /// Record a revealed card.
    pub fn card_dealt(&mut self, card: Card) -> Result<Phase, TransitionError> {
        self.apply(SessionEvent::CardDealt(card))
    }

    /// Hand the turn to the player.
    pub fn player_turn(&mut self) -> Result<Phase, TransitionError> {
        self.apply(SessionEvent::PlayerTurn)
    }

    /// Player finished acting.
    pub fn player_done(&mut self) -> Result<Phase, TransitionError> {
        self.apply(SessionEvent::PlayerDone)
    }

    /// Dealer finished playing.
    pub fn dealer_done(&mut self) -> Result<Phase, TransitionError> {
        self.apply(SessionEvent::DealerDone)
    }

    /// Score the finished hand.
    pub fn resolve_hand(&mut self) -> Result<Phase, TransitionError> {
        self.apply(SessionEvent::ResolveHand)
    }

    /// Count-verification prompt answered.
    pub fn count_checked(&mut self) -> Result<Phase, TransitionError> {
        self.apply(SessionEvent::CountChecked)
    }

    /// Suspend the session.
    pub fn pause(&mut self) -> Result<Phase, TransitionError> {
        self.apply(SessionEvent::Pause)
    }

    /// Resume a suspended session.
    pub fn resume(&mut self) -> Result<Phase, TransitionError> {
        self.apply(SessionEvent::Resume)
    }

    /// End the session and lock in the summary.
    pub fn end_session(&mut self) -> Result<Phase, TransitionError> {
        self.apply(SessionEvent::EndSession)
    }

    /// Return a completed session to idle, clearing the saved snapshot.
    pub fn reset_to_idle(&mut self) -> Result<Phase, TransitionError> {
        self.apply(SessionEvent::ResetToIdle)
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.machine.state().phase
    }

    /// Hands resolved this session.
    pub fn hands_played(&self) -> u32 {
        self.machine.state().hands_played
    }

    /// Count checks answered this session.
    pub fn count_checks(&self) -> u32 {
        self.machine.state().count_checks
    }

    /// Running count.
    pub fn running_count(&self) -> i32 {
        self.machine.state().running_count
    }

    /// Undealt cards left in the shoe.
    pub fn cards_remaining(&self) -> u32 {
        self.machine.state().cards_remaining
    }

    /// True count derived from the running count and shoe depth.
    pub fn true_count(&self) -> i32 {
        self.machine.true_count()
    }

    /// Full read-only session state.
    pub fn state(&self) -> &SessionState {
        self.machine.state()
    }

    fn persist(&self) {
        if let Err(err) = self.store.save_active(&self.machine.snapshot()) {
            warn!("failed to persist session snapshot: {err:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use super::*;
    use crate::models::{CountCheckPolicy, Rank, Suit};
    use tempfile::tempdir;

    fn engine_in(dir: &std::path::Path) -> TrainingEngine {
        TrainingEngine::new(SessionStore::new(dir))
    }

    fn card(rank: Rank) -> Card {
        Card::new(rank, Suit::Spades)
    }

    fn play_one_hand(engine: &mut TrainingEngine) {
        if engine.phase() == Phase::Ready {
            engine.begin_deal().unwrap();
        }
        engine.card_dealt(card(Rank::Six)).unwrap();
        engine.card_dealt(card(Rank::Queen)).unwrap();
        engine.player_turn().unwrap();
        engine.player_done().unwrap();
        engine.dealer_done().unwrap();
        engine.resolve_hand().unwrap();
    }

    #[test]
    fn every_event_is_followed_by_a_snapshot_write() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let mut engine = engine_in(dir.path());

        engine
            .start_session(TrainingMode::PlayAndCount, TableRules::default())
            .unwrap();
        let saved = store.load_active().unwrap().unwrap();
        assert_eq!(saved.phase, Phase::Ready);

        engine.begin_deal().unwrap();
        engine.card_dealt(card(Rank::Two)).unwrap();
        let saved = store.load_active().unwrap().unwrap();
        assert_eq!(saved.running_count, 1);
        assert_eq!(saved.cards_remaining, 311);
    }

    #[test]
    fn completion_appends_history_and_clears_active_slot() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let mut engine = engine_in(dir.path());

        engine
            .start_session(TrainingMode::PlayAndCount, TableRules::default())
            .unwrap();
        play_one_hand(&mut engine);
        engine.end_session().unwrap();

        assert!(store.load_active().unwrap().is_none());
        let history = store.load_history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].hands_played, 1);

        // Summary stays readable until reset.
        assert_eq!(engine.phase(), Phase::Completed);
        assert_eq!(engine.hands_played(), 1);
    }

    #[test]
    fn recovery_candidate_requires_played_hands() {
        let dir = tempdir().unwrap();
        let mut engine = engine_in(dir.path());

        engine
            .start_session(TrainingMode::CountingDrill, TableRules::default())
            .unwrap();
        // Zero hands played: saved, but not worth recovering.
        let fresh = engine_in(dir.path());
        assert!(fresh.recovery_candidate().is_none());

        play_one_hand(&mut engine);
        let fresh = engine_in(dir.path());
        let candidate = fresh.recovery_candidate().unwrap();
        assert_eq!(candidate.hands_played, 1);
    }

    #[test]
    fn restore_resumes_where_the_session_left_off() {
        let dir = tempdir().unwrap();
        let mut engine = engine_in(dir.path());
        engine
            .start_session(TrainingMode::PlayAndCount, TableRules::default())
            .unwrap();
        play_one_hand(&mut engine);
        let before = engine.state().clone();

        let mut revived = engine_in(dir.path());
        let snapshot = revived.recovery_candidate().unwrap();
        revived.restore_session(snapshot).unwrap();
        assert_eq!(revived.state(), &before);
    }

    #[test]
    fn restore_is_rejected_mid_session() {
        let dir = tempdir().unwrap();
        let mut engine = engine_in(dir.path());
        engine
            .start_session(TrainingMode::PlayAndCount, TableRules::default())
            .unwrap();
        play_one_hand(&mut engine);
        let snapshot = engine.recovery_candidate().unwrap();
        assert!(engine.restore_session(snapshot).is_err());
    }

    #[test]
    fn discard_recovery_clears_the_slot() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let mut engine = engine_in(dir.path());
        engine
            .start_session(TrainingMode::PlayAndCount, TableRules::default())
            .unwrap();
        play_one_hand(&mut engine);

        let fresh = engine_in(dir.path());
        fresh.discard_recovery();
        assert!(store.load_active().unwrap().is_none());
        assert!(fresh.recovery_candidate().is_none());
    }

    #[test]
    fn reset_to_idle_clears_state_and_snapshot() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let mut engine = engine_in(dir.path());
        engine
            .start_session(TrainingMode::PlayAndCount, TableRules::default())
            .unwrap();
        play_one_hand(&mut engine);
        engine.end_session().unwrap();
        engine.reset_to_idle().unwrap();

        assert_eq!(engine.phase(), Phase::Idle);
        assert_eq!(engine.hands_played(), 0);
        assert!(store.load_active().unwrap().is_none());
    }

    #[test]
    fn count_prompt_flow_persists_check_total() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let rules = TableRules {
            count_check: CountCheckPolicy::EveryHands(NonZeroU32::new(1).unwrap()),
            ..TableRules::default()
        };
        let mut engine = engine_in(dir.path());
        engine
            .start_session(TrainingMode::PlayAndCount, rules)
            .unwrap();
        play_one_hand(&mut engine);
        assert_eq!(engine.phase(), Phase::CountPromptOpen);
        engine.count_checked().unwrap();

        let saved = store.load_active().unwrap().unwrap();
        assert_eq!(saved.count_checks, 1);
        assert_eq!(saved.phase, Phase::Dealing);
    }
}
