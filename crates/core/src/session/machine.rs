//! Session state machine.
//!
//! Transitions are an explicit match over `(phase, event)` pairs. Every
//! pair has a defined outcome: a new phase or a rejection that leaves the
//! state untouched.

use thiserror::Error;
use tracing::debug;

use crate::count;
use crate::models::{Card, TableRules, TrainingMode};

use super::models::{Phase, SessionSnapshot, SessionState};

/// Events accepted by the session machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEvent {
    /// Start a new session with the given mode and rules. Idle only.
    Start {
        /// Training mode for the session.
        mode: TrainingMode,
        /// Table rules, fixed for the session.
        rules: TableRules,
    },
    /// First cards of a hand are about to go out.
    BeginDeal,
    /// A card was revealed. Updates the count and shoe; keeps the phase.
    CardDealt(Card),
    /// All initial cards are out; the player is on.
    PlayerTurn,
    /// The player finished acting; the dealer is on.
    PlayerDone,
    /// The dealer finished playing out their hand.
    DealerDone,
    /// Score the finished hand and route to the next hand or a count check.
    ResolveHand,
    /// The player answered the count-verification prompt.
    CountChecked,
    /// Suspend the session.
    Pause,
    /// Resume from a pause into the phase it paused from.
    Resume,
    /// End the session and lock in the summary.
    EndSession,
    /// Return a completed session to idle. Completed only.
    ResetToIdle,
}

impl SessionEvent {
    fn name(&self) -> &'static str {
        match self {
            SessionEvent::Start { .. } => "start",
            SessionEvent::BeginDeal => "beginDeal",
            SessionEvent::CardDealt(_) => "cardDealt",
            SessionEvent::PlayerTurn => "playerTurn",
            SessionEvent::PlayerDone => "playerDone",
            SessionEvent::DealerDone => "dealerDone",
            SessionEvent::ResolveHand => "resolveHand",
            SessionEvent::CountChecked => "countChecked",
            SessionEvent::Pause => "pause",
            SessionEvent::Resume => "resume",
            SessionEvent::EndSession => "endSession",
            SessionEvent::ResetToIdle => "resetToIdle",
        }
    }
}

/// Rejection of an event. The session state is left exactly as it was.
#[derive(Debug, Error, PartialEq)]
pub enum TransitionError {
    /// The event is not accepted in the current phase.
    #[error("event '{event}' is not valid in phase {phase:?}")]
    Rejected {
        /// Phase the machine was in when the event arrived.
        phase: Phase,
        /// Name of the rejected event.
        event: &'static str,
    },
    /// A card was dealt from an empty shoe.
    #[error("the shoe is empty")]
    ShoeEmpty,
}

/// Owns the [`SessionState`] and applies events to it.
///
/// Invariant: `running_count` always equals the sum of the count values of
/// every card dealt since session start. Only [`SessionEvent::CardDealt`]
/// touches it.
#[derive(Debug, Clone)]
pub struct SessionMachine {
    state: SessionState,
}

impl SessionMachine {
    /// New machine in the idle phase.
    pub fn new() -> Self {
        Self {
            state: SessionState::idle(),
        }
    }

    /// Rebuild a machine from a persisted snapshot (crash recovery).
    pub fn restore(snapshot: SessionSnapshot) -> Self {
        Self {
            state: snapshot.into_state(),
        }
    }

    /// Read-only view of the session state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Project the current state into a persistable snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::of(&self.state)
    }

    /// True count from the current running count and shoe depth.
    pub fn true_count(&self) -> i32 {
        count::true_count(
            self.state.running_count,
            count::decks_remaining(self.state.cards_remaining),
        )
    }

    /// Apply an event, returning the phase the machine landed in.
    pub fn apply(&mut self, event: SessionEvent) -> Result<Phase, TransitionError> {
        let phase = self.state.phase;
        match (phase, event) {
            (Phase::Idle, SessionEvent::Start { mode, rules }) => {
                self.state = SessionState::fresh(mode, rules);
                debug!(?mode, "session started");
            }
            (Phase::Ready, SessionEvent::BeginDeal) => {
                self.state.phase = Phase::Dealing;
            }
            (
                Phase::Dealing | Phase::AwaitingPlayerAction | Phase::DealerTurn,
                SessionEvent::CardDealt(card),
            ) => {
                if self.state.cards_remaining == 0 {
                    return Err(TransitionError::ShoeEmpty);
                }
                self.state.running_count =
                    count::running_after_card(self.state.running_count, card);
                self.state.cards_remaining -= 1;
                // Dealt cards never change the phase.
            }
            (Phase::Dealing, SessionEvent::PlayerTurn) => {
                self.state.phase = Phase::AwaitingPlayerAction;
            }
            (Phase::AwaitingPlayerAction, SessionEvent::PlayerDone) => {
                self.state.phase = Phase::DealerTurn;
            }
            (Phase::DealerTurn, SessionEvent::DealerDone) => {
                self.state.phase = Phase::HandResolved;
            }
            (Phase::HandResolved, SessionEvent::ResolveHand) => {
                self.state.hands_played += 1;
                self.state.phase = if self.state.cards_remaining == 0 {
                    debug!(hands = self.state.hands_played, "shoe exhausted");
                    Phase::Completed
                } else if self.state.rules.count_check.is_due(self.state.hands_played) {
                    Phase::CountPromptOpen
                } else {
                    Phase::Dealing
                };
            }
            (Phase::CountPromptOpen, SessionEvent::CountChecked) => {
                self.state.count_checks += 1;
                self.state.phase = Phase::Dealing;
            }
            (phase, SessionEvent::Pause) if phase.is_active() && phase != Phase::Paused => {
                self.state.paused_from = Some(phase);
                self.state.phase = Phase::Paused;
            }
            (Phase::Paused, SessionEvent::Resume) => {
                // paused_from is always set when entering Paused.
                self.state.phase = self.state.paused_from.take().unwrap_or(Phase::Ready);
            }
            (phase, SessionEvent::EndSession) if phase.is_active() => {
                self.state.paused_from = None;
                self.state.phase = Phase::Completed;
                debug!(
                    hands = self.state.hands_played,
                    checks = self.state.count_checks,
                    "session ended"
                );
            }
            (Phase::Completed, SessionEvent::ResetToIdle) => {
                self.state = SessionState::idle();
            }
            (phase, event) => {
                return Err(TransitionError::Rejected {
                    phase,
                    event: event.name(),
                })
            }
        }
        Ok(self.state.phase)
    }
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use super::*;
    use crate::models::{CountCheckPolicy, DeckCount, Rank, Suit};

    fn card(rank: Rank) -> Card {
        Card::new(rank, Suit::Diamonds)
    }

    fn rules_with_cadence(cadence: u32) -> TableRules {
        TableRules {
            count_check: CountCheckPolicy::EveryHands(NonZeroU32::new(cadence).unwrap()),
            ..TableRules::default()
        }
    }

    fn started(rules: TableRules) -> SessionMachine {
        let mut machine = SessionMachine::new();
        machine
            .apply(SessionEvent::Start {
                mode: TrainingMode::PlayAndCount,
                rules,
            })
            .unwrap();
        machine
    }

    /// Drive one full hand: deal two cards, play it out, score it.
    fn play_hand(machine: &mut SessionMachine) -> Phase {
        if machine.state().phase == Phase::Ready {
            machine.apply(SessionEvent::BeginDeal).unwrap();
        }
        machine.apply(SessionEvent::CardDealt(card(Rank::Five))).unwrap();
        machine.apply(SessionEvent::CardDealt(card(Rank::King))).unwrap();
        machine.apply(SessionEvent::PlayerTurn).unwrap();
        machine.apply(SessionEvent::PlayerDone).unwrap();
        machine.apply(SessionEvent::DealerDone).unwrap();
        machine.apply(SessionEvent::ResolveHand).unwrap()
    }

    #[test]
    fn starts_only_from_idle() {
        let mut machine = started(TableRules::default());
        let err = machine
            .apply(SessionEvent::Start {
                mode: TrainingMode::CountingDrill,
                rules: TableRules::default(),
            })
            .unwrap_err();
        assert!(matches!(err, TransitionError::Rejected { .. }));
        assert_eq!(machine.state().phase, Phase::Ready);
    }

    #[test]
    fn start_zeroes_counters_and_fills_shoe() {
        let machine = started(TableRules::default());
        let state = machine.state();
        assert_eq!(state.hands_played, 0);
        assert_eq!(state.count_checks, 0);
        assert_eq!(state.running_count, 0);
        assert_eq!(state.cards_remaining, 312);
    }

    #[test]
    fn dealt_cards_update_count_without_changing_phase() {
        let mut machine = started(TableRules::default());
        machine.apply(SessionEvent::BeginDeal).unwrap();
        machine.apply(SessionEvent::CardDealt(card(Rank::Three))).unwrap();
        machine.apply(SessionEvent::CardDealt(card(Rank::Ace))).unwrap();
        machine.apply(SessionEvent::CardDealt(card(Rank::Eight))).unwrap();

        let state = machine.state();
        assert_eq!(state.phase, Phase::Dealing);
        assert_eq!(state.running_count, 0); // +1 -1 0
        assert_eq!(state.cards_remaining, 309);
    }

    #[test]
    fn running_count_matches_sum_of_dealt_cards() {
        let mut machine = started(TableRules::default());
        machine.apply(SessionEvent::BeginDeal).unwrap();
        let dealt = [
            card(Rank::Two),
            card(Rank::Six),
            card(Rank::Ten),
            card(Rank::Seven),
            card(Rank::Ace),
        ];
        for c in dealt {
            machine.apply(SessionEvent::CardDealt(c)).unwrap();
        }
        let expected: i32 = dealt.iter().map(|c| i32::from(c.count_value())).sum();
        assert_eq!(machine.state().running_count, expected);
    }

    #[test]
    fn hand_resolution_routes_to_count_prompt_on_cadence() {
        let mut machine = started(rules_with_cadence(2));

        assert_eq!(play_hand(&mut machine), Phase::Dealing);
        assert_eq!(machine.state().hands_played, 1);

        assert_eq!(play_hand(&mut machine), Phase::CountPromptOpen);
        assert_eq!(machine.state().hands_played, 2);

        machine.apply(SessionEvent::CountChecked).unwrap();
        assert_eq!(machine.state().count_checks, 1);
        assert_eq!(machine.state().phase, Phase::Dealing);
    }

    #[test]
    fn hand_resolution_skips_prompt_when_policy_is_never() {
        let rules = TableRules {
            count_check: CountCheckPolicy::Never,
            ..TableRules::default()
        };
        let mut machine = started(rules);
        for _ in 0..5 {
            assert_eq!(play_hand(&mut machine), Phase::Dealing);
        }
        assert_eq!(machine.state().count_checks, 0);
    }

    #[test]
    fn pause_returns_to_origin_phase() {
        let mut machine = started(TableRules::default());
        machine.apply(SessionEvent::BeginDeal).unwrap();
        machine.apply(SessionEvent::PlayerTurn).unwrap();

        machine.apply(SessionEvent::Pause).unwrap();
        assert_eq!(machine.state().phase, Phase::Paused);

        machine.apply(SessionEvent::Resume).unwrap();
        assert_eq!(machine.state().phase, Phase::AwaitingPlayerAction);
        assert_eq!(machine.state().paused_from, None);
    }

    #[test]
    fn pause_is_rejected_when_idle_completed_or_paused() {
        let mut machine = SessionMachine::new();
        assert!(machine.apply(SessionEvent::Pause).is_err());

        let mut machine = started(TableRules::default());
        machine.apply(SessionEvent::Pause).unwrap();
        assert!(machine.apply(SessionEvent::Pause).is_err());

        machine.apply(SessionEvent::EndSession).unwrap();
        assert!(machine.apply(SessionEvent::Pause).is_err());
    }

    #[test]
    fn end_session_locks_in_summary_counters() {
        let mut machine = started(rules_with_cadence(10));
        play_hand(&mut machine);
        play_hand(&mut machine);
        machine.apply(SessionEvent::EndSession).unwrap();

        let state = machine.state();
        assert_eq!(state.phase, Phase::Completed);
        assert_eq!(state.hands_played, 2);
    }

    #[test]
    fn reset_to_idle_only_valid_from_completed() {
        let mut machine = SessionMachine::new();
        assert!(machine.apply(SessionEvent::ResetToIdle).is_err());

        let mut machine = started(TableRules::default());
        let before = machine.state().clone();
        let err = machine.apply(SessionEvent::ResetToIdle).unwrap_err();
        assert!(matches!(err, TransitionError::Rejected { .. }));
        // Rejection leaves the state untouched.
        assert_eq!(machine.state(), &before);

        machine.apply(SessionEvent::EndSession).unwrap();
        machine.apply(SessionEvent::ResetToIdle).unwrap();
        assert_eq!(machine.state(), &SessionState::idle());
    }

    #[test]
    fn dealing_from_empty_shoe_is_rejected() {
        let rules = TableRules {
            decks: DeckCount::Single,
            ..TableRules::default()
        };
        let mut machine = started(rules);
        machine.apply(SessionEvent::BeginDeal).unwrap();
        for _ in 0..52 {
            machine.apply(SessionEvent::CardDealt(card(Rank::Eight))).unwrap();
        }
        assert_eq!(machine.state().cards_remaining, 0);
        assert_eq!(
            machine.apply(SessionEvent::CardDealt(card(Rank::Two))),
            Err(TransitionError::ShoeEmpty)
        );
    }

    #[test]
    fn shoe_exhaustion_completes_on_resolution() {
        let rules = TableRules {
            decks: DeckCount::Single,
            count_check: CountCheckPolicy::Never,
            ..TableRules::default()
        };
        let mut machine = started(rules);
        machine.apply(SessionEvent::BeginDeal).unwrap();
        for _ in 0..52 {
            machine.apply(SessionEvent::CardDealt(card(Rank::Eight))).unwrap();
        }
        machine.apply(SessionEvent::PlayerTurn).unwrap();
        machine.apply(SessionEvent::PlayerDone).unwrap();
        machine.apply(SessionEvent::DealerDone).unwrap();
        assert_eq!(
            machine.apply(SessionEvent::ResolveHand).unwrap(),
            Phase::Completed
        );
    }

    #[test]
    fn restore_rebuilds_machine_from_snapshot() {
        let mut machine = started(TableRules::default());
        play_hand(&mut machine);
        let snapshot = machine.snapshot();

        let restored = SessionMachine::restore(snapshot);
        assert_eq!(restored.state(), machine.state());
    }

    #[test]
    fn true_count_reflects_shoe_depth() {
        let mut machine = started(TableRules::default());
        machine.apply(SessionEvent::BeginDeal).unwrap();
        // Six low cards: running +6 with just under six decks left.
        for _ in 0..6 {
            machine.apply(SessionEvent::CardDealt(card(Rank::Four))).unwrap();
        }
        assert_eq!(machine.state().running_count, 6);
        assert_eq!(machine.true_count(), 1);
    }
}
