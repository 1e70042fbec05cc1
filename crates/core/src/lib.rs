#![warn(clippy::all, missing_docs)]

//! Core domain logic for the 21tui card-counting trainer.
//!
//! This crate hosts the card and Hi-Lo count arithmetic, strategy charts,
//! the session state machine with its persistence gateway, onboarding
//! progress tracking, and configuration handling used by the terminal UI
//! and any future frontends.

pub mod chart;
pub mod config;
pub mod count;
pub mod models;
pub mod onboarding;
pub mod session;
pub mod store;

pub use chart::{Chart, ChartError, Comparison, StrategyRule, DEFAULT_CHART};
pub use config::AppConfig;
pub use models::{
    Card, CountCheckPolicy, DealSpeed, DeckCount, Rank, Suit, TableRules, TrainingMode,
};
pub use onboarding::{OnboardingProgress, OnboardingStep, OnboardingTracker};
pub use session::{
    Phase, SessionEvent, SessionMachine, SessionSnapshot, SessionState, SessionSummary,
    TrainingEngine, TransitionError,
};
pub use store::SessionStore;
