//! Training-session lifecycle: phases, state machine, and orchestration.

mod engine;
mod machine;
mod models;

pub use engine::TrainingEngine;
pub use machine::{SessionEvent, SessionMachine, TransitionError};
pub use models::{Phase, SessionSnapshot, SessionState, SessionSummary};
