use thiserror::Error;

use crate::engine::{GameState, Variant};

/// Configuration faults that stop a session from starting.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("{variant} produced an empty stimulus at level {level}")]
    EmptyStimulus { variant: Variant, level: u32 },

    #[error("invalid {variant} configuration: {reason}")]
    InvalidConfig { variant: Variant, reason: String },

    #[error("session cannot start from {state:?}")]
    SessionNotIdle { state: GameState },
}

pub type Result<T> = std::result::Result<T, EngineError>;
