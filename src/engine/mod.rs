//! Shared session engine behind every arcade mini-game.
//!
//! A game is a [`VariantConfig`] record driven by one [`GameSessionController`].
//! Time comes from a [`Clock`](clock::Clock) through the
//! [`TimerService`](timer::TimerService), stimuli from the [`SequenceGenerator`],
//! and score changes from the variant's [`ScoringPolicy`](scoring::ScoringPolicy).

pub mod clock;
pub mod controller;
pub mod scoring;
pub mod sequence;
pub mod timer;
pub mod variant;

pub use clock::MonotonicClock;
pub use controller::GameSessionController;
pub use scoring::Outcome;
pub use sequence::SequenceGenerator;
pub use variant::{LifePolicy, StimulusShape};

use variant::VariantConfig;

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Variant {
    MemorySequence,
    ReactionTiming,
    PatternPlayback,
    NumericConversion,
}

impl Variant {
    pub fn all() -> &'static [Variant] {
        &[
            Variant::MemorySequence,
            Variant::ReactionTiming,
            Variant::PatternPlayback,
            Variant::NumericConversion,
        ]
    }

    /// Stable identifier used when submitting scores.
    pub fn id(&self) -> &'static str {
        match self {
            Variant::MemorySequence => "memory-matrix",
            Variant::ReactionTiming => "reaction-test",
            Variant::PatternPlayback => "pattern-pulse",
            Variant::NumericConversion => "binary-breaker",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Variant::MemorySequence => "Memory Matrix",
            Variant::ReactionTiming => "Reaction Test",
            Variant::PatternPlayback => "Pattern Pulse",
            Variant::NumericConversion => "Binary Breaker",
        }
    }

    pub fn difficulty_label(&self) -> &'static str {
        match self {
            Variant::MemorySequence => "Medium",
            Variant::ReactionTiming => "Easy",
            Variant::PatternPlayback => "Hard",
            Variant::NumericConversion => "Expert",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Variant::MemorySequence => 0,
            Variant::ReactionTiming => 1,
            Variant::PatternPlayback => 2,
            Variant::NumericConversion => 3,
        }
    }

    pub fn config(&self) -> VariantConfig {
        VariantConfig::for_variant(*self)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameState {
    Idle,
    Priming,
    Active,
    RoundTransition,
    Ended,
}

impl GameState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GameState::Ended)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndReason {
    OutOfLives,
    Mistake,
    TimedOut,
    Quit,
    /// The stimulus could not be built mid-session.
    Fault,
}

/// Summary of an ended session handed to the score boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FinishedPlay {
    pub variant: Variant,
    pub score: u32,
    pub level: u32,
    pub duration_ms: u64,
}

/// Where a finished session's score goes. Called once per ended session;
/// failures are the implementor's to handle.
pub trait ScoreSubmitter {
    fn submit_score(&mut self, variant: Variant, score: u32);

    /// Richer hook for stores that also keep play history.
    fn submit_play(&mut self, play: &FinishedPlay) {
        self.submit_score(play.variant, play.score);
    }
}

/// One element of a stimulus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Element {
    /// Index into a square grid, row-major.
    Cell(usize),
    /// One of the coloured tone pads.
    Pad(usize),
    /// A decimal value to be converted.
    Decimal(u32),
    /// Delay between the round starting and the go signal.
    GoDelay(u64),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stimulus {
    pub elements: Vec<Element>,
    pub presented_at: u64,
    pub reveal_duration_ms: u64,
}

impl Stimulus {
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The decimal target of a conversion round.
    pub fn decimal(&self) -> Option<u32> {
        self.elements.iter().find_map(|e| match e {
            Element::Decimal(v) => Some(*v),
            _ => None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlayerInput {
    Cell(usize),
    Pad(usize),
    Press,
    Digits(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameSession {
    pub variant: Variant,
    pub state: GameState,
    pub level: u32,
    pub score: u32,
    pub lives_remaining: u32,
    pub started_at: Option<u64>,
    pub ended_at: Option<u64>,
    pub end_reason: Option<EndReason>,
    pub rounds_won: u32,
}

impl GameSession {
    pub fn new(config: &VariantConfig) -> Self {
        Self {
            variant: config.variant,
            state: GameState::Idle,
            level: 1,
            score: 0,
            lives_remaining: config.lives().initial_lives(),
            started_at: None,
            ended_at: None,
            end_reason: None,
            rounds_won: 0,
        }
    }

    /// Play time in milliseconds, up to `now` while still running.
    pub fn duration_ms(&self, now: u64) -> u64 {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => end.saturating_sub(start),
            (Some(start), None) => now.saturating_sub(start),
            _ => 0,
        }
    }
}
