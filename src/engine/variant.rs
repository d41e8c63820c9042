use crate::error::{EngineError, Result};

use super::scoring::{ScoringPolicy, SpeedBonus};
use super::{Element, PlayerInput, Stimulus, Variant};

/// No reveal is ever shorter than this, whatever the level.
pub const MIN_REVEAL_MS: u64 = 200;

const TRANSITION_MS: u64 = 600;
const ROUND_TICK_MS: u64 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifePolicy {
    Lives(u32),
    SingleMistake,
}

impl LifePolicy {
    pub fn initial_lives(&self) -> u32 {
        match self {
            LifePolicy::Lives(n) => *n,
            LifePolicy::SingleMistake => 0,
        }
    }
}

/// Linear per-level decrease with a floor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ramp {
    pub start_ms: u64,
    pub step_ms: u64,
    pub floor_ms: u64,
}

impl Ramp {
    pub const fn new(start_ms: u64, step_ms: u64, floor_ms: u64) -> Self {
        Self { start_ms, step_ms, floor_ms }
    }

    pub fn at(&self, level: u32) -> u64 {
        let steps = u64::from(level.max(1) - 1);
        self.start_ms
            .saturating_sub(self.step_ms.saturating_mul(steps))
            .max(self.floor_ms)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StimulusShape {
    /// Distinct cells lit on a square grid.
    Grid { base_length: usize, min_side: usize },
    /// Ordered presses over a fixed set of pads.
    Pads { count: usize, base_length: usize, allow_repeats: bool },
    /// A single go signal after a random delay.
    GoSignal { min_delay_ms: u64, max_delay_ms: u64 },
    /// A decimal with a level-bound bit length.
    Decimal { base_bits: u32, max_bits: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reveal {
    /// Stimulus stays visible while the player responds.
    None,
    /// Shown as a whole, then hidden.
    Whole(Ramp),
    /// Played back one element at a time.
    PerElement(Ramp),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Judgement {
    /// Not meaningful for this round; no state change.
    Ignored,
    /// Correct so far; the element joins the reproduced prefix.
    Progress(Element),
    Complete,
    Wrong,
}

/// Everything that distinguishes one mini-game from another.
#[derive(Clone, Debug, PartialEq)]
pub struct VariantConfig {
    pub variant: Variant,
    pub priming_ms: u64,
    pub priming_tick_ms: u64,
    pub transition_ms: u64,
    pub round_tick_ms: u64,
    pub stimulus: StimulusShape,
    pub reveal: Reveal,
    pub round_timeout: Ramp,
    pub scoring: ScoringPolicy,
}

impl VariantConfig {
    pub fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::MemorySequence => Self::memory_matrix(),
            Variant::ReactionTiming => Self::reaction_test(),
            Variant::PatternPlayback => Self::pattern_pulse(),
            Variant::NumericConversion => Self::binary_breaker(),
        }
    }

    pub fn memory_matrix() -> Self {
        Self {
            variant: Variant::MemorySequence,
            priming_ms: 1_000,
            priming_tick_ms: 1_000,
            transition_ms: TRANSITION_MS,
            round_tick_ms: ROUND_TICK_MS,
            stimulus: StimulusShape::Grid { base_length: 3, min_side: 3 },
            reveal: Reveal::Whole(Ramp::new(1_500, 100, MIN_REVEAL_MS)),
            round_timeout: Ramp::new(10_000, 500, 3_000),
            scoring: ScoringPolicy::new(10, None, LifePolicy::Lives(3)),
        }
    }

    pub fn reaction_test() -> Self {
        Self {
            variant: Variant::ReactionTiming,
            priming_ms: 3_000,
            priming_tick_ms: 1_000,
            transition_ms: TRANSITION_MS,
            round_tick_ms: ROUND_TICK_MS,
            stimulus: StimulusShape::GoSignal { min_delay_ms: 1_000, max_delay_ms: 3_000 },
            reveal: Reveal::None,
            round_timeout: Ramp::new(2_000, 100, 800),
            scoring: ScoringPolicy::new(
                10,
                Some(SpeedBonus::Against { par_ms: 1_000, ms_per_point: 10 }),
                LifePolicy::SingleMistake,
            ),
        }
    }

    pub fn pattern_pulse() -> Self {
        Self {
            variant: Variant::PatternPlayback,
            priming_ms: 1_000,
            priming_tick_ms: 1_000,
            transition_ms: TRANSITION_MS,
            round_tick_ms: ROUND_TICK_MS,
            stimulus: StimulusShape::Pads { count: 4, base_length: 3, allow_repeats: false },
            reveal: Reveal::PerElement(Ramp::new(600, 40, MIN_REVEAL_MS)),
            round_timeout: Ramp::new(8_000, 250, 3_000),
            scoring: ScoringPolicy::new(15, None, LifePolicy::Lives(3)),
        }
    }

    pub fn binary_breaker() -> Self {
        Self {
            variant: Variant::NumericConversion,
            priming_ms: 3_000,
            priming_tick_ms: 1_000,
            transition_ms: TRANSITION_MS,
            round_tick_ms: ROUND_TICK_MS,
            stimulus: StimulusShape::Decimal { base_bits: 2, max_bits: 16 },
            reveal: Reveal::None,
            round_timeout: Ramp::new(10_000, 1_000, 3_000),
            scoring: ScoringPolicy::new(
                20,
                Some(SpeedBonus::Remaining { ms_per_point: 100 }),
                LifePolicy::SingleMistake,
            ),
        }
    }

    pub fn lives(&self) -> LifePolicy {
        self.scoring.lives
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| EngineError::InvalidConfig {
            variant: self.variant,
            reason: reason.to_string(),
        };
        if matches!(self.lives(), LifePolicy::Lives(0)) {
            return Err(invalid("life-based variant needs at least one life"));
        }
        match self.stimulus {
            StimulusShape::Grid { min_side, .. } if min_side == 0 => {
                return Err(invalid("grid side must be positive"));
            }
            StimulusShape::Pads { count, allow_repeats, .. } => {
                if count == 0 || (!allow_repeats && count < 2) {
                    return Err(invalid("not enough pads for a non-repeating sequence"));
                }
            }
            StimulusShape::GoSignal { min_delay_ms, max_delay_ms } if min_delay_ms > max_delay_ms => {
                return Err(invalid("go signal delay range is inverted"));
            }
            StimulusShape::Decimal { base_bits, max_bits } => {
                if base_bits == 0 || base_bits > max_bits || max_bits > 31 {
                    return Err(invalid("decimal bit range must lie within 1..=31"));
                }
            }
            _ => {}
        }
        if self.stimulus_length(1) == 0 {
            return Err(EngineError::EmptyStimulus { variant: self.variant, level: 1 });
        }
        Ok(())
    }

    pub fn stimulus_length(&self, level: u32) -> usize {
        let grown = |base: usize| base + (level.max(1) as usize - 1);
        match self.stimulus {
            StimulusShape::Grid { base_length, .. } if base_length > 0 => grown(base_length),
            StimulusShape::Pads { base_length, .. } if base_length > 0 => grown(base_length),
            StimulusShape::Grid { .. } | StimulusShape::Pads { .. } => 0,
            StimulusShape::GoSignal { .. } | StimulusShape::Decimal { .. } => 1,
        }
    }

    /// Side of the memory grid: room for twice as many cells as lit ones.
    pub fn grid_side(&self, level: u32) -> usize {
        let min_side = match self.stimulus {
            StimulusShape::Grid { min_side, .. } => min_side,
            _ => return 0,
        };
        let cells = self.stimulus_length(level) * 2;
        let mut side = min_side;
        while side * side < cells {
            side += 1;
        }
        side
    }

    pub fn decimal_bits(&self, level: u32) -> u32 {
        match self.stimulus {
            StimulusShape::Decimal { base_bits, max_bits } => {
                base_bits.saturating_add(level.max(1) - 1).min(max_bits)
            }
            _ => 0,
        }
    }

    pub fn reveal_duration_ms(&self, level: u32) -> u64 {
        match self.reveal {
            Reveal::None => 0,
            Reveal::Whole(ramp) => ramp.at(level).max(MIN_REVEAL_MS),
            Reveal::PerElement(_) => self.step_duration_ms(level) * self.stimulus_length(level) as u64,
        }
    }

    /// Time each element is lit during playback.
    pub fn step_duration_ms(&self, level: u32) -> u64 {
        match self.reveal {
            Reveal::PerElement(ramp) => ramp.at(level).max(MIN_REVEAL_MS),
            _ => 0,
        }
    }

    pub fn round_timeout_ms(&self, level: u32) -> u64 {
        self.round_timeout.at(level)
    }

    /// Compares one input against the stimulus, given what has been
    /// reproduced so far this round.
    pub fn judge(&self, stimulus: &Stimulus, matched: &[Element], input: &PlayerInput) -> Judgement {
        match (self.stimulus, input) {
            (StimulusShape::Grid { .. }, PlayerInput::Cell(cell)) => {
                let element = Element::Cell(*cell);
                if matched.contains(&element) {
                    Judgement::Ignored
                } else if stimulus.elements.contains(&element) {
                    finish_or_progress(stimulus, matched, element)
                } else {
                    Judgement::Wrong
                }
            }
            (StimulusShape::Pads { .. }, PlayerInput::Pad(pad)) => {
                let element = Element::Pad(*pad);
                match stimulus.elements.get(matched.len()) {
                    Some(expected) if *expected == element => {
                        finish_or_progress(stimulus, matched, element)
                    }
                    Some(_) => Judgement::Wrong,
                    None => Judgement::Ignored,
                }
            }
            (StimulusShape::GoSignal { .. }, _) => Judgement::Complete,
            (StimulusShape::Decimal { .. }, PlayerInput::Digits(digits)) => {
                match stimulus.decimal() {
                    Some(value) if digits.trim() == format!("{value:b}") => Judgement::Complete,
                    Some(_) => Judgement::Wrong,
                    None => Judgement::Ignored,
                }
            }
            _ => Judgement::Ignored,
        }
    }
}

fn finish_or_progress(stimulus: &Stimulus, matched: &[Element], element: Element) -> Judgement {
    if matched.len() + 1 >= stimulus.len() {
        Judgement::Complete
    } else {
        Judgement::Progress(element)
    }
}
