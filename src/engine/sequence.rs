use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, RngCore, SeedableRng};

use crate::error::{EngineError, Result};

use super::variant::{StimulusShape, VariantConfig};
use super::{Element, Stimulus};

/// Builds the stimulus for each round from a swappable random source.
pub struct SequenceGenerator {
    rng: Box<dyn RngCore>,
}

impl SequenceGenerator {
    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: impl RngCore + 'static) -> Self {
        Self { rng: Box::new(rng) }
    }

    pub fn next(&mut self, level: u32, config: &VariantConfig, now: u64) -> Result<Stimulus> {
        let length = config.stimulus_length(level);
        if length == 0 {
            return Err(EngineError::EmptyStimulus { variant: config.variant, level });
        }

        let elements = match config.stimulus {
            StimulusShape::Grid { .. } => {
                let side = config.grid_side(level);
                index::sample(&mut self.rng, side * side, length)
                    .into_iter()
                    .map(Element::Cell)
                    .collect()
            }
            StimulusShape::Pads { count, allow_repeats, .. } => {
                self.pad_sequence(count, length, allow_repeats)
            }
            StimulusShape::GoSignal { min_delay_ms, max_delay_ms } => {
                vec![Element::GoDelay(self.rng.gen_range(min_delay_ms..=max_delay_ms))]
            }
            StimulusShape::Decimal { .. } => {
                let bits = config.decimal_bits(level);
                let low = 1u32 << (bits - 1);
                let high = (1u32 << bits) - 1;
                vec![Element::Decimal(self.rng.gen_range(low..=high))]
            }
        };

        Ok(Stimulus {
            elements,
            presented_at: now,
            reveal_duration_ms: config.reveal_duration_ms(level),
        })
    }

    fn pad_sequence(&mut self, count: usize, length: usize, allow_repeats: bool) -> Vec<Element> {
        let mut pads: Vec<usize> = Vec::with_capacity(length);
        for _ in 0..length {
            let pad = match pads.last() {
                // Skip over the previous pad so the draw stays uniform.
                Some(&prev) if !allow_repeats && count > 1 => {
                    let pick = self.rng.gen_range(0..count - 1);
                    if pick >= prev { pick + 1 } else { pick }
                }
                _ => self.rng.gen_range(0..count),
            };
            pads.push(pad);
        }
        pads.into_iter().map(Element::Pad).collect()
    }
}
