use super::variant::LifePolicy;
use super::GameSession;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
}

/// Extra points for answering quickly. Never negative.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpeedBonus {
    /// One point per `ms_per_point` faster than `par_ms`.
    Against { par_ms: u64, ms_per_point: u64 },
    /// One point per `ms_per_point` left on the round timer.
    Remaining { ms_per_point: u64 },
}

impl SpeedBonus {
    fn points(&self, timing: RoundTiming) -> u32 {
        let (spare, per_point) = match *self {
            SpeedBonus::Against { par_ms, ms_per_point } => {
                (par_ms.saturating_sub(timing.elapsed_ms), ms_per_point)
            }
            SpeedBonus::Remaining { ms_per_point } => {
                (timing.limit_ms.saturating_sub(timing.elapsed_ms), ms_per_point)
            }
        };
        (spare / per_point.max(1)).min(u64::from(u32::MAX)) as u32
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct RoundTiming {
    pub elapsed_ms: u64,
    pub limit_ms: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScoreUpdate {
    pub score_delta: u32,
    pub next_level: u32,
    pub lives_delta: i32,
    pub ends_session: bool,
}

/// Maps one round outcome to the changes it makes to a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScoringPolicy {
    pub points_per_level: u32,
    pub speed_bonus: Option<SpeedBonus>,
    pub lives: LifePolicy,
}

impl ScoringPolicy {
    pub fn new(points_per_level: u32, speed_bonus: Option<SpeedBonus>, lives: LifePolicy) -> Self {
        Self {
            points_per_level: points_per_level.max(1),
            speed_bonus,
            lives,
        }
    }

    pub fn apply(
        &self,
        outcome: Outcome,
        timing: RoundTiming,
        level: u32,
        session: &GameSession,
    ) -> ScoreUpdate {
        let level = level.max(1);
        match outcome {
            Outcome::Correct => {
                let bonus = self.speed_bonus.map_or(0, |b| b.points(timing));
                ScoreUpdate {
                    score_delta: self.points_per_level.saturating_mul(level).saturating_add(bonus),
                    next_level: level.saturating_add(1),
                    lives_delta: 0,
                    ends_session: false,
                }
            }
            Outcome::Incorrect => match self.lives {
                LifePolicy::Lives(_) => ScoreUpdate {
                    score_delta: 0,
                    next_level: level,
                    lives_delta: -1,
                    ends_session: session.lives_remaining <= 1,
                },
                LifePolicy::SingleMistake => ScoreUpdate {
                    score_delta: 0,
                    next_level: level,
                    lives_delta: 0,
                    ends_session: true,
                },
            },
        }
    }
}
