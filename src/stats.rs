use std::fmt;

use crate::engine::Variant;

/// Score at which a single play earns the full 100 XP.
pub const DEFAULT_MAX_SCORE: u32 = 200;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rank {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Legend,
}

impl Rank {
    pub fn for_xp(xp: u32) -> Rank {
        match xp {
            5_000.. => Rank::Legend,
            3_000.. => Rank::Platinum,
            1_500.. => Rank::Gold,
            500.. => Rank::Silver,
            _ => Rank::Bronze,
        }
    }

    /// XP still needed to reach the next rank, if there is one.
    pub fn xp_to_next(xp: u32) -> Option<u32> {
        let next = match Rank::for_xp(xp) {
            Rank::Bronze => 500,
            Rank::Silver => 1_500,
            Rank::Gold => 3_000,
            Rank::Platinum => 5_000,
            Rank::Legend => return None,
        };
        Some(next - xp)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Rank::Bronze => "Bronze",
            Rank::Silver => "Silver",
            Rank::Gold => "Gold",
            Rank::Platinum => "Platinum",
            Rank::Legend => "Legend",
        };
        f.write_str(name)
    }
}

/// 0..=100 XP, proportional to how close `score` gets to `max_score`.
pub fn xp_from_score(score: u32, max_score: u32) -> u32 {
    if max_score == 0 {
        return 0;
    }
    let capped = u64::from(score.min(max_score));
    (capped * 100).div_ceil(u64::from(max_score)) as u32
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayRecord {
    pub variant: Variant,
    pub score: u32,
    pub duration_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameStats {
    pub variant: Variant,
    pub total_plays: usize,
    pub highest: u32,
    pub average: u32,
    pub lowest: u32,
    pub total_time_ms: u64,
    /// Shortest play that took any time at all.
    pub best_time_ms: Option<u64>,
}

/// Running totals for one game. Never trimmed, unlike the play history.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GameTotals {
    pub plays: u32,
    pub score_sum: u64,
    pub highest: u32,
    pub lowest: u32,
    pub time_ms: u64,
    /// 0 until a play with a nonzero duration is recorded.
    pub best_time_ms: u64,
}

impl GameTotals {
    pub fn add(&mut self, play: &PlayRecord) {
        self.lowest = if self.plays == 0 {
            play.score
        } else {
            self.lowest.min(play.score)
        };
        self.plays = self.plays.saturating_add(1);
        self.score_sum = self.score_sum.saturating_add(u64::from(play.score));
        self.highest = self.highest.max(play.score);
        self.time_ms = self.time_ms.saturating_add(play.duration_ms);
        if play.duration_ms > 0 && (self.best_time_ms == 0 || play.duration_ms < self.best_time_ms) {
            self.best_time_ms = play.duration_ms;
        }
    }

    pub fn stats(&self, variant: Variant) -> Option<GameStats> {
        if self.plays == 0 {
            return None;
        }
        let count = u64::from(self.plays);
        Some(GameStats {
            variant,
            total_plays: self.plays as usize,
            highest: self.highest,
            average: ((self.score_sum + count / 2) / count) as u32,
            lowest: self.lowest,
            total_time_ms: self.time_ms,
            best_time_ms: (self.best_time_ms > 0).then_some(self.best_time_ms),
        })
    }
}

pub fn play_xp(play: &PlayRecord) -> u32 {
    xp_from_score(play.score, DEFAULT_MAX_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(variant: Variant, score: u32, duration_ms: u64) -> PlayRecord {
        PlayRecord { variant, score, duration_ms }
    }

    #[test]
    fn rank_thresholds() {
        assert_eq!(Rank::for_xp(0), Rank::Bronze);
        assert_eq!(Rank::for_xp(499), Rank::Bronze);
        assert_eq!(Rank::for_xp(500), Rank::Silver);
        assert_eq!(Rank::for_xp(1_500), Rank::Gold);
        assert_eq!(Rank::for_xp(2_999), Rank::Gold);
        assert_eq!(Rank::for_xp(3_000), Rank::Platinum);
        assert_eq!(Rank::for_xp(5_000), Rank::Legend);
        assert_eq!(Rank::xp_to_next(450), Some(50));
        assert_eq!(Rank::xp_to_next(9_000), None);
    }

    #[test]
    fn xp_is_capped_and_rounded_up() {
        assert_eq!(xp_from_score(0, 200), 0);
        assert_eq!(xp_from_score(1, 200), 1);
        assert_eq!(xp_from_score(100, 200), 50);
        assert_eq!(xp_from_score(200, 200), 100);
        assert_eq!(xp_from_score(5_000, 200), 100);
        assert_eq!(xp_from_score(10, 0), 0);
    }

    #[test]
    fn totals_summarise_every_play() {
        let mut totals = GameTotals::default();
        assert!(totals.stats(Variant::ReactionTiming).is_none());
        for p in [
            play(Variant::ReactionTiming, 90, 4_000),
            play(Variant::ReactionTiming, 31, 0),
            play(Variant::ReactionTiming, 40, 2_500),
        ] {
            totals.add(&p);
        }
        let stats = totals.stats(Variant::ReactionTiming).unwrap();
        assert_eq!(stats.total_plays, 3);
        assert_eq!(stats.highest, 90);
        assert_eq!(stats.lowest, 31);
        assert_eq!(stats.average, 54);
        assert_eq!(stats.total_time_ms, 6_500);
        assert_eq!(stats.best_time_ms, Some(2_500));
    }

    #[test]
    fn zero_score_is_the_lowest() {
        let mut totals = GameTotals::default();
        totals.add(&play(Variant::MemorySequence, 0, 0));
        totals.add(&play(Variant::MemorySequence, 50, 0));
        let stats = totals.stats(Variant::MemorySequence).unwrap();
        assert_eq!(stats.lowest, 0);
        assert_eq!(stats.average, 25);
        assert_eq!(stats.best_time_ms, None);
    }

    #[test]
    fn play_xp_uses_the_default_ceiling() {
        assert_eq!(play_xp(&play(Variant::MemorySequence, 200, 0)), 100);
        assert_eq!(play_xp(&play(Variant::PatternPlayback, 100, 0)), 50);
    }
}
