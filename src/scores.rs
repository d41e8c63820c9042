use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::engine::{FinishedPlay, ScoreSubmitter, Variant};
use crate::stats::{play_xp, GameStats, GameTotals, PlayRecord};

const MAGIC: &[u8; 4] = b"NAS2";
/// Earlier layout: best scores and the history only.
const MAGIC_V1: &[u8; 4] = b"NAS1";
const NUM_GAMES: usize = 4;
// Each game: highest u32, plays u32, score sum u64, lowest u32, time u64, shortest u64
const TOTALS_SIZE: usize = 4 + 4 + 8 + 4 + 8 + 8;
const HEADER_SIZE: usize = 4 + NUM_GAMES * TOTALS_SIZE + 8 + 4;
const HEADER_SIZE_V1: usize = 4 + NUM_GAMES * 4 + 4;
// Each play: 1 byte game + 4 bytes score + 8 bytes duration
const PLAY_SIZE: usize = 1 + 4 + 8;
/// Oldest plays are dropped past this many.
pub const MAX_HISTORY: usize = 256;

/// Running totals per game, lifetime XP and a bounded history of recent
/// plays, kept in a small binary file. Best scores only ever go up.
pub struct HighScores {
    totals: [GameTotals; NUM_GAMES],
    xp: u64,
    plays: Vec<PlayRecord>,
    path: PathBuf,
}

impl HighScores {
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let mut hs = HighScores {
            totals: [GameTotals::default(); NUM_GAMES],
            xp: 0,
            plays: Vec::new(),
            path: path.into(),
        };
        hs.read_file();
        hs
    }

    /// Next to the executable, falling back to the working directory.
    pub fn default_path() -> PathBuf {
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                return dir.join("neural-arcade.scores");
            }
        }
        PathBuf::from("neural-arcade.scores")
    }

    fn read_file(&mut self) {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "could not read score file");
                return;
            }
        };
        if data.len() >= HEADER_SIZE && &data[0..4] == MAGIC {
            self.read_current(&data);
        } else if data.len() >= HEADER_SIZE_V1 && &data[0..4] == MAGIC_V1 {
            self.read_v1(&data);
            info!(path = %self.path.display(), "migrating score file");
        } else {
            warn!(path = %self.path.display(), "ignoring unrecognised score file");
            return;
        }
        debug!(plays = self.plays.len(), xp = self.xp, "score file loaded");
    }

    fn read_current(&mut self, data: &[u8]) {
        let mut offset = 4;
        for totals in self.totals.iter_mut() {
            *totals = GameTotals {
                highest: read_u32(data, offset),
                plays: read_u32(data, offset + 4),
                score_sum: read_u64(data, offset + 8),
                lowest: read_u32(data, offset + 16),
                time_ms: read_u64(data, offset + 20),
                best_time_ms: read_u64(data, offset + 28),
            };
            offset += TOTALS_SIZE;
        }
        self.xp = read_u64(data, offset);
        offset += 8;
        self.read_history(data, offset);
    }

    /// Rebuilds the totals from whatever history the old file kept.
    fn read_v1(&mut self, data: &[u8]) {
        let mut best = [0u32; NUM_GAMES];
        for (i, slot) in best.iter_mut().enumerate() {
            *slot = read_u32(data, 4 + i * 4);
        }
        self.read_history(data, 4 + NUM_GAMES * 4);
        for play in &self.plays {
            self.totals[play.variant.index()].add(play);
            self.xp += u64::from(play_xp(play));
        }
        for (totals, best) in self.totals.iter_mut().zip(best) {
            totals.highest = totals.highest.max(best);
        }
    }

    fn read_history(&mut self, data: &[u8], mut offset: usize) {
        let count = read_u32(data, offset) as usize;
        offset += 4;
        for _ in 0..count.min(MAX_HISTORY) {
            if offset + PLAY_SIZE > data.len() {
                break;
            }
            let game = data[offset] as usize;
            let score = read_u32(data, offset + 1);
            let duration_ms = read_u64(data, offset + 5);
            offset += PLAY_SIZE;
            if let Some(variant) = Variant::all().get(game) {
                self.plays.push(PlayRecord { variant: *variant, score, duration_ms });
            }
        }
    }

    fn write_file(&self) -> io::Result<()> {
        let mut buf = Vec::with_capacity(HEADER_SIZE + self.plays.len() * PLAY_SIZE);
        buf.extend_from_slice(MAGIC);
        for totals in &self.totals {
            buf.extend_from_slice(&totals.highest.to_le_bytes());
            buf.extend_from_slice(&totals.plays.to_le_bytes());
            buf.extend_from_slice(&totals.score_sum.to_le_bytes());
            buf.extend_from_slice(&totals.lowest.to_le_bytes());
            buf.extend_from_slice(&totals.time_ms.to_le_bytes());
            buf.extend_from_slice(&totals.best_time_ms.to_le_bytes());
        }
        buf.extend_from_slice(&self.xp.to_le_bytes());
        buf.extend_from_slice(&(self.plays.len() as u32).to_le_bytes());
        for play in &self.plays {
            buf.push(play.variant.index() as u8);
            buf.extend_from_slice(&play.score.to_le_bytes());
            buf.extend_from_slice(&play.duration_ms.to_le_bytes());
        }
        fs::write(&self.path, &buf)
    }

    pub fn best(&self, variant: Variant) -> u32 {
        self.totals[variant.index()].highest
    }

    pub fn stats(&self, variant: Variant) -> Option<GameStats> {
        self.totals[variant.index()].stats(variant)
    }

    /// Lifetime XP over every play ever recorded.
    pub fn total_xp(&self) -> u32 {
        u32::try_from(self.xp).unwrap_or(u32::MAX)
    }

    /// Most recent play of `variant` still in the history.
    pub fn last_play(&self, variant: Variant) -> Option<&PlayRecord> {
        self.plays.iter().rev().find(|p| p.variant == variant)
    }

    /// Records a finished play. Returns whether it set a new best; the
    /// in-memory state is updated even when the file cannot be written.
    pub fn record(&mut self, play: PlayRecord) -> (bool, io::Result<()>) {
        let totals = &mut self.totals[play.variant.index()];
        let new_best = play.score > totals.highest;
        totals.add(&play);
        self.xp = self.xp.saturating_add(u64::from(play_xp(&play)));

        self.plays.push(play);
        if self.plays.len() > MAX_HISTORY {
            let excess = self.plays.len() - MAX_HISTORY;
            self.plays.drain(..excess);
        }
        (new_best, self.write_file())
    }
}

impl ScoreSubmitter for Rc<RefCell<HighScores>> {
    fn submit_score(&mut self, variant: Variant, score: u32) {
        self.submit_play(&FinishedPlay { variant, score, level: 0, duration_ms: 0 });
    }

    fn submit_play(&mut self, play: &FinishedPlay) {
        let (new_best, written) = self.borrow_mut().record(PlayRecord {
            variant: play.variant,
            score: play.score,
            duration_ms: play.duration_ms,
        });
        match written {
            Ok(()) => info!(game = %play.variant, score = play.score, level = play.level, new_best, "score saved"),
            Err(e) => warn!(game = %play.variant, score = play.score, error = %e, "score not saved"),
        }
    }
}

fn read_u32(data: &[u8], at: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&data[at..at + 4]);
    u32::from_le_bytes(bytes)
}

fn read_u64(data: &[u8], at: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&data[at..at + 8]);
    u64::from_le_bytes(bytes)
}
