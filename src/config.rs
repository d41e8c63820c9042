use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::scores::HighScores;

#[derive(Parser, Debug)]
#[clap(
    name = "neural-arcade",
    about = "Reflex and memory mini-games for the terminal",
    version
)]
pub struct Args {
    /// Seed for stimulus generation (random when omitted)
    #[clap(long)]
    pub seed: Option<u64>,

    /// Score file location
    #[clap(long)]
    pub scores: Option<PathBuf>,

    /// UI tick interval in milliseconds
    #[clap(long, default_value = "16")]
    pub tick_ms: u64,

    /// Log level, overridden by RUST_LOG
    #[clap(long, default_value = "info")]
    pub log_level: String,

    /// Log file; the terminal is busy drawing the arcade
    #[clap(long)]
    pub log_file: Option<PathBuf>,

    /// Player name shown in the header
    #[clap(long)]
    pub player: Option<String>,
}

impl Args {
    pub fn scores_path(&self) -> PathBuf {
        self.scores.clone().unwrap_or_else(HighScores::default_path)
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| self.scores_path().with_extension("log"))
    }

    pub fn tick_ms(&self) -> u64 {
        self.tick_ms.clamp(1, 1_000)
    }
}

/// Sends `tracing` output to the log file.
pub fn init_logging(args: &Args) -> anyhow::Result<()> {
    let path = args.log_path();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(&args.log_level),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::parse_from(["neural-arcade"]);
        assert_eq!(args.tick_ms(), 16);
        assert_eq!(args.log_level, "info");
        assert!(args.seed.is_none());
        assert!(args.player.is_none());
    }

    #[test]
    fn log_file_sits_beside_scores() {
        let args = Args::parse_from(["neural-arcade", "--scores", "/tmp/arcade/best.scores"]);
        assert_eq!(args.log_path(), PathBuf::from("/tmp/arcade/best.log"));

        let args = Args::parse_from(["neural-arcade", "--log-file", "/var/log/na.log"]);
        assert_eq!(args.log_path(), PathBuf::from("/var/log/na.log"));
    }

    #[test]
    fn flags_parse() {
        let args = Args::parse_from([
            "neural-arcade",
            "--seed",
            "7",
            "--tick-ms",
            "0",
            "--player",
            "ADA",
        ]);
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.tick_ms(), 1);
        assert_eq!(args.player.as_deref(), Some("ADA"));
    }
}
