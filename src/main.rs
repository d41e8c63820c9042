mod app;
mod config;
mod engine;
mod error;
mod event;
mod games;
mod scores;
mod stats;
mod ui;

use std::io;

use anyhow::Context;
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::info;

use app::App;
use config::Args;
use event::{Event, EventHandler};
use scores::HighScores;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    config::init_logging(&args)?;

    let scores_path = args.scores_path();
    let high_scores = HighScores::load(&scores_path);
    info!(scores = %scores_path.display(), seed = ?args.seed, "neural arcade starting");

    // Setup terminal
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut app = App::new(high_scores, args.seed, args.player.clone());
    let events = EventHandler::new(args.tick_ms());
    let result = run(&mut terminal, &mut app, &events);

    // Restore terminal even when the loop failed
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("neural arcade stopped");
    result
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> anyhow::Result<()> {
    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        match events.next()? {
            Event::Tick | Event::Resize => app.on_tick(),
            Event::Key(key) => app.on_key(key),
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
