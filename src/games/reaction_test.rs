use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;

use crate::engine::controller::RoundPhase;
use crate::engine::{GameState, Outcome, PlayerInput};
use crate::games::{render_banner, ArcadeController, GameView};

pub struct ReactionTest;

impl ReactionTest {
    pub fn new() -> Self {
        Self
    }
}

impl GameView for ReactionTest {
    fn input_for(&mut self, key: KeyEvent, _ctl: &ArcadeController) -> Option<PlayerInput> {
        match key.code {
            KeyCode::Char(' ') | KeyCode::Enter => Some(PlayerInput::Press),
            _ => None,
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect, ctl: &ArcadeController) {
        let mut lines = Vec::new();

        if ctl.state() == GameState::RoundTransition {
            if let Some(result) = ctl.last_result() {
                let (text, color) = if result.false_start {
                    ("Too early!".to_string(), Color::Rgb(255, 80, 80))
                } else if result.timed_out {
                    ("Too slow!".to_string(), Color::Rgb(255, 80, 80))
                } else if result.outcome == Outcome::Correct {
                    (format!("{} ms", result.elapsed_ms), Color::Rgb(80, 220, 120))
                } else {
                    ("Miss".to_string(), Color::Rgb(255, 80, 80))
                };
                lines.push(Line::from(Span::styled(
                    text,
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                )));
            }
            render_banner(frame, area, lines);
            return;
        }

        let Some(round) = ctl.round() else { return };
        let (label, color) = match round.phase {
            RoundPhase::AwaitingSignal => ("● WAIT ●", Color::Rgb(220, 50, 50)),
            RoundPhase::Responding => ("▶ PRESS! ◀", Color::Rgb(0, 255, 136)),
            _ => ("", Color::DarkGray),
        };
        let bar = "█".repeat((area.width as usize).saturating_sub(8).min(40));
        lines.push(Line::from(Span::styled(bar.clone(), Style::default().fg(color))));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            label,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(bar, Style::default().fg(color))));
        if round.phase == RoundPhase::AwaitingSignal {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Pressing before green ends the run",
                Style::default().fg(Color::Rgb(140, 140, 160)),
            )));
        }
        render_banner(frame, area, lines);
    }

    fn help(&self) -> &'static str {
        "Space React"
    }
}
