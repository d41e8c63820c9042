pub mod binary_breaker;
pub mod memory_matrix;
pub mod pattern_pulse;
pub mod reaction_test;

use std::cell::RefCell;
use std::rc::Rc;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::*;
use tracing::error;

use crate::engine::{
    EndReason, GameSessionController, GameState, LifePolicy, MonotonicClock, Outcome,
    PlayerInput, SequenceGenerator, Variant,
};
use crate::scores::HighScores;

pub type ArcadeController = GameSessionController<MonotonicClock>;

/// Per-game keyboard mapping and drawing. Rules live in the engine.
pub trait GameView {
    fn input_for(&mut self, key: KeyEvent, ctl: &ArcadeController) -> Option<PlayerInput>;
    fn render(&self, frame: &mut Frame, area: Rect, ctl: &ArcadeController);
    fn help(&self) -> &'static str;
}

pub fn accent(variant: Variant) -> Color {
    match variant {
        Variant::MemorySequence => Color::Rgb(0, 255, 136),
        Variant::ReactionTiming => Color::Rgb(255, 170, 0),
        Variant::PatternPlayback => Color::Rgb(255, 68, 136),
        Variant::NumericConversion => Color::Rgb(68, 170, 255),
    }
}

pub struct GameScreen {
    pub controller: ArcadeController,
    view: Box<dyn GameView>,
    error: Option<String>,
}

impl GameScreen {
    pub fn new(variant: Variant, seed: Option<u64>, scores: Rc<RefCell<HighScores>>) -> Self {
        let best = scores.borrow().best(variant);
        let generator = match seed {
            Some(seed) => SequenceGenerator::seeded(seed),
            None => SequenceGenerator::from_entropy(),
        };
        let controller = GameSessionController::new(
            variant.config(),
            generator,
            MonotonicClock::new(),
            scores,
            best,
        );
        let view: Box<dyn GameView> = match variant {
            Variant::MemorySequence => Box::new(memory_matrix::MemoryMatrix::new()),
            Variant::ReactionTiming => Box::new(reaction_test::ReactionTest::new()),
            Variant::PatternPlayback => Box::new(pattern_pulse::PatternPulse::new()),
            Variant::NumericConversion => Box::new(binary_breaker::BinaryBreaker::new()),
        };
        Self { controller, view, error: None }
    }

    pub fn variant(&self) -> Variant {
        self.controller.config().variant
    }

    pub fn update(&mut self) {
        self.controller.update();
    }

    pub fn handle_input(&mut self, key: KeyEvent) {
        let state = self.controller.state();
        let restart_key = matches!(key.code, KeyCode::Char('r') | KeyCode::Char('R'));
        let start_key = matches!(key.code, KeyCode::Enter | KeyCode::Char(' '));

        let result = match state {
            GameState::Idle if start_key || restart_key => Some(self.controller.start()),
            GameState::Ended if start_key || restart_key => Some(self.controller.restart()),
            _ if restart_key => Some(self.controller.restart()),
            _ => None,
        };
        if let Some(result) = result {
            self.error = result.err().map(|e| {
                error!(error = %e, "session could not start");
                e.to_string()
            });
            return;
        }

        if let Some(input) = self.view.input_for(key, &self.controller) {
            self.controller.submit_input(input);
        }
    }

    /// Ends the session on the way out so its score is submitted.
    pub fn leave(&mut self) {
        self.controller.quit();
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let variant = self.variant();
        let color = accent(variant);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(color))
            .title(format!(" {} ", variant.name()))
            .title_style(Style::default().fg(color).add_modifier(Modifier::BOLD));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // HUD
                Constraint::Length(1), // Timer gauge
                Constraint::Min(5),    // Field
                Constraint::Length(1), // Status / help
            ])
            .split(inner);

        self.render_hud(frame, chunks[0]);
        self.render_timer(frame, chunks[1]);

        match self.controller.state() {
            GameState::Idle => render_banner(
                frame,
                chunks[2],
                vec![
                    Line::from(Span::styled(
                        variant.name().to_uppercase(),
                        Style::default().fg(color).add_modifier(Modifier::BOLD),
                    )),
                    Line::from(""),
                    Line::from(Span::styled(
                        format!("Difficulty: {}", variant.difficulty_label()),
                        Style::default().fg(Color::Rgb(140, 140, 160)),
                    )),
                    Line::from(""),
                    Line::from(Span::styled(
                        "Press ENTER to start",
                        Style::default().fg(Color::Rgb(255, 220, 80)).add_modifier(Modifier::BOLD),
                    )),
                ],
            ),
            GameState::Priming => {
                let secs = self.controller.countdown_ms().unwrap_or(0).div_ceil(1_000);
                let label = if secs == 0 { "GO!".to_string() } else { secs.to_string() };
                render_banner(
                    frame,
                    chunks[2],
                    vec![
                        Line::from(Span::styled("Get ready", Style::default().fg(Color::Rgb(140, 140, 160)))),
                        Line::from(""),
                        Line::from(Span::styled(
                            label,
                            Style::default().fg(color).add_modifier(Modifier::BOLD),
                        )),
                    ],
                );
            }
            GameState::Active | GameState::RoundTransition => {
                self.view.render(frame, chunks[2], &self.controller);
            }
            GameState::Ended => self.render_game_over(frame, chunks[2]),
        }

        self.render_status(frame, chunks[3]);
    }

    fn render_hud(&self, frame: &mut Frame, area: Rect) {
        let session = self.controller.session();
        let label = Style::default().fg(Color::Rgb(100, 100, 130));
        let value = Style::default().fg(Color::Rgb(230, 230, 240)).add_modifier(Modifier::BOLD);
        let mut spans = vec![
            Span::styled(" Score ", label),
            Span::styled(session.score.to_string(), value),
            Span::styled("  Level ", label),
            Span::styled(session.level.to_string(), value),
        ];
        if let LifePolicy::Lives(_) = self.controller.config().lives() {
            spans.push(Span::styled("  Lives ", label));
            spans.push(Span::styled(
                "♥".repeat(session.lives_remaining as usize),
                Style::default().fg(Color::Rgb(255, 80, 100)),
            ));
        }
        spans.push(Span::styled("  Best ", label));
        spans.push(Span::styled(self.controller.high_score().to_string(), value));
        if self.controller.beats_high_score() {
            spans.push(Span::styled(
                "  NEW BEST!",
                Style::default().fg(Color::Rgb(255, 215, 0)).add_modifier(Modifier::BOLD),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_timer(&self, frame: &mut Frame, area: Rect) {
        let Some(round) = self.controller.round() else { return };
        if self.controller.state() != GameState::Active || round.responding_since.is_none() {
            return;
        }
        let remaining = self.controller.countdown_ms().unwrap_or(0);
        let limit = round.time_limit_ms.max(1);
        let ratio = (remaining as f64 / limit as f64).clamp(0.0, 1.0);
        let color = if ratio > 0.5 {
            Color::Rgb(80, 220, 120)
        } else if ratio > 0.2 {
            Color::Rgb(255, 200, 60)
        } else {
            Color::Rgb(255, 80, 80)
        };
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(color).bg(Color::Rgb(30, 30, 40)))
            .ratio(ratio)
            .label(format!("{:.1}s", remaining as f64 / 1_000.0));
        frame.render_widget(gauge, area);
    }

    fn render_game_over(&self, frame: &mut Frame, area: Rect) {
        let session = self.controller.session();
        let reason = match session.end_reason {
            Some(EndReason::OutOfLives) => "Out of lives",
            Some(EndReason::Mistake) => "Wrong answer",
            Some(EndReason::TimedOut) => "Time's up",
            Some(EndReason::Quit) => "Session abandoned",
            Some(EndReason::Fault) => "Something went wrong",
            None => "",
        };
        let mut lines = vec![
            Line::from(Span::styled(
                "GAME OVER",
                Style::default().fg(Color::Rgb(255, 80, 80)).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(reason, Style::default().fg(Color::Rgb(140, 140, 160)))),
            Line::from(""),
            Line::from(Span::styled(
                format!("Final score: {}   Level reached: {}", session.score, session.level),
                Style::default().fg(Color::Rgb(255, 215, 0)).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                format!("Rounds won: {}", session.rounds_won),
                Style::default().fg(Color::Rgb(140, 140, 160)),
            )),
        ];
        if self.controller.beats_high_score() {
            lines.push(Line::from(Span::styled(
                "🏆 New personal best!",
                Style::default().fg(Color::Rgb(255, 220, 80)),
            )));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "ENTER play again  │  Esc menu",
            Style::default().fg(Color::DarkGray),
        )));
        render_banner(frame, area, lines);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let line = if let Some(err) = &self.error {
            Line::from(Span::styled(format!(" ⚠ {}", err), Style::default().fg(Color::Rgb(255, 80, 80))))
        } else if self.controller.state() == GameState::RoundTransition {
            match self.controller.last_result() {
                Some(r) if r.outcome == Outcome::Correct => Line::from(Span::styled(
                    format!(" ✔ +{} ", r.score_delta),
                    Style::default().fg(Color::Rgb(80, 220, 120)).add_modifier(Modifier::BOLD),
                )),
                Some(r) if r.timed_out => Line::from(Span::styled(
                    " ✖ Too slow ",
                    Style::default().fg(Color::Rgb(255, 80, 80)).add_modifier(Modifier::BOLD),
                )),
                _ => Line::from(Span::styled(
                    " ✖ Miss ",
                    Style::default().fg(Color::Rgb(255, 80, 80)).add_modifier(Modifier::BOLD),
                )),
            }
        } else {
            Line::from(Span::styled(
                format!(" {} │ R Restart │ Esc Menu", self.view.help()),
                Style::default().fg(Color::DarkGray),
            ))
        };
        frame.render_widget(Paragraph::new(line), area);
    }
}

/// Centered block of lines.
pub fn render_banner(frame: &mut Frame, area: Rect, lines: Vec<Line>) {
    let height = lines.len() as u16;
    let top = area.y + area.height.saturating_sub(height) / 2;
    let banner_area = Rect::new(area.x, top, area.width, height.min(area.height));
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), banner_area);
}
