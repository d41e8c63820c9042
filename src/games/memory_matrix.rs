use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::engine::clock::Clock;
use crate::engine::controller::RoundPhase;
use crate::engine::{Element, GameSessionController, PlayerInput};
use crate::games::{ArcadeController, GameView};

const CELL_WIDTH: usize = 6;

pub struct MemoryMatrix {
    cursor: usize,
}

impl MemoryMatrix {
    pub fn new() -> Self {
        Self { cursor: 0 }
    }

    /// Grid of the round on screen, which can lag the session level.
    fn side<C: Clock>(ctl: &GameSessionController<C>) -> usize {
        let level = ctl.round().map_or(ctl.session().level, |r| r.level);
        ctl.config().grid_side(level).max(1)
    }

    fn move_cursor(&mut self, side: usize, dx: isize, dy: isize) {
        let x = (self.cursor % side) as isize;
        let y = (self.cursor / side) as isize;
        let nx = (x + dx).rem_euclid(side as isize) as usize;
        let ny = (y + dy).rem_euclid(side as isize) as usize;
        self.cursor = ny * side + nx;
    }
}

impl GameView for MemoryMatrix {
    fn input_for(&mut self, key: KeyEvent, ctl: &ArcadeController) -> Option<PlayerInput> {
        let side = Self::side(ctl);
        // The grid grows with the level.
        if self.cursor >= side * side {
            self.cursor = 0;
        }
        match key.code {
            KeyCode::Left | KeyCode::Char('a') => self.move_cursor(side, -1, 0),
            KeyCode::Right | KeyCode::Char('d') => self.move_cursor(side, 1, 0),
            KeyCode::Up | KeyCode::Char('w') => self.move_cursor(side, 0, -1),
            KeyCode::Down | KeyCode::Char('s') => self.move_cursor(side, 0, 1),
            KeyCode::Char(' ') | KeyCode::Enter => return Some(PlayerInput::Cell(self.cursor)),
            _ => {}
        }
        None
    }

    fn render(&self, frame: &mut Frame, area: Rect, ctl: &ArcadeController) {
        let Some(round) = ctl.round() else { return };
        let side = Self::side(ctl);
        let revealing = round.phase == RoundPhase::Revealing;

        let mut lines = Vec::with_capacity(side * 2 + 2);
        let caption = if revealing {
            Span::styled("Memorize the lit cells", Style::default().fg(Color::Rgb(255, 220, 80)))
        } else {
            Span::styled(
                format!("Recall them: {}/{}", round.matched.len(), round.stimulus.len()),
                Style::default().fg(Color::Rgb(140, 140, 160)),
            )
        };
        lines.push(Line::from(caption));
        lines.push(Line::from(""));

        for y in 0..side {
            let mut spans = Vec::with_capacity(side);
            for x in 0..side {
                let idx = y * side + x;
                let in_stimulus = round.stimulus.elements.contains(&Element::Cell(idx));
                let matched = round.matched.contains(&Element::Cell(idx));
                let color = if revealing && in_stimulus {
                    Color::Rgb(0, 255, 136)
                } else if matched {
                    Color::Rgb(0, 150, 90)
                } else {
                    Color::Rgb(45, 45, 60)
                };
                let cursor = !revealing && idx == self.cursor;
                let text = if cursor { "[████]" } else { " ████ " };
                let mut style = Style::default().fg(color);
                if cursor {
                    style = style.add_modifier(Modifier::BOLD);
                }
                spans.push(Span::styled(text, style));
            }
            lines.push(Line::from(spans.clone()));
            lines.push(Line::from(spans));
        }

        let width = (side * CELL_WIDTH) as u16;
        let height = lines.len() as u16;
        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + area.height.saturating_sub(height) / 2;
        let grid_area = Rect::new(x, y, width.min(area.width), height.min(area.height));
        frame.render_widget(Paragraph::new(lines), grid_area);
    }

    fn help(&self) -> &'static str {
        "←↑↓→ Move │ Space Select"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::clock::ManualClock;
    use crate::engine::{GameState, ScoreSubmitter, SequenceGenerator, Variant};

    struct Discard;

    impl ScoreSubmitter for Discard {
        fn submit_score(&mut self, _: Variant, _: u32) {}
    }

    fn win_round(ctl: &mut GameSessionController<ManualClock>, clock: &ManualClock) {
        while ctl.round().map(|r| r.phase) != Some(RoundPhase::Responding)
            || ctl.state() != GameState::Active
        {
            clock.advance(50);
            ctl.update();
        }
        let cells: Vec<Element> = ctl.round().unwrap().stimulus.elements.clone();
        for cell in cells {
            if let Element::Cell(c) = cell {
                ctl.submit_input(PlayerInput::Cell(c));
            }
        }
    }

    #[test]
    fn grid_stays_the_round_size_between_rounds() {
        let clock = ManualClock::new();
        let mut ctl = GameSessionController::new(
            Variant::MemorySequence.config(),
            SequenceGenerator::seeded(3),
            clock.clone(),
            Discard,
            0,
        );
        ctl.start().unwrap();
        win_round(&mut ctl, &clock);
        win_round(&mut ctl, &clock);

        assert_eq!(ctl.state(), GameState::RoundTransition);
        assert_eq!(ctl.session().level, 3);
        assert_eq!(ctl.config().grid_side(3), 4);
        assert_eq!(MemoryMatrix::side(&ctl), 3);
    }

    #[test]
    fn cursor_wraps_around_the_grid() {
        let mut view = MemoryMatrix::new();
        view.move_cursor(3, -1, 0);
        assert_eq!(view.cursor, 2);
        view.move_cursor(3, 0, -1);
        assert_eq!(view.cursor, 8);
        view.move_cursor(3, 1, 1);
        assert_eq!(view.cursor, 0);
    }
}
