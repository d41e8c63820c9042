use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;

use crate::engine::PlayerInput;
use crate::games::{render_banner, ArcadeController, GameView};

/// Longest answer the buffer accepts.
const MAX_DIGITS: usize = 16;

pub struct BinaryBreaker {
    buffer: String,
    /// `presented_at` of the round the buffer belongs to.
    round_mark: Option<u64>,
}

impl BinaryBreaker {
    pub fn new() -> Self {
        Self { buffer: String::new(), round_mark: None }
    }

    fn sync_round(&mut self, ctl: &ArcadeController) {
        let mark = ctl.round().map(|r| r.stimulus.presented_at);
        if mark != self.round_mark {
            self.buffer.clear();
            self.round_mark = mark;
        }
    }

    fn edit(&mut self, code: KeyCode) -> Option<PlayerInput> {
        match code {
            KeyCode::Char(c @ ('0' | '1')) if self.buffer.len() < MAX_DIGITS => {
                self.buffer.push(c);
                None
            }
            KeyCode::Backspace => {
                self.buffer.pop();
                None
            }
            KeyCode::Enter if !self.buffer.is_empty() => {
                Some(PlayerInput::Digits(std::mem::take(&mut self.buffer)))
            }
            _ => None,
        }
    }
}

impl GameView for BinaryBreaker {
    fn input_for(&mut self, key: KeyEvent, ctl: &ArcadeController) -> Option<PlayerInput> {
        self.sync_round(ctl);
        self.edit(key.code)
    }

    fn render(&self, frame: &mut Frame, area: Rect, ctl: &ArcadeController) {
        let Some(round) = ctl.round() else { return };
        let Some(value) = round.stimulus.decimal() else { return };
        let bits = ctl.config().decimal_bits(round.level);

        // Typed digits from an earlier round are stale until the next key.
        let typed = if self.round_mark == Some(round.stimulus.presented_at) {
            self.buffer.as_str()
        } else {
            ""
        };

        let lines = vec![
            Line::from(Span::styled(
                "Convert to binary",
                Style::default().fg(Color::Rgb(140, 140, 160)),
            )),
            Line::from(""),
            Line::from(Span::styled(
                value.to_string(),
                Style::default()
                    .fg(Color::Rgb(68, 170, 255))
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                format!("{} bits", bits),
                Style::default().fg(Color::Rgb(100, 100, 130)),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled("> ", Style::default().fg(Color::Rgb(100, 100, 130))),
                Span::styled(
                    typed.to_string(),
                    Style::default()
                        .fg(Color::Rgb(230, 230, 240))
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled("_", Style::default().fg(Color::Rgb(68, 170, 255))),
            ]),
        ];
        render_banner(frame, area, lines);
    }

    fn help(&self) -> &'static str {
        "0/1 Type │ Backspace Erase │ Enter Submit"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_accepts_only_bits() {
        let mut view = BinaryBreaker::new();
        assert_eq!(view.edit(KeyCode::Char('1')), None);
        assert_eq!(view.edit(KeyCode::Char('2')), None);
        assert_eq!(view.edit(KeyCode::Char('0')), None);
        assert_eq!(view.edit(KeyCode::Char('1')), None);
        assert_eq!(view.edit(KeyCode::Backspace), None);
        assert_eq!(view.edit(KeyCode::Enter), Some(PlayerInput::Digits("10".into())));
        assert!(view.buffer.is_empty());
    }

    #[test]
    fn empty_answer_is_not_submitted() {
        let mut view = BinaryBreaker::new();
        assert_eq!(view.edit(KeyCode::Enter), None);
    }

    #[test]
    fn buffer_is_bounded() {
        let mut view = BinaryBreaker::new();
        for _ in 0..(MAX_DIGITS + 4) {
            view.edit(KeyCode::Char('1'));
        }
        assert_eq!(view.buffer.len(), MAX_DIGITS);
    }
}
