use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::engine::controller::RoundPhase;
use crate::engine::{Element, PlayerInput, StimulusShape};
use crate::games::{ArcadeController, GameView};

const FLASH_MS: u64 = 180;

const PADS: [(&str, Color, Color); 4] = [
    ("1", Color::Rgb(255, 70, 70), Color::Rgb(80, 25, 25)),
    ("2", Color::Rgb(70, 160, 255), Color::Rgb(25, 50, 85)),
    ("3", Color::Rgb(80, 230, 110), Color::Rgb(25, 75, 35)),
    ("4", Color::Rgb(255, 220, 60), Color::Rgb(85, 75, 20)),
];

pub struct PatternPulse {
    /// Pad pressed most recently and when, for the press flash.
    last_press: Option<(usize, u64)>,
}

impl PatternPulse {
    pub fn new() -> Self {
        Self { last_press: None }
    }

    fn pad_for(key: KeyCode) -> Option<usize> {
        match key {
            KeyCode::Char('1') | KeyCode::Up => Some(0),
            KeyCode::Char('2') | KeyCode::Right => Some(1),
            KeyCode::Char('3') | KeyCode::Down => Some(2),
            KeyCode::Char('4') | KeyCode::Left => Some(3),
            _ => None,
        }
    }

    fn lit_pad(&self, ctl: &ArcadeController) -> Option<usize> {
        let round = ctl.round()?;
        if round.phase == RoundPhase::Revealing {
            let idx = ctl.playback_index()?;
            // Dark gap at the end of each step so repeated pads read as two flashes.
            let step = ctl.config().step_duration_ms(ctl.session().level);
            let into_step = ctl
                .now_ms()
                .saturating_sub(round.stimulus.presented_at)
                .checked_rem(step)
                .unwrap_or(0);
            if into_step > step * 3 / 4 {
                return None;
            }
            return match round.stimulus.elements.get(idx) {
                Some(Element::Pad(pad)) => Some(*pad),
                _ => None,
            };
        }
        let (pad, at) = self.last_press?;
        (ctl.now_ms().saturating_sub(at) < FLASH_MS).then_some(pad)
    }
}

impl GameView for PatternPulse {
    fn input_for(&mut self, key: KeyEvent, ctl: &ArcadeController) -> Option<PlayerInput> {
        let pad = Self::pad_for(key.code)?;
        let count = match ctl.config().stimulus {
            StimulusShape::Pads { count, .. } => count,
            _ => PADS.len(),
        };
        if pad >= count {
            return None;
        }
        self.last_press = Some((pad, ctl.now_ms()));
        Some(PlayerInput::Pad(pad))
    }

    fn render(&self, frame: &mut Frame, area: Rect, ctl: &ArcadeController) {
        let Some(round) = ctl.round() else { return };
        let lit = self.lit_pad(ctl);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Min(3)])
            .split(area);

        let caption = if round.phase == RoundPhase::Revealing {
            Line::from(Span::styled(
                "Watch the pattern…",
                Style::default().fg(Color::Rgb(255, 220, 80)),
            ))
        } else {
            Line::from(Span::styled(
                format!("Repeat it: {}/{}", round.matched.len(), round.stimulus.len()),
                Style::default().fg(Color::Rgb(140, 140, 160)),
            ))
        };
        frame.render_widget(Paragraph::new(caption).alignment(Alignment::Center), chunks[0]);

        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 4); 4])
            .split(chunks[1]);

        for (i, (label, bright, dim)) in PADS.iter().enumerate() {
            let on = lit == Some(i);
            let color = if on { *bright } else { *dim };
            let block = Block::default()
                .borders(Borders::ALL)
                .border_type(if on { BorderType::Thick } else { BorderType::Rounded })
                .border_style(Style::default().fg(color));
            let body = Paragraph::new(Line::from(Span::styled(
                *label,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )))
            .alignment(Alignment::Center)
            .style(Style::default().bg(if on { *dim } else { Color::Reset }))
            .block(block);
            frame.render_widget(body, cols[i]);
        }
    }

    fn help(&self) -> &'static str {
        "1-4 / ↑→↓← Pads"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_keys_and_arrows_share_pads() {
        assert_eq!(PatternPulse::pad_for(KeyCode::Char('1')), Some(0));
        assert_eq!(PatternPulse::pad_for(KeyCode::Up), Some(0));
        assert_eq!(PatternPulse::pad_for(KeyCode::Left), Some(3));
        assert_eq!(PatternPulse::pad_for(KeyCode::Char('5')), None);
    }
}
