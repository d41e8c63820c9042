use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::app::{App, Tab};
use crate::games::accent;

pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = Tab::all()
        .into_iter()
        .map(|t| {
            let base = match t {
                Tab::Home => Color::Rgb(120, 120, 140),
                Tab::Game(variant) => accent(variant),
            };
            let style = if t == app.current_tab {
                Style::default()
                    .fg(Color::Rgb(255, 220, 80))
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(base)
            };
            Line::from(Span::styled(t.title(), style))
        })
        .collect();

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Rgb(60, 150, 200)))
        .border_type(BorderType::Rounded)
        .title(" 🧠 Neural Arcade ")
        .title_style(
            Style::default()
                .fg(Color::Rgb(0, 255, 136))
                .add_modifier(Modifier::BOLD),
        );
    if let Some(name) = app.player.as_deref() {
        block = block.title(
            Line::from(Span::styled(
                format!(" {} ", name),
                Style::default().fg(Color::Rgb(230, 230, 240)),
            ))
            .right_aligned(),
        );
    }

    let tabs = Tabs::new(titles)
        .block(block)
        .select(app.current_tab.index())
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Rgb(255, 220, 80))
                .add_modifier(Modifier::BOLD),
        )
        .divider(Span::styled(" │ ", Style::default().fg(Color::Rgb(60, 60, 80))));

    frame.render_widget(tabs, area);
}
