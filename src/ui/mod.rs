pub mod home;
pub mod tabs;

use ratatui::prelude::*;

use crate::app::{App, Tab};

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Min(0),    // Content
        ])
        .split(frame.area());

    tabs::render_tabs(frame, app, chunks[0]);

    match (app.current_tab, app.screen.as_ref()) {
        (Tab::Game(_), Some(screen)) => screen.render(frame, chunks[1]),
        _ => home::render_home(
            frame,
            chunks[1],
            app.selected_game,
            app.show_high_scores,
            &app.high_scores.borrow(),
            app.player.as_deref(),
        ),
    }
}
