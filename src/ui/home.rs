use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::engine::Variant;
use crate::games::accent;
use crate::scores::HighScores;
use crate::stats::Rank;

const BANNER: &str = r#"
 ╔══════════════════════════════════════════════════════════════════╗
 ║  ███╗   ██╗███████╗██╗   ██╗██████╗  █████╗ ██╗                  ║
 ║  ████╗  ██║██╔════╝██║   ██║██╔══██╗██╔══██╗██║      ▄▀▄ █▀▄ ▄▀▀ ║
 ║  ██╔██╗ ██║█████╗  ██║   ██║██████╔╝███████║██║      █▀█ █▀▄ ▀▄▄ ║
 ║  ██║╚██╗██║██╔══╝  ██║   ██║██╔══██╗██╔══██║██║      ▄▀▄ █▀▄ █▀▀ ║
 ║  ██║ ╚████║███████╗╚██████╔╝██║  ██║██║  ██║███████╗ █▀█ █▄▀ ██▄ ║
 ║  ╚═╝  ╚═══╝╚══════╝ ╚═════╝ ╚═╝  ╚═╝╚═╝  ╚═╝╚══════╝             ║
 ╚══════════════════════════════════════════════════════════════════╝"#;

const KEY: Color = Color::Rgb(80, 200, 255);
const DIM: Color = Color::Rgb(140, 140, 140);

struct GameTile {
    icon: &'static str,
    desc: &'static str,
}

fn tile(variant: Variant) -> GameTile {
    match variant {
        Variant::MemorySequence => GameTile { icon: "🧠", desc: "Remember the\nlit cells" },
        Variant::ReactionTiming => GameTile { icon: "⚡", desc: "Wait for green,\nthen press!" },
        Variant::PatternPlayback => GameTile { icon: "🎵", desc: "Repeat the\npad sequence" },
        Variant::NumericConversion => GameTile { icon: "💾", desc: "Decimal to\nbinary, fast" },
    }
}

fn key_line(key: &'static str, what: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("    {:<17}", key), Style::default().fg(KEY)),
        Span::styled(what, Style::default().fg(DIM)),
    ])
}

fn render_game_tile(frame: &mut Frame, area: Rect, variant: Variant, best: u32, selected: bool) {
    let tile = tile(variant);
    let color = accent(variant);
    let border_color = if selected { Color::Rgb(255, 220, 80) } else { color };
    let border_type = if selected { BorderType::Double } else { BorderType::Rounded };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(Style::default().fg(border_color));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height == 0 || inner.width == 0 { return; }

    let name_color = if selected { Color::Rgb(255, 255, 255) } else { color };
    let mut lines = vec![Line::from(vec![
        Span::styled(
            format!("[{}] ", variant.index() + 1),
            Style::default().fg(Color::Rgb(255, 220, 80)).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("{} ", tile.icon), Style::default()),
        Span::styled(variant.name(), Style::default().fg(name_color).add_modifier(Modifier::BOLD)),
    ])];

    let desc_color = if selected { Color::Rgb(180, 180, 200) } else { Color::Rgb(120, 120, 140) };
    for desc_line in tile.desc.split('\n') {
        lines.push(Line::from(Span::styled(desc_line, Style::default().fg(desc_color))));
    }
    lines.push(Line::from(vec![
        Span::styled(variant.difficulty_label(), Style::default().fg(Color::Rgb(100, 100, 130))),
        Span::styled(format!("  Best {}", best), Style::default().fg(Color::Rgb(255, 215, 0))),
    ]));

    if selected {
        lines.push(Line::from(Span::styled(
            "▶ Enter to play",
            Style::default().fg(Color::Rgb(255, 220, 80)).add_modifier(Modifier::BOLD),
        )));
    }

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

fn game_controls(variant: Variant) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from("")];
    match variant {
        Variant::MemorySequence => {
            lines.push(Line::from(Span::styled("  Cells light up, then go dark. Pick them all.", Style::default().fg(Color::Rgb(100, 100, 120)))));
            lines.push(Line::from(""));
            lines.push(key_line("↑ ↓ ← →", "Move cursor"));
            lines.push(key_line("Space / Enter", "Select cell"));
            lines.push(Line::from(""));
            lines.push(key_line("3 lives", "Misses and timeouts cost one"));
        }
        Variant::ReactionTiming => {
            lines.push(Line::from(Span::styled("  Press the moment the screen turns green.", Style::default().fg(Color::Rgb(100, 100, 120)))));
            lines.push(Line::from(""));
            lines.push(key_line("Space / Enter", "React"));
            lines.push(Line::from(""));
            lines.push(key_line("1 mistake", "Early or late ends the run"));
        }
        Variant::PatternPlayback => {
            lines.push(Line::from(Span::styled("  Watch the pads flash, then play them back.", Style::default().fg(Color::Rgb(100, 100, 120)))));
            lines.push(Line::from(""));
            lines.push(key_line("1 2 3 4", "Press pad"));
            lines.push(key_line("↑ → ↓ ←", "Press pad"));
            lines.push(Line::from(""));
            lines.push(key_line("3 lives", "Misses and timeouts cost one"));
        }
        Variant::NumericConversion => {
            lines.push(Line::from(Span::styled("  Type the binary form of the number shown.", Style::default().fg(Color::Rgb(100, 100, 120)))));
            lines.push(Line::from(""));
            lines.push(key_line("0 / 1", "Type digit"));
            lines.push(key_line("Backspace", "Erase"));
            lines.push(key_line("Enter", "Submit answer"));
            lines.push(Line::from(""));
            lines.push(key_line("1 mistake", "Wrong or late ends the run"));
        }
    }
    lines
}

pub fn render_home(
    frame: &mut Frame,
    area: Rect,
    selected_game: usize,
    show_high_scores: bool,
    high_scores: &HighScores,
    player: Option<&str>,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(10), // Banner
            Constraint::Length(2),  // Subtitle
            Constraint::Length(9),  // Game tiles
            Constraint::Min(8),     // Controls area
            Constraint::Length(2),  // Footer
        ])
        .split(area);

    let banner = Paragraph::new(BANNER)
        .style(Style::default().fg(Color::Rgb(0, 255, 136)))
        .alignment(Alignment::Center);
    frame.render_widget(banner, chunks[0]);

    let subtitle = Paragraph::new(Line::from(Span::styled(
        "  ⚡ Train your reflexes and memory ⚡  ",
        Style::default()
            .fg(Color::Rgb(255, 220, 80))
            .add_modifier(Modifier::BOLD | Modifier::ITALIC),
    )))
    .alignment(Alignment::Center);
    frame.render_widget(subtitle, chunks[1]);

    let games_block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Rgb(60, 150, 200)))
        .title(" 🎮 Games — ←→ Select, Enter to Play ")
        .title_style(Style::default().fg(Color::Rgb(200, 120, 255)).add_modifier(Modifier::BOLD));
    let games_inner = games_block.inner(chunks[2]);
    frame.render_widget(games_block, chunks[2]);

    let variants = Variant::all();
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Ratio(1, variants.len() as u32); variants.len()])
        .split(games_inner);
    for (i, variant) in variants.iter().enumerate() {
        render_game_tile(frame, cols[i], *variant, high_scores.best(*variant), selected_game == i);
    }

    let ctrl_cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[3]);

    let controls = Paragraph::new(vec![
        Line::from(""),
        key_line("Tab / Shift+Tab", "Switch tabs"),
        key_line("1-4", "Launch game"),
        key_line("← →", "Select game"),
        key_line("Enter", "Play selected"),
        key_line("R", "Restart game"),
        key_line("Esc", "Return to Home"),
        key_line("H", "High scores"),
        key_line("q / Ctrl+C", "Quit"),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Rgb(60, 150, 200)))
            .title(" ⌨ Navigation Control ")
            .title_style(Style::default().fg(Color::Rgb(200, 120, 255)).add_modifier(Modifier::BOLD)),
    );
    frame.render_widget(controls, ctrl_cols[0]);

    let selected = variants.get(selected_game).copied().unwrap_or(Variant::MemorySequence);
    let game_ctrl = Paragraph::new(game_controls(selected)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Rgb(50, 100, 140)))
            .title(format!(" 🎮 {} Control ", selected.name()))
            .title_style(Style::default().fg(accent(selected)).add_modifier(Modifier::BOLD)),
    );
    frame.render_widget(game_ctrl, ctrl_cols[1]);

    let xp = high_scores.total_xp();
    let mut footer = vec![
        Span::styled("  🦀 ", Style::default().fg(Color::Rgb(255, 100, 50))),
        Span::styled(
            concat!("v", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Rgb(80, 80, 100)),
        ),
        Span::styled("  │  ", Style::default().fg(Color::Rgb(40, 40, 60))),
    ];
    if let Some(name) = player {
        footer.push(Span::styled(
            format!("{}  ", name),
            Style::default().fg(Color::Rgb(230, 230, 240)).add_modifier(Modifier::BOLD),
        ));
    }
    footer.push(Span::styled(
        format!("{} · {} XP", Rank::for_xp(xp), xp),
        Style::default().fg(Color::Rgb(200, 120, 255)),
    ));
    footer.push(Span::styled("  │  ", Style::default().fg(Color::Rgb(40, 40, 60))));
    footer.push(Span::styled("H", Style::default().fg(Color::Rgb(255, 220, 80)).add_modifier(Modifier::BOLD)));
    footer.push(Span::styled(" High Scores", Style::default().fg(Color::Rgb(100, 100, 130))));
    frame.render_widget(Paragraph::new(Line::from(footer)).alignment(Alignment::Center), chunks[4]);

    if show_high_scores {
        render_high_scores_overlay(frame, area, high_scores);
    }
}

fn format_duration(ms: u64) -> String {
    let secs = ms / 1_000;
    if secs >= 60 {
        format!("{}m{:02}s", secs / 60, secs % 60)
    } else {
        format!("{}.{}s", secs, (ms % 1_000) / 100)
    }
}

fn render_high_scores_overlay(frame: &mut Frame, area: Rect, high_scores: &HighScores) {
    let overlay_w = 56u16.min(area.width.saturating_sub(4));
    let overlay_h = 26u16.min(area.height.saturating_sub(4));
    let x = area.x + (area.width.saturating_sub(overlay_w)) / 2;
    let y = area.y + (area.height.saturating_sub(overlay_h)) / 2;
    let overlay_area = Rect::new(x, y, overlay_w, overlay_h);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(Color::Rgb(255, 200, 80)))
        .title(" 🏆 High Scores ")
        .title_style(Style::default().fg(Color::Rgb(255, 220, 80)).add_modifier(Modifier::BOLD))
        .style(Style::default().bg(Color::Rgb(15, 15, 25)));
    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    let label = Style::default().fg(Color::Rgb(100, 100, 130));
    let value = Style::default().fg(Color::Rgb(200, 200, 220));
    let mut lines: Vec<Line> = vec![Line::from("")];

    for variant in Variant::all() {
        lines.push(Line::from(vec![
            Span::styled(format!("  {} ", tile(*variant).icon), Style::default()),
            Span::styled(variant.name(), Style::default().fg(accent(*variant)).add_modifier(Modifier::BOLD)),
            Span::styled("   best ", label),
            Span::styled(
                high_scores.best(*variant).to_string(),
                Style::default().fg(Color::Rgb(255, 215, 0)).add_modifier(Modifier::BOLD),
            ),
        ]));

        match high_scores.stats(*variant) {
            Some(stats) => {
                lines.push(Line::from(vec![
                    Span::styled("    plays ", label),
                    Span::styled(stats.total_plays.to_string(), value),
                    Span::styled("  avg ", label),
                    Span::styled(stats.average.to_string(), value),
                    Span::styled("  low ", label),
                    Span::styled(stats.lowest.to_string(), value),
                ]));
                lines.push(Line::from(vec![
                    Span::styled("    played ", label),
                    Span::styled(format_duration(stats.total_time_ms), value),
                    Span::styled("  shortest ", label),
                    Span::styled(
                        stats.best_time_ms.map(format_duration).unwrap_or_else(|| "-".into()),
                        value,
                    ),
                ]));
                if let Some(last) = high_scores.last_play(*variant) {
                    lines.push(Line::from(vec![
                        Span::styled("    last ", label),
                        Span::styled(last.score.to_string(), value),
                    ]));
                }
            }
            None => lines.push(Line::from(Span::styled(
                "    No scores yet",
                Style::default().fg(Color::Rgb(60, 60, 80)),
            ))),
        }
        lines.push(Line::from(""));
    }

    let xp = high_scores.total_xp();
    let rank = Rank::for_xp(xp);
    let mut rank_line = vec![
        Span::styled("  Rank ", label),
        Span::styled(
            rank.to_string(),
            Style::default().fg(Color::Rgb(200, 120, 255)).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  {} XP", xp), value),
    ];
    if let Some(need) = Rank::xp_to_next(xp) {
        rank_line.push(Span::styled(format!("  ({} to next)", need), label));
    }
    lines.push(Line::from(rank_line));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("  Press ", Style::default().fg(Color::Rgb(80, 80, 100))),
        Span::styled("H", Style::default().fg(Color::Rgb(255, 220, 80)).add_modifier(Modifier::BOLD)),
        Span::styled(" to close", Style::default().fg(Color::Rgb(80, 80, 100))),
    ]));

    let p = Paragraph::new(lines).style(Style::default().bg(Color::Rgb(15, 15, 25)));
    frame.render_widget(p, inner);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_read_naturally() {
        assert_eq!(format_duration(4_250), "4.2s");
        assert_eq!(format_duration(59_999), "59.9s");
        assert_eq!(format_duration(125_000), "2m05s");
    }
}
