use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::AppState;

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let narrow = area.width < crate::app::NARROW_WIDTH_THRESHOLD;

    let hints: &[(&str, &str)] = if state.has_overlay() {
        &[("j/k", "scroll"), ("G", "follow"), ("q", "close")]
    } else if narrow {
        &[
            ("hjkl", "nav"),
            ("s/x/r/d", "actions"),
            ("⏎", "log"),
            ("q", "quit"),
        ]
    } else {
        &[
            ("←→↑↓/hjkl", "navigate"),
            ("s", "start"),
            ("x", "stop"),
            ("r", "reset"),
            ("d", "delete"),
            ("⏎", "log"),
            ("i", "init log"),
            ("o", "live"),
            ("m", "mail"),
            ("f", "refresh"),
            ("q", "quit"),
        ]
    };

    let mut spans: Vec<Span> = Vec::new();
    for (i, (key, desc)) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(*key, Style::default().fg(Color::Cyan)));
        spans.push(Span::styled(
            format!(" {desc}"),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let para = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::TOP));
    f.render_widget(para, area);
}
