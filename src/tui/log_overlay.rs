use crate::app::{LogContent, LogKind, LogViewer};
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

pub fn render(f: &mut Frame, kind: LogKind, viewer: &LogViewer) {
    let area = f.area();

    // ~90% width, ~80% height, centered
    let width = (area.width * 9 / 10).max(area.width.min(20)).min(area.width);
    let height = (area.height * 8 / 10).max(6).min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let overlay_area = Rect::new(x, y, width, height);

    f.render_widget(Clear, overlay_area);

    let inner_height = height.saturating_sub(2) as usize;
    let scroll = viewer.display_scroll(inner_height);

    let total = viewer.line_count();
    let scroll_info = if total > inner_height {
        format!(
            " [{}-{}/{}]{} ",
            scroll + 1,
            (scroll + inner_height).min(total),
            total,
            if viewer.follow { " ⇣" } else { "" },
        )
    } else {
        String::new()
    };

    let title = format!(" {} - {} {}", kind.title(), viewer.build_name, scroll_info);
    let hints = " j/k scroll | G follow tail | q close ";

    let block = Block::default()
        .title(title)
        .title_bottom(Line::from(hints).centered())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::Black));

    let visible_lines: Vec<Line> = match &viewer.content {
        LogContent::Loading => vec![Line::from(Span::styled(
            format!("Loading {}…", kind.label()),
            Style::default().fg(Color::DarkGray),
        ))],
        LogContent::Error(msg) => vec![Line::from(Span::styled(
            msg.clone(),
            Style::default().fg(Color::Red),
        ))],
        LogContent::Text(lines) => lines
            .iter()
            .skip(scroll)
            .take(inner_height)
            .map(|l| Line::from(Span::raw(l.as_str())))
            .collect(),
    };

    let paragraph = Paragraph::new(visible_lines)
        .block(block)
        .wrap(Wrap { trim: false });

    f.render_widget(paragraph, overlay_area);
}
