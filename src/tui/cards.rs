use crate::app::{AppState, Build, BuildAction, BuildStatus};
use chrono::{DateTime, Utc};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

pub const CARD_WIDTH: u16 = 34;
pub const CARD_HEIGHT: u16 = 7;

pub fn columns_for_width(width: u16) -> usize {
    (width / CARD_WIDTH).max(1) as usize
}

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    if state.builds.is_empty() {
        let msg = if state.is_loading {
            "Loading builds…"
        } else {
            "No builds found"
        };
        let para = Paragraph::new(msg)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::NONE));
        f.render_widget(para, area);
        return;
    }

    let columns = columns_for_width(area.width);
    let visible_rows = (area.height / CARD_HEIGHT).max(1) as usize;
    let cursor_row = state.cursor / columns;
    let row_offset = cursor_row.saturating_sub(visible_rows - 1);

    for (i, build) in state.builds.iter().enumerate() {
        let row = i / columns;
        let col = i % columns;
        if row < row_offset || row >= row_offset + visible_rows {
            continue;
        }
        let card_area = Rect {
            x: area.x + (col as u16) * CARD_WIDTH,
            y: area.y + ((row - row_offset) as u16) * CARD_HEIGHT,
            width: CARD_WIDTH.min(area.width.saturating_sub((col as u16) * CARD_WIDTH)),
            height: CARD_HEIGHT.min(area.height.saturating_sub(((row - row_offset) as u16) * CARD_HEIGHT)),
        };
        if card_area.width < 4 || card_area.height < 3 {
            continue;
        }
        render_card(f, card_area, build, i == state.cursor, i);
    }
}

fn render_card(f: &mut Frame, area: Rect, build: &Build, selected: bool, index: usize) {
    let color = status_color(build.status);
    let border_style = if selected {
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(color)
    };

    let title = if index < crate::app::QUICK_SELECT_MAX {
        format!(" {} ", index + 1)
    } else {
        String::new()
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let width = inner.width as usize;
    let lines = if build.name.is_empty() {
        vec![Line::from(Span::styled(
            "Build not found…",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        card_lines(build, selected, width)
    };

    f.render_widget(Paragraph::new(lines), inner);
}

fn card_lines(build: &Build, selected: bool, width: usize) -> Vec<Line<'static>> {
    let name_style = if selected {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };

    let mut lines = vec![Line::from(Span::styled(
        truncate(&build.name, width),
        name_style,
    ))];

    lines.push(Line::from(Span::styled(
        truncate(&commit_summary(build), width),
        Style::default().fg(Color::DarkGray),
    )));

    let mut status_spans = vec![Span::styled(
        build.status.label().to_string(),
        Style::default().fg(status_color(build.status)),
    )];
    if let Some(age) = build.created.map(format_age) {
        status_spans.push(Span::styled(
            format!("  {age}"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    lines.push(Line::from(status_spans));

    let links = link_labels(build);
    if links.is_empty() {
        lines.push(Line::raw(""));
    } else {
        lines.push(Line::from(Span::styled(
            links.join(" ⦙ "),
            Style::default().fg(Color::Blue),
        )));
    }

    lines.push(action_line(build.status));
    lines
}

fn commit_summary(build: &Build) -> String {
    let Some(ci) = &build.commit_info else {
        return String::new();
    };
    let mut out = format!("{}/{}", ci.repo, ci.target_branch);
    if let Some(pr) = ci.pr {
        out.push_str(&format!(" PR#{pr}"));
    }
    if let Some(commit) = &ci.git_commit {
        let short: String = commit.chars().take(8).collect();
        out.push_str(&format!(" ({short})"));
    }
    out
}

/// Which link indicators the card shows: the init log for any deployed
/// build, the deploy log and live/mail links only when started.
fn link_labels(build: &Build) -> Vec<&'static str> {
    let mut labels = Vec::new();
    if build.status == BuildStatus::Started {
        labels.push("log");
    }
    if build.status.is_deployed() {
        labels.push("init log");
    }
    if build.status == BuildStatus::Started {
        if build.deploy_link.is_some() {
            labels.push("live");
        }
        if build.deploy_link_mailhog.is_some() {
            labels.push("✉ mail");
        }
    }
    labels
}

fn action_line(status: BuildStatus) -> Line<'static> {
    let controls = [
        ("s", "start", BuildAction::Start),
        ("x", "stop", BuildAction::Stop),
        ("r", "reset", BuildAction::Reset),
        ("d", "delete", BuildAction::Delete),
    ];
    let mut spans = Vec::new();
    for (i, (key, label, action)) in controls.into_iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" "));
        }
        let style = if action.allowed_for(status) {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::DIM)
        };
        spans.push(Span::styled(format!("[{key}]{label}"), style));
    }
    Line::from(spans)
}

fn status_color(status: BuildStatus) -> Color {
    match status {
        BuildStatus::Undeployed => Color::DarkGray,
        BuildStatus::Stopped => Color::Cyan,
        BuildStatus::Started => Color::Green,
        BuildStatus::Failed => Color::Red,
        BuildStatus::Pending => Color::Yellow,
    }
}

fn format_age(created: DateTime<Utc>) -> String {
    let secs = Utc::now().signed_duration_since(created).num_seconds().max(0);
    if secs < 60 {
        "just now".to_string()
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86_400 {
        format!("{}h ago", secs / 3600)
    } else {
        format!("{}d ago", secs / 86_400)
    }
}

fn truncate(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        s.to_string()
    } else {
        let mut result = String::new();
        let mut width = 0;
        for c in s.chars() {
            let cw = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
            if width + cw + 1 > max_width {
                result.push('…');
                break;
            }
            result.push(c);
            width += cw;
        }
        result
    }
}
