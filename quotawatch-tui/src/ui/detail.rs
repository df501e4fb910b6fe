//! User detail overlay rendering.
//!
//! A centered popup over the Users view with the selected user's quota
//! state and recent request history.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use quotawatch_types::RequestRecord;

use crate::app::App;
use crate::data::{classify, duration::format_duration};

/// Sparkline characters (8 levels of height).
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Render the detail overlay for the currently selected user.
pub fn render_overlay(frame: &mut Frame, app: &App) {
    let area = frame.area();
    if area.width < 44 || area.height < 14 {
        return;
    }

    let Some(user) = app.selected_user() else {
        return;
    };

    let width = (area.width.saturating_sub(8)).min(64);
    let height = (area.height.saturating_sub(4)).min(18);
    let popup = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };

    let health = classify(user, &app.thresholds);
    let health_style = app.theme.health_style(health);

    let mut lines: Vec<Line> = Vec::new();

    let spark = render_sparkline(&app.history.requests_sparkline(&user.user_id));
    lines.push(Line::from(vec![
        Span::styled(" Requests  ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(format!("{:<6}", user.requests), health_style),
        Span::styled(spark, Style::default().fg(app.theme.highlight)),
    ]));

    lines.push(Line::from(vec![
        Span::styled(" Decision  ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(format!("{} {}", health.symbol(), user.ai_allowed.label()), health_style),
    ]));

    let ttl = if user.ttl_seconds <= 0 {
        "-".to_string()
    } else {
        format_duration(user.ttl())
    };
    lines.push(Line::from(vec![
        Span::styled(" Resets in ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(ttl),
    ]));

    let rate = match app.history.request_rate(&user.user_id) {
        Some(rate) => format!("{:.0}/min", rate * 60.0),
        None => "n/a".to_string(),
    };
    lines.push(Line::from(vec![
        Span::styled(" Rate      ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(rate),
    ]));

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " Recent requests",
        Style::default().add_modifier(Modifier::BOLD),
    )));

    // Newest first; the wire order of the history is not guaranteed.
    let mut recent: Vec<&RequestRecord> = user.last_requests.iter().collect();
    recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let visible = (height as usize).saturating_sub(10).max(1);
    if recent.is_empty() {
        lines.push(Line::from(Span::styled(
            "  (none recorded)",
            Style::default().add_modifier(Modifier::DIM),
        )));
    } else {
        let endpoint_w = (width as usize).saturating_sub(24).max(8);
        for record in recent.iter().take(visible) {
            let time = record
                .timestamp
                .with_timezone(&chrono::Local)
                .format("%H:%M:%S")
                .to_string();
            let decision_style = if record.ai_allowed.is_allowed() {
                Style::default().fg(app.theme.allowed)
            } else {
                Style::default().fg(app.theme.blocked)
            };
            lines.push(Line::from(vec![
                Span::styled(format!("  {}  ", time), Style::default().add_modifier(Modifier::DIM)),
                Span::raw(format!(
                    "{:<width$}",
                    truncate(&record.endpoint, endpoint_w),
                    width = endpoint_w
                )),
                Span::styled(format!("  {}", record.ai_allowed.label()), decision_style),
            ]));
        }
        if recent.len() > visible {
            lines.push(Line::from(Span::styled(
                format!("  … and {} more", recent.len() - visible),
                Style::default().add_modifier(Modifier::DIM),
            )));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " Esc/Backspace: close",
        Style::default().add_modifier(Modifier::DIM),
    )));

    let block = Block::default()
        .title(format!(" User: {} ", user.user_id))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

/// Render sparkline levels as a string of bar characters.
fn render_sparkline(levels: &[u8]) -> String {
    levels
        .iter()
        .map(|&level| SPARKLINE_CHARS[(level as usize).min(7)])
        .collect()
}

/// Truncate a string, appending an ellipsis when it was cut.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
