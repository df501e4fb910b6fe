//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, View};
use crate::data::{classify, UserHealth};

/// Sparkline characters (8 levels of height).
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Render the header bar with gateway-wide quota state.
///
/// Displays: status indicator, user counts by health, total request volume.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let Some(ref data) = app.data else {
        let line = Line::from(vec![
            Span::styled(
                " QUOTAWATCH ",
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("| Loading..."),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    };

    // Count users by health
    let mut healthy = 0;
    let mut near = 0;
    let mut blocked = 0;

    for user in &data.users {
        match classify(user, &app.thresholds) {
            UserHealth::Healthy => healthy += 1,
            UserHealth::NearLimit => near += 1,
            UserHealth::Blocked => blocked += 1,
        }
    }

    let total = data.users.len();
    let total_requests: u64 = data.users.iter().map(|u| u.requests).sum();

    // Overall status indicator
    let (status_icon, status_style) = if blocked > 0 {
        ("●", app.theme.health_style(UserHealth::Blocked))
    } else if near > 0 {
        ("●", app.theme.health_style(UserHealth::NearLimit))
    } else {
        ("●", app.theme.health_style(UserHealth::Healthy))
    };

    let mut spans = vec![
        Span::styled(format!(" {} ", status_icon), status_style),
        Span::styled("QUOTAWATCH ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::styled(
            format!("{}", healthy),
            Style::default().fg(app.theme.allowed),
        ),
        Span::raw(" ok "),
        if near > 0 {
            Span::styled(format!("{}", near), Style::default().fg(app.theme.warning))
        } else {
            Span::styled("0", Style::default().add_modifier(Modifier::DIM))
        },
        Span::raw(" near "),
        if blocked > 0 {
            Span::styled(
                format!("{}", blocked),
                Style::default().fg(app.theme.blocked).add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled("0", Style::default().add_modifier(Modifier::DIM))
        },
        Span::raw(" blocked │ "),
        Span::styled(
            format!("{}", total),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" users │ "),
        Span::raw(format!("R:{}", format_count(total_requests))),
    ];

    // Gateway-wide request trend; dropped on narrow terminals
    if area.width >= 80 {
        let trend: String = app
            .history
            .total_sparkline()
            .iter()
            .rev()
            .take(12)
            .rev()
            .map(|&level| SPARKLINE_CHARS[(level as usize).min(7)])
            .collect();
        if !trend.is_empty() {
            spans.push(Span::styled(
                format!(" {}", trend),
                Style::default().fg(app.theme.highlight),
            ));
        }
    }

    spans.push(Span::styled(
        format!(" │ {}", app.source_description()),
        Style::default().add_modifier(Modifier::DIM),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Format a count for display (e.g., 1234 -> "1.2K", 1234567 -> "1.2M").
fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

/// Render the tab bar showing available views.
///
/// Highlights the currently active view.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = vec![
        Line::from(" 1:Users "),
        Line::from(" 2:Traffic "),
        Line::from(" 3:Activity "),
    ];

    let selected = match app.current_view {
        View::Overview => 0,
        View::Traffic => 1,
        View::Activity => 2,
    };

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// Shows: current view, time since last update, available controls.
/// Also displays temporary status messages and errors.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    // Check for temporary status message first
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let status = if let Some(ref data) = app.data {
        let elapsed = data.last_updated.elapsed();

        // Context-sensitive controls
        let controls = match app.current_view {
            View::Overview => {
                if app.filter_active {
                    "Type to search | Enter:apply Esc:cancel"
                } else {
                    "/:search s:sort S:reverse Tab:switch Enter:detail ?:help q:quit"
                }
            }
            View::Traffic => "↑↓:select g:bucket width Tab:switch ?:help q:quit",
            View::Activity => {
                if app.filter_active {
                    "Type to search | Enter:apply Esc:cancel"
                } else {
                    "/:search Tab:switch ?:help q:quit"
                }
            }
        };

        format!(
            " {} | Updated {:.1}s ago | {}",
            app.current_view.label(),
            elapsed.as_secs_f64(),
            controls,
        )
    } else if let Some(ref err) = app.load_error {
        format!(" Error: {} | q:quit r:retry", err)
    } else {
        format!(" Connecting to {}... | q:quit", app.source_description())
    };

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));

    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Navigation",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  ←/→ h/l     Switch views"),
        Line::from("  ↑/↓ j/k     Navigate list"),
        Line::from("  PgUp/PgDn   Jump 10 items"),
        Line::from("  Home/End    Jump to first/last"),
        Line::from("  Enter       User detail"),
        Line::from("  Esc         Go back"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Users & Activity",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  /         Start filter/search"),
        Line::from("  c         Clear filter"),
        Line::from("  s         Cycle sort column"),
        Line::from("  S         Toggle sort direction"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Traffic",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  g         Cycle bucket width"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " General",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  r         Refresh now"),
        Line::from("  e         Export to JSON"),
        Line::from("  q         Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    // Center the help overlay - responsive to terminal size
    let help_width = 42u16.min(area.width.saturating_sub(4));
    let help_height = 28u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    // Clear the area behind the help
    frame.render_widget(ratatui::widgets::Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
