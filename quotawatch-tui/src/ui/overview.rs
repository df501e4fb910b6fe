//! Users view rendering.
//!
//! Displays a table of every user the limiter is tracking, with request
//! counts, rates, remaining window TTL, sparkline trends, and the
//! gateway's admission decision.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use quotawatch_feed::UserRequests;
use quotawatch_types::UserStatus;

use crate::app::App;
use crate::data::duration::format_duration;
use crate::data::{classify, Thresholds, UserHealth};

/// Sparkline characters (8 levels of height).
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Column to sort by in the Users view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    /// Sort by user id alphabetically.
    #[default]
    Name,
    /// Sort by window request count.
    Requests,
    /// Sort by remaining window TTL.
    Ttl,
    /// Sort by admission state.
    Status,
}

impl SortColumn {
    /// Cycle to the next sort column.
    pub fn next(self) -> Self {
        match self {
            SortColumn::Name => SortColumn::Requests,
            SortColumn::Requests => SortColumn::Ttl,
            SortColumn::Ttl => SortColumn::Status,
            SortColumn::Status => SortColumn::Name,
        }
    }
}

/// Render the Users view: an admission summary strip over a sortable
/// table of every tracked user.
pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let Some(ref data) = app.data else {
        return;
    };

    let chunks = Layout::vertical([
        Constraint::Length(4), // Admission summary strip
        Constraint::Min(5),    // User table
    ])
    .split(area);

    render_summary(frame, app, chunks[0]);

    // Get filtered and sorted user indices
    let mut users: Vec<(usize, &UserStatus)> = data
        .users
        .iter()
        .enumerate()
        .filter(|(_, u)| app.matches_filter(&u.user_id))
        .collect();
    sort_users_by(&mut users, app.sort_column, app.sort_ascending, &app.thresholds);

    let header = Row::new(vec![
        Cell::from(format_header("User", SortColumn::Name, app)),
        Cell::from(format_header("Requests", SortColumn::Requests, app)),
        Cell::from(format_header("Rate", SortColumn::Requests, app)), // Rate uses same sort as Requests
        Cell::from(format_header("TTL", SortColumn::Ttl, app)),
        Cell::from("Trend"),
        Cell::from(format_header("Status", SortColumn::Status, app)),
    ])
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = users
        .iter()
        .map(|(_, u)| {
            let health = classify(u, &app.thresholds);
            let health_style = app.theme.health_style(health);

            // Requests cell turns yellow as a user approaches the ceiling
            let requests_style = match health {
                UserHealth::Healthy => Style::default(),
                UserHealth::NearLimit | UserHealth::Blocked => health_style,
            };

            // Remaining window TTL; "-" when no window is active
            let ttl = if u.ttl_seconds > 0 {
                format_duration(u.ttl())
            } else {
                "-".to_string()
            };

            let sparkline = render_sparkline(&app.history.requests_sparkline(&u.user_id));

            let rate = app
                .history
                .request_rate(&u.user_id)
                .map(|r| format!("{:.0}/min", r * 60.0))
                .unwrap_or_else(|| "-".to_string());

            Row::new(vec![
                Cell::from(u.user_id.clone()),
                Cell::from(format_count(u.requests)).style(requests_style),
                Cell::from(rate),
                Cell::from(ttl),
                Cell::from(sparkline),
                Cell::from(health.symbol()).style(health_style),
            ])
        })
        .collect();

    // Use Fill to distribute space evenly while respecting minimum widths
    let widths = [
        Constraint::Fill(3), // User - gets 3x share (largest)
        Constraint::Fill(1), // Requests
        Constraint::Fill(1), // Rate
        Constraint::Fill(1), // TTL
        Constraint::Min(8),  // Trend/Sparkline - fixed 8 for sparkline chars
        Constraint::Min(9),  // Status - fits "BLOCKED"
    ];

    // selected_user_index is a visual index; clamp it to the valid range
    let selected_visual_index = app.selected_user_index.min(users.len().saturating_sub(1));

    let sort_indicator = match app.sort_column {
        SortColumn::Name => "name",
        SortColumn::Requests => "requests",
        SortColumn::Ttl => "ttl",
        SortColumn::Status => "status",
    };
    let sort_dir = if app.sort_ascending { "↑" } else { "↓" };

    // Build title with filter info
    let filter_info = if app.filter_active {
        format!(" /{}_", app.filter_text)
    } else if !app.filter_text.is_empty() {
        format!(" /{}/ [c:clear]", app.filter_text)
    } else {
        String::new()
    };

    // Show scroll position if there are items
    let position_info = if !users.is_empty() {
        format!(" [{}/{}]", selected_visual_index + 1, users.len())
    } else {
        String::new()
    };

    let title = format!(
        " Users ({}/{}) [s:sort {}{}]{}{} ",
        users.len(),
        data.users.len(),
        sort_indicator,
        sort_dir,
        filter_info,
        position_info
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(selected_visual_index));

    frame.render_stateful_widget(table, chunks[1], &mut state);
}

/// Admission ratio and heaviest consumers, reduced from the whole
/// snapshot. The filter narrows the table below, never this strip.
fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let Some(ref data) = app.data else {
        return;
    };
    let summary = &data.summary;

    let bar_w = (area.width as usize).saturating_sub(44).max(10);
    let total = summary.total_users.max(1);
    let allowed_cells =
        ((summary.allowed_users as f64 / total as f64) * bar_w as f64).round() as usize;
    let blocked_cells = bar_w.saturating_sub(allowed_cells);

    let total_requests: u64 = summary.per_user.iter().map(|u| u.requests).sum();

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(vec![
        Span::styled(" Admitted ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(
            "█".repeat(allowed_cells),
            Style::default().fg(app.theme.allowed),
        ),
        Span::styled(
            "█".repeat(blocked_cells),
            Style::default().fg(app.theme.blocked),
        ),
        Span::raw(format!(
            " {}/{} users · {} blocked · {} requests",
            summary.allowed_users, summary.total_users, summary.blocked_users, total_requests
        )),
    ]));

    // Heaviest consumers in the current window
    let mut top: Vec<&UserRequests> = summary.per_user.iter().collect();
    top.sort_by(|a, b| b.requests.cmp(&a.requests).then_with(|| a.user_id.cmp(&b.user_id)));

    let mut spans = vec![Span::styled(
        " Top      ",
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if top.is_empty() {
        spans.push(Span::styled(
            "(no users in window)",
            Style::default().add_modifier(Modifier::DIM),
        ));
    } else {
        let max = top[0].requests.max(1);
        for user in top.iter().take(3) {
            let cells = (((user.requests as f64 / max as f64) * 8.0).round() as usize).max(1);
            spans.push(Span::raw(format!("{} ", truncate(&user.user_id, 12))));
            spans.push(Span::styled(
                "█".repeat(cells),
                Style::default().fg(app.theme.highlight),
            ));
            spans.push(Span::styled(
                format!(" {}   ", user.requests),
                Style::default().add_modifier(Modifier::DIM),
            ));
        }
    }
    lines.push(Line::from(spans));

    let block = Block::default()
        .title(" Quota ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    frame.render_widget(Paragraph::new(lines).block(block), area);
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

fn format_header(name: &str, col: SortColumn, app: &App) -> Span<'static> {
    if app.sort_column == col {
        let arrow = if app.sort_ascending { "↑" } else { "↓" };
        Span::raw(format!("{}{}", name, arrow))
    } else {
        Span::raw(name.to_string())
    }
}

/// Sort users by the given column and direction (public for use in app.rs)
pub fn sort_users_by(
    users: &mut [(usize, &UserStatus)],
    column: SortColumn,
    ascending: bool,
    thresholds: &Thresholds,
) {
    users.sort_by(|a, b| {
        let primary = match column {
            SortColumn::Name => a.1.user_id.cmp(&b.1.user_id),
            SortColumn::Requests => a.1.requests.cmp(&b.1.requests),
            SortColumn::Ttl => a.1.ttl_seconds.cmp(&b.1.ttl_seconds),
            SortColumn::Status => classify(a.1, thresholds).cmp(&classify(b.1, thresholds)),
        };

        // Apply direction to primary comparison
        let primary = if ascending {
            primary
        } else {
            primary.reverse()
        };

        // Use secondary sort by user id for stability when primary values are equal
        if primary == std::cmp::Ordering::Equal {
            a.1.user_id.cmp(&b.1.user_id)
        } else {
            primary
        }
    });
}

fn render_sparkline(data: &[u8]) -> String {
    if data.is_empty() {
        return "        ".to_string(); // 8 spaces placeholder
    }

    // Take last 8 values
    let values: Vec<u8> = data.iter().rev().take(8).rev().copied().collect();

    values.iter().map(|&v| SPARKLINE_CHARS[v.min(7) as usize]).collect()
}

/// Format large numbers with K/M suffixes
fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}
