//! Traffic view rendering.
//!
//! Draws allowed/blocked request volume as horizontal bars, one row per
//! time bucket, with a detail panel for the selected bucket.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use quotawatch_feed::TrafficBucket;

use crate::app::App;
use crate::data::duration::format_duration;

/// Sparkline characters (8 levels of height).
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Render the Traffic view: one bar per bucket, newest at the bottom.
pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let Some(ref data) = app.data else {
        return;
    };

    let buckets = &data.buckets;

    if buckets.is_empty() {
        let block = Block::default()
            .title(" Traffic ")
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border));
        let paragraph =
            Paragraph::new("No requests recorded in any window yet").block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    // Split area: bars on top, details panel below
    let chunks = Layout::vertical([
        Constraint::Min(6),    // Bars fill remaining space
        Constraint::Length(6), // Details panel
    ])
    .split(area);

    let selected = app.selected_bucket_index.min(buckets.len() - 1);

    // Window the bucket list so the selection stays visible
    let visible_rows = chunks[0].height.saturating_sub(2) as usize;
    let start = if buckets.len() <= visible_rows {
        0
    } else {
        let max_start = buckets.len() - visible_rows;
        selected
            .saturating_sub(visible_rows.saturating_sub(1))
            .min(max_start)
    };

    // One scale for every bar so rows stay comparable
    let max_total = buckets.iter().map(TrafficBucket::total).max().unwrap_or(1).max(1);

    // Row layout: time label, bar, counts
    let label_w = 8usize;
    let counts_w = 22usize;
    let bar_w = (chunks[0].width as usize)
        .saturating_sub(label_w + counts_w + 6)
        .max(8);

    let seconds_matter = app.granularity.as_secs() < 60;

    let mut bar_lines: Vec<Line> = Vec::new();
    for (offset, bucket) in buckets.iter().skip(start).take(visible_rows).enumerate() {
        let index = start + offset;
        let is_selected = index == selected;

        let local = bucket.start.with_timezone(&chrono::Local);
        let label = if seconds_matter {
            local.format("%H:%M:%S").to_string()
        } else {
            local.format("%H:%M").to_string()
        };

        let label_style = if is_selected {
            Style::default().fg(app.theme.highlight).add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::DIM)
        };

        let allowed_cells =
            ((bucket.allowed as f64 / max_total as f64) * bar_w as f64).round() as usize;
        let blocked_cells =
            ((bucket.blocked as f64 / max_total as f64) * bar_w as f64).round() as usize;
        // A nonzero count always shows at least one cell
        let allowed_cells = if bucket.allowed > 0 { allowed_cells.max(1) } else { 0 };
        let blocked_cells = if bucket.blocked > 0 { blocked_cells.max(1) } else { 0 };

        let counts = format!(
            " {:>5} ({} ok, {} blk)",
            bucket.total(),
            bucket.allowed,
            bucket.blocked
        );

        let counts_style = if is_selected {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::DIM)
        };

        bar_lines.push(Line::from(vec![
            Span::raw(if is_selected { "▶" } else { " " }),
            Span::styled(format!("{:>label_w$}", label, label_w = label_w), label_style),
            Span::styled(" │", Style::default().fg(app.theme.border)),
            Span::styled(
                "█".repeat(allowed_cells),
                Style::default().fg(app.theme.allowed),
            ),
            Span::styled(
                "█".repeat(blocked_cells),
                Style::default().fg(app.theme.blocked),
            ),
            Span::styled(counts, counts_style),
        ]));
    }

    let title = format!(
        " Traffic ({} buckets · {} each) [g:width] [{}/{}] ",
        buckets.len(),
        format_duration(app.granularity),
        selected + 1,
        buckets.len()
    );

    let bars_block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    frame.render_widget(Paragraph::new(bar_lines).block(bars_block), chunks[0]);

    // ===== RENDER DETAILS PANEL =====
    let mut detail_lines: Vec<Line> = Vec::new();

    // Legend row
    detail_lines.push(Line::from(vec![
        Span::styled(" Legend: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled("█", Style::default().fg(app.theme.allowed)),
        Span::raw(" allowed  "),
        Span::styled("█", Style::default().fg(app.theme.blocked)),
        Span::raw(" blocked"),
    ]));

    if let Some(bucket) = buckets.get(selected) {
        let local = bucket.start.with_timezone(&chrono::Local);
        let end = bucket.start + chrono::TimeDelta::seconds(app.granularity.as_secs() as i64);
        let admitted = if bucket.total() > 0 {
            format!("{}% admitted", bucket.allowed * 100 / bucket.total())
        } else {
            "idle".to_string()
        };

        detail_lines.push(Line::from(vec![
            Span::styled(
                format!(
                    " {} – {} ",
                    local.format("%H:%M:%S"),
                    end.with_timezone(&chrono::Local).format("%H:%M:%S")
                ),
                Style::default().fg(app.theme.highlight).add_modifier(Modifier::BOLD),
            ),
            Span::styled("│ ", Style::default().fg(app.theme.border)),
            Span::raw(format!("{} requests  ", bucket.total())),
            Span::styled(
                format!("{} allowed  ", bucket.allowed),
                Style::default().fg(app.theme.allowed),
            ),
            Span::styled(
                format!("{} blocked  ", bucket.blocked),
                Style::default().fg(app.theme.blocked),
            ),
            Span::styled("│ ", Style::default().fg(app.theme.border)),
            Span::styled(admitted, Style::default().add_modifier(Modifier::DIM)),
        ]));
    }

    // Volume trend across the most recent buckets
    let trend = bucket_sparkline(buckets, 16);
    detail_lines.push(Line::from(vec![
        Span::styled(" Trend:  ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(trend, Style::default().fg(app.theme.highlight)),
    ]));

    detail_lines.push(Line::from(vec![Span::styled(
        " ↑/↓ select bucket    g change width    Tab switch view",
        Style::default().add_modifier(Modifier::DIM),
    )]));

    let details_block = Block::default()
        .title(" Bucket ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    frame.render_widget(Paragraph::new(detail_lines).block(details_block), chunks[1]);
}

/// Sparkline over the totals of the most recent buckets.
fn bucket_sparkline(buckets: &[TrafficBucket], width: usize) -> String {
    let totals: Vec<u64> = buckets
        .iter()
        .rev()
        .take(width)
        .rev()
        .map(TrafficBucket::total)
        .collect();

    if totals.is_empty() {
        return String::new();
    }

    let max = totals.iter().copied().max().unwrap_or(1).max(1);
    totals
        .iter()
        .map(|&total| {
            let level = ((total as f64 / max as f64) * 7.0) as usize;
            SPARKLINE_CHARS[level.min(7)]
        })
        .collect()
}
