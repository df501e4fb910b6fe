//! Activity view rendering.
//!
//! Shows the gateway's request log as a table, newest entries first,
//! exactly in the order the admin API serves them.

use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use quotawatch_types::LogRecord;

use crate::app::App;

/// Render the Activity view: a table of recent requests.
pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let Some(ref data) = app.data else {
        return;
    };

    // Filter on user or endpoint; the served order (newest first) stands.
    let records: Vec<&LogRecord> = data
        .logs
        .iter()
        .filter(|r| app.matches_filter(&r.user_id) || app.matches_filter(&r.endpoint))
        .collect();

    let header = Row::new(vec![
        Cell::from("Time"),
        Cell::from("User"),
        Cell::from("Endpoint"),
        Cell::from("Decision"),
    ])
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = records
        .iter()
        .map(|record| {
            let time = record
                .timestamp
                .with_timezone(&chrono::Local)
                .format("%H:%M:%S")
                .to_string();

            let decision_style = if record.allowed.is_allowed() {
                Style::default().fg(app.theme.allowed)
            } else {
                Style::default().fg(app.theme.blocked).add_modifier(Modifier::BOLD)
            };

            Row::new(vec![
                Cell::from(time),
                Cell::from(record.user_id.clone()),
                Cell::from(record.endpoint.clone()),
                Cell::from(record.allowed.label()).style(decision_style),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(10),
        Constraint::Fill(2),
        Constraint::Fill(3),
        Constraint::Min(9),
    ];

    let mut title = format!(" Activity ({}/{})", records.len(), data.logs.len());
    if !app.filter_text.is_empty() {
        title.push_str(&format!(" /{}/", app.filter_text));
    }
    if !records.is_empty() {
        let position = app.selected_log_index.min(records.len() - 1) + 1;
        title.push_str(&format!(" [{}/{}]", position, records.len()));
    }
    title.push(' ');

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    if !records.is_empty() {
        state.select(Some(app.selected_log_index.min(records.len() - 1)));
    }

    frame.render_stateful_widget(table, area, &mut state);
}
