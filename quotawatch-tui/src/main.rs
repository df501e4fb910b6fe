// Binary includes library modules - some public API items are only for library consumers
#![allow(unused)]

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Terminal,
};
use tracing_subscriber::EnvFilter;

mod app;
mod data;
mod events;
mod ui;

use app::{App, View};
use quotawatch_client::AdminClient;
use quotawatch_feed::{bucket_events, events_from_logs, flatten, summarize, FeedConfig, LiveFeed};

#[derive(Parser, Debug)]
#[command(name = "quotawatch")]
#[command(about = "Terminal dashboard for an AI gateway's rate limiter")]
struct Args {
    /// Base URL of the gateway admin API
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Quota table poll interval (e.g., "10s", "2s")
    #[arg(long, default_value = "10s")]
    status_interval: String,

    /// Request log poll interval (e.g., "5s")
    #[arg(long, default_value = "5s")]
    log_interval: String,

    /// Traffic bucket width (e.g., "1m", "30s")
    #[arg(short, long, default_value = "1m")]
    granularity: String,

    /// Per-request HTTP timeout (e.g., "10s")
    #[arg(long, default_value = "10s")]
    timeout: String,

    /// Requests-in-window warning threshold
    #[arg(long, default_value = "8")]
    request_warn: u64,

    /// Color theme: auto, dark, or light
    #[arg(long, default_value = "auto")]
    theme: String,

    /// Fetch once, write dashboard state to a JSON file, and exit
    #[arg(short, long)]
    export: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Parse interval durations
    let status_interval = data::duration::parse_duration(&args.status_interval)
        .unwrap_or(Duration::from_secs(10));
    let log_interval =
        data::duration::parse_duration(&args.log_interval).unwrap_or(Duration::from_secs(5));
    let granularity =
        data::duration::parse_duration(&args.granularity).unwrap_or(Duration::from_secs(60));
    let timeout =
        data::duration::parse_duration(&args.timeout).unwrap_or(Duration::from_secs(10));

    let thresholds = data::Thresholds {
        request_warning: args.request_warn,
    };

    let client = AdminClient::builder()
        .base_url(&args.url)
        .timeout(timeout)
        .build();

    // Handle export mode (non-interactive)
    if let Some(export_path) = args.export {
        init_export_tracing();
        return export_to_file(client, &export_path, granularity);
    }

    init_interactive_tracing()?;

    // "auto" probes the terminal background once the TUI owns it
    let theme = match args.theme.as_str() {
        "dark" => Some(ui::Theme::dark()),
        "light" => Some(ui::Theme::light()),
        _ => None,
    };

    let config = FeedConfig {
        status_interval,
        log_interval,
    };
    run_with_gateway(client, args.url, thresholds, config, granularity, theme)
}

/// Export mode owns stdout for the final path message, so diagnostics go
/// to stderr.
fn init_export_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
}

/// Interactive mode draws over the whole terminal; log to a file instead,
/// and only when QUOTAWATCH_LOG names one.
fn init_interactive_tracing() -> Result<()> {
    let Ok(path) = std::env::var("QUOTAWATCH_LOG") else {
        return Ok(());
    };

    let file = std::fs::File::create(&path)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_writer(std::sync::Arc::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}

/// Run with pollers against a live gateway
fn run_with_gateway(
    client: AdminClient,
    source: String,
    thresholds: data::Thresholds,
    config: FeedConfig,
    granularity: Duration,
    theme: Option<ui::Theme>,
) -> Result<()> {
    // Build a tokio runtime; the pollers live on it while the TUI keeps
    // the main thread
    let rt = tokio::runtime::Runtime::new()?;
    let feed = rt.block_on(async { LiveFeed::start(client, config) });

    let result = run_tui(feed, source, thresholds, granularity, theme);

    // The feed is stopped by now; dropping the runtime reaps the tasks
    drop(rt);

    result
}

/// Run the TUI around a running feed
fn run_tui(
    feed: LiveFeed,
    source: String,
    thresholds: data::Thresholds,
    granularity: Duration,
    theme: Option<ui::Theme>,
) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    // Create app and fold in anything that already arrived
    let mut app = App::new(feed, source, thresholds, granularity);
    if let Some(theme) = theme {
        app.theme = theme;
    }
    app.refresh();

    // Run the main loop
    let result = run_app(&mut terminal, &mut app);

    app.shutdown();

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 12;

    while app.running {
        // Draw UI
        terminal.draw(|frame| {
            let area = frame.area();

            // Check for minimum terminal size
            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                let centered = ratatui::layout::Rect::new(
                    0,
                    (area.height / 2).saturating_sub(2),
                    area.width,
                    5.min(area.height),
                );
                frame.render_widget(paragraph, centered);
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Length(1), // Tabs
                Constraint::Min(8),    // Content
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            // Render header with gateway-wide state
            ui::common::render_header(frame, app, chunks[0]);

            // Render tabs
            ui::common::render_tabs(frame, app, chunks[1]);

            // Render current view
            match app.current_view {
                View::Overview => ui::overview::render(frame, app, chunks[2]),
                View::Traffic => ui::traffic::render(frame, app, chunks[2]),
                View::Activity => ui::activity::render(frame, app, chunks[2]),
            }

            // Render status bar
            ui::common::render_status_bar(frame, app, chunks[3]);

            // Render detail overlay if active
            if app.show_detail_overlay {
                ui::detail::render_overlay(frame, app);
            }

            // Render help overlay if active
            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        // Poll for events with a short timeout
        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => {
                    // Content starts after header (1) + tabs (1) + table header (1)
                    events::handle_mouse_event(app, mouse, 3);
                }
                Event::Resize(_, _) => {
                    // Terminal will redraw on next iteration
                }
                _ => {}
            }
        }

        // Fold in whatever the pollers delivered since the last pass
        app.refresh();
    }

    Ok(())
}

/// Fetch once and write the dashboard state to a JSON file
fn export_to_file(
    client: AdminClient,
    export_path: &std::path::Path,
    granularity: Duration,
) -> Result<()> {
    use std::io::Write;

    let rt = tokio::runtime::Runtime::new()?;
    let (users, logs) = rt.block_on(async {
        let users = client.rate_status().await?;
        let logs = client.logs().await?;
        Ok::<_, anyhow::Error>((users, logs))
    })?;

    let summary = summarize(&users);
    let events = flatten(&users);
    let buckets = bucket_events(&events, granularity);

    // Build export structure
    let mut export = serde_json::Map::new();

    // Summary
    let mut summary_map = serde_json::Map::new();
    summary_map.insert(
        "total_users".to_string(),
        serde_json::json!(summary.total_users),
    );
    summary_map.insert(
        "allowed_users".to_string(),
        serde_json::json!(summary.allowed_users),
    );
    summary_map.insert(
        "blocked_users".to_string(),
        serde_json::json!(summary.blocked_users),
    );

    let total_requests: u64 = users.iter().map(|u| u.requests).sum();
    summary_map.insert(
        "total_requests".to_string(),
        serde_json::json!(total_requests),
    );

    export.insert("summary".to_string(), serde_json::Value::Object(summary_map));

    // Users
    let user_values: Vec<serde_json::Value> = users
        .iter()
        .map(|u| {
            serde_json::json!({
                "user_id": u.user_id,
                "requests": u.requests,
                "decision": u.ai_allowed.label(),
                "ttl_seconds": u.ttl_seconds,
            })
        })
        .collect();
    export.insert("users".to_string(), serde_json::Value::Array(user_values));

    // Traffic buckets at the requested granularity
    export.insert("traffic".to_string(), serde_json::to_value(&buckets)?);

    // Request log lifted into chronological events
    export.insert(
        "activity".to_string(),
        serde_json::to_value(events_from_logs(&logs))?,
    );

    // Write to file
    let json = serde_json::to_string_pretty(&serde_json::Value::Object(export))?;
    let mut file = std::fs::File::create(export_path)?;
    file.write_all(json.as_bytes())?;

    println!("Exported dashboard state to: {}", export_path.display());
    Ok(())
}
