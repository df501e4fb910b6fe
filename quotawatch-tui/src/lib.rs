// Library crate: public API items may not be used by the binary
#![allow(unused)]

//! # quotawatch-tui
//!
//! A terminal dashboard for watching an AI quota gateway.
//!
//! This crate renders the gateway's admin endpoints as an interactive
//! terminal UI: who is consuming quota, who has been cut off, and how
//! traffic is flowing minute by minute.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Application                           │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌──────────┐ │
//! │  │  app    │───▶│   data   │───▶│   ui    │───▶│ Terminal │ │
//! │  │ (state) │    │(processing)   │(rendering)   │          │ │
//! │  └────┬────┘    └──────────┘    └─────────┘    └──────────┘ │
//! │       │                                                      │
//! │       ▼                                                      │
//! │  ┌──────────┐                                                │
//! │  │ LiveFeed │◀── GET /admin/rate-status · GET /admin/logs   │
//! │  │ (input)  │                                                │
//! │  └──────────┘                                                │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`app`]**: Application state, view navigation, and user interaction logic
//! - **[`data`]**: Display-side processing - per-user trend history for
//!   sparklines, health classification, and duration parsing/formatting
//! - **[`ui`]**: Terminal rendering using ratatui - the users table, traffic
//!   buckets, activity log, and theme support
//!
//! Snapshots come from [`quotawatch_feed::LiveFeed`], which polls the
//! gateway's two admin endpoints in the background and hands the latest
//! state to the render loop.
//!
//! ## Features
//!
//! - **Users view**: Every user in the limiter's window with request count,
//!   rate, remaining TTL, trend, and admission state
//! - **Traffic view**: Allowed/blocked request volume in fixed time buckets
//! - **Activity view**: The gateway's recent request log, newest first
//! - **Export**: One-shot JSON dump of the dashboard state
//!
//! ## Usage
//!
//! ```bash
//! # Watch a gateway on localhost
//! quotawatch --url http://localhost:8080
//!
//! # Slower polling, five-minute traffic buckets
//! quotawatch --status-interval 30s --granularity 5m
//!
//! # Dump dashboard state to a file and exit
//! quotawatch --export dashboard.json
//! ```

pub mod app;
pub mod data;
pub mod events;
pub mod ui;

// Re-export main types for convenience
pub use app::{App, DashboardData, View};
pub use data::{Thresholds, TrendHistory, UserHealth};
