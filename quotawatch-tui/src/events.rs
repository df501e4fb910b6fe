use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::app::{App, View};

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    // If the detail overlay is shown, handle overlay-specific keys
    if app.show_detail_overlay {
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Backspace | KeyCode::Char('q') => {
                app.close_overlay();
            }
            // Allow scrolling through users while the overlay is open
            KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
            KeyCode::Down | KeyCode::Char('j') => app.select_next(),
            KeyCode::PageUp => app.select_prev_n(10),
            KeyCode::PageDown => app.select_next_n(10),
            KeyCode::Home => app.select_first(),
            KeyCode::End => app.select_last(),
            _ => {}
        }
        return;
    }

    // If filter input is active, handle text input
    if app.filter_active {
        handle_filter_input(app, key);
        return;
    }

    match key.code {
        // Quit
        KeyCode::Char('q') => app.quit(),

        // View switching
        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.prev_view();
            } else {
                app.next_view();
            }
        }
        KeyCode::BackTab => app.prev_view(),

        // Direct view access (user detail is overlay-only, via Enter)
        KeyCode::Char('1') => app.set_view(View::Overview),
        KeyCode::Char('2') => app.set_view(View::Traffic),
        KeyCode::Char('3') => app.set_view(View::Activity),

        // Navigation (up/down for items, left/right for tabs)
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Left | KeyCode::Char('h') => app.prev_view(),
        KeyCode::Right | KeyCode::Char('l') => app.next_view(),
        KeyCode::PageUp => app.select_prev_n(10),
        KeyCode::PageDown => app.select_next_n(10),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),

        // Enter detail overlay
        KeyCode::Enter => app.enter_detail(),

        // Go back (Esc and Backspace)
        KeyCode::Esc | KeyCode::Backspace => app.go_back(),

        // Pump any queued poll results right now
        KeyCode::Char('r') => {
            app.refresh();
        }

        // Help
        KeyCode::Char('?') => app.toggle_help(),

        // Sorting (Users view)
        KeyCode::Char('s') => {
            if app.current_view == View::Overview {
                app.cycle_sort();
            }
        }
        KeyCode::Char('S') => {
            if app.current_view == View::Overview {
                app.toggle_sort_direction();
            }
        }

        // Bucket width (Traffic view)
        KeyCode::Char('g') => {
            if app.current_view == View::Traffic {
                app.cycle_granularity();
            }
        }

        // Filter (start typing to filter)
        KeyCode::Char('/') => {
            if app.current_view == View::Overview || app.current_view == View::Activity {
                app.start_filter();
            }
        }

        // Clear filter
        KeyCode::Char('c') => {
            if !app.filter_text.is_empty() {
                app.clear_filter();
            }
        }

        // Export
        KeyCode::Char('e') => {
            let export_path = std::path::PathBuf::from("quotawatch_export.json");
            match app.export_state(&export_path) {
                Ok(()) => {
                    app.set_status_message(format!("Exported to {}", export_path.display()));
                }
                Err(e) => {
                    app.set_status_message(format!("Export failed: {}", e));
                }
            }
        }

        _ => {}
    }
}

/// Handle key input while filter is active
fn handle_filter_input(app: &mut App, key: KeyEvent) {
    match key.code {
        // Confirm filter
        KeyCode::Enter => {
            app.filter_active = false;
        }

        // Cancel filter (keep text but exit input mode)
        KeyCode::Esc => {
            app.cancel_filter();
        }

        // Clear and exit
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.clear_filter();
        }

        // Backspace
        KeyCode::Backspace => {
            app.filter_pop();
            if app.filter_text.is_empty() {
                app.filter_active = false;
            }
        }

        // Type characters
        KeyCode::Char(c) => {
            app.filter_push(c);
        }

        _ => {}
    }
}

/// Handle mouse events
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent, content_start_row: u16) {
    match mouse.kind {
        // Scroll wheel
        MouseEventKind::ScrollUp => {
            app.select_prev();
        }
        MouseEventKind::ScrollDown => {
            app.select_next();
        }

        // Click to select
        MouseEventKind::Down(MouseButton::Left) => {
            // Calculate which row was clicked (accounting for header/tabs)
            let clicked_row = mouse.row;

            // Check if clicking in content area (after header, tabs, table header)
            if clicked_row > content_start_row {
                let item_row = (clicked_row - content_start_row - 1) as usize;

                match app.current_view {
                    View::Overview => {
                        if let Some(ref data) = app.data {
                            // The admission strip (4 rows) sits above the table
                            let table_row = match item_row.checked_sub(4) {
                                Some(row) => row,
                                None => return,
                            };
                            let filtered_count = data
                                .users
                                .iter()
                                .filter(|u| app.matches_filter(&u.user_id))
                                .count();
                            // Set visual index directly
                            if table_row < filtered_count {
                                app.selected_user_index = table_row;
                            }
                        }
                    }
                    View::Traffic => {
                        if let Some(ref data) = app.data {
                            // Bar rows start right under the block border
                            let bar_row = (clicked_row - content_start_row) as usize;
                            if bar_row < data.buckets.len() {
                                app.selected_bucket_index = bar_row;
                            }
                        }
                    }
                    View::Activity => {
                        if let Some(ref data) = app.data {
                            let filtered_count = data
                                .logs
                                .iter()
                                .filter(|r| {
                                    app.matches_filter(&r.user_id)
                                        || app.matches_filter(&r.endpoint)
                                })
                                .count();
                            if item_row < filtered_count {
                                app.selected_log_index = item_row;
                            }
                        }
                    }
                }
            }

            // Check for tab clicks (row 1, after header)
            if clicked_row == 1 {
                let col = mouse.column;
                // Approximate tab positions: Users (0-9), Traffic (10-20), Activity (21-32)
                if col < 10 {
                    app.set_view(View::Overview);
                } else if col < 21 {
                    app.set_view(View::Traffic);
                } else if col < 33 {
                    app.set_view(View::Activity);
                }
            }
        }

        // Right-click goes back
        MouseEventKind::Down(MouseButton::Right) => {
            app.go_back();
        }

        _ => {}
    }
}
