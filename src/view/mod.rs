//! View module - UI rendering
//!
//! Draws the session snapshot and UI state with ratatui:
//!
//! - `utils`: Shared utility functions (formatting, scrollable lists)
//! - `layout`: Top bar, search results and queue panes
//! - `progress`: Now-playing progress bar
//! - `overlays`: Modal overlays (notice, help)

mod utils;
mod layout;
mod progress;
mod overlays;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

use tubeplay::SessionSnapshot;

use crate::controller::UiState;

pub struct AppView;

impl AppView {
    pub fn render(frame: &mut Frame, snapshot: &SessionSnapshot, ui_state: &UiState) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Search bar + status
                Constraint::Min(0),    // Results + queue
                Constraint::Length(3), // Progress bar with playback info
            ])
            .split(frame.area());

        layout::render_top_bar(frame, chunks[0], ui_state, snapshot);

        let main_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(chunks[1]);

        layout::render_results(frame, main_chunks[0], ui_state, snapshot.track_id());
        layout::render_queue(frame, main_chunks[1], ui_state, snapshot);

        progress::render_progress_bar(frame, chunks[2], snapshot);

        if ui_state.notice.is_some() {
            overlays::render_notice(frame, ui_state);
        }

        if ui_state.show_help {
            overlays::render_help_popup(frame);
        }
    }
}
