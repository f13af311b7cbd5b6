//! Controller module - terminal input and UI-side state
//!
//! Turns key presses into session actions and keeps the UI-only state
//! (search box, result list, selections) that the session does not own.
//!
//! - `input`: Key event handling
//! - `search`: Background search against the resolver

mod input;
mod search;

use std::sync::Arc;
use tokio::sync::Mutex;

use tubeplay::{ResolveError, SessionHandle, Track};

/// Which pane has keyboard focus
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Pane {
    #[default]
    Search,
    Results,
    Queue,
}

impl Pane {
    pub fn next(self) -> Self {
        match self {
            Pane::Search => Pane::Results,
            Pane::Results => Pane::Queue,
            Pane::Queue => Pane::Search,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Pane::Search => Pane::Queue,
            Pane::Results => Pane::Search,
            Pane::Queue => Pane::Results,
        }
    }
}

/// UI state for the application
#[derive(Clone, Debug, Default)]
pub struct UiState {
    pub pane: Pane,
    pub search_query: String,
    pub results: Vec<Track>,
    pub results_selected: usize,
    pub queue_selected: usize,
    pub searching: bool,
    pub notice: Option<String>,
    pub show_help: bool,
    pub should_quit: bool,
}

#[derive(Clone)]
pub struct AppController {
    pub(crate) session: SessionHandle,
    pub(crate) ui: Arc<Mutex<UiState>>,
}

impl AppController {
    pub fn new(session: SessionHandle) -> Self {
        Self {
            session,
            ui: Arc::new(Mutex::new(UiState::default())),
        }
    }

    pub async fn ui_state(&self) -> UiState {
        self.ui.lock().await.clone()
    }

    pub(crate) fn format_error(error: &ResolveError) -> String {
        match error {
            ResolveError::NotFound(what) => format!("Nothing found for {what}"),
            ResolveError::Expired(_) => "The provider refused the request. Try again.".to_string(),
            ResolveError::ProviderUnavailable(reason) => {
                format!("Provider unavailable ({reason}). Try another instance.")
            }
        }
    }
}
