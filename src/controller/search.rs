//! Background search

use super::{AppController, Pane};

impl AppController {
    /// Run a search without blocking the render loop.
    pub fn start_search(&self, query: String) {
        let controller = self.clone();
        tokio::spawn(async move {
            controller.perform_search(&query).await;
        });
    }

    pub async fn perform_search(&self, query: &str) {
        tracing::debug!(query, "Performing search");
        self.ui.lock().await.searching = true;

        let result = self.session.search(query).await;

        let mut ui = self.ui.lock().await;
        ui.searching = false;
        match result {
            Ok(tracks) => {
                tracing::info!(query, results = tracks.len(), "Search completed successfully");
                if tracks.is_empty() {
                    ui.notice = Some(format!("No results for \"{query}\""));
                }
                ui.results = tracks;
                ui.results_selected = 0;
                ui.pane = Pane::Results;
            }
            Err(e) => {
                tracing::error!(query, error = %e, "Search failed");
                ui.notice = Some(Self::format_error(&e));
            }
        }
    }
}
