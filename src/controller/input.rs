//! Key event handling

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use tubeplay::{Action, Session, SessionSnapshot};

use super::{AppController, Pane, UiState};

const SEEK_STEP_SECS: f64 = 10.0;
const SPEED_STEP: f64 = 0.25;

impl AppController {
    pub async fn handle_key_event(&self, key: KeyEvent, snapshot: &SessionSnapshot) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        let mut ui = self.ui.lock().await;

        // Notices block all other interactions
        if ui.notice.is_some() {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
                ui.notice = None;
            }
            return Ok(());
        }

        if ui.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('h') | KeyCode::Char('H')) {
                ui.show_help = false;
            }
            return Ok(());
        }

        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c'))
        {
            ui.should_quit = true;
            return Ok(());
        }

        match ui.pane {
            Pane::Search => match key.code {
                KeyCode::Enter => {
                    let query = ui.search_query.trim().to_string();
                    drop(ui);
                    if !query.is_empty() {
                        self.start_search(query);
                    }
                    return Ok(());
                }
                KeyCode::Esc => {
                    ui.search_query.clear();
                    return Ok(());
                }
                KeyCode::Backspace => {
                    ui.search_query.pop();
                    return Ok(());
                }
                KeyCode::Char(c) => {
                    ui.search_query.push(c);
                    return Ok(());
                }
                _ => {}
            },
            Pane::Results => match key.code {
                KeyCode::Up => {
                    ui.results_selected = ui.results_selected.saturating_sub(1);
                    return Ok(());
                }
                KeyCode::Down => {
                    if ui.results_selected + 1 < ui.results.len() {
                        ui.results_selected += 1;
                    }
                    return Ok(());
                }
                KeyCode::Enter => {
                    if let Some(track) = ui.results.get(ui.results_selected).cloned() {
                        drop(ui);
                        self.session.dispatch(Action::PlayTrack(track))?;
                    }
                    return Ok(());
                }
                KeyCode::Char('a') | KeyCode::Char('A') => {
                    if let Some(track) = ui.results.get(ui.results_selected).cloned() {
                        drop(ui);
                        self.session.dispatch(Action::EnqueueTrack(track))?;
                    }
                    return Ok(());
                }
                _ => {}
            },
            Pane::Queue => match key.code {
                KeyCode::Up => {
                    ui.queue_selected = ui.queue_selected.saturating_sub(1);
                    return Ok(());
                }
                KeyCode::Down => {
                    if ui.queue_selected + 1 < snapshot.queue.len() {
                        ui.queue_selected += 1;
                    }
                    return Ok(());
                }
                KeyCode::Enter => {
                    if ui.queue_selected < snapshot.queue.len() {
                        let index = ui.queue_selected;
                        drop(ui);
                        self.session.dispatch(Action::PlayIndex(index))?;
                    }
                    return Ok(());
                }
                KeyCode::Delete | KeyCode::Char('x') | KeyCode::Char('X') => {
                    if ui.queue_selected < snapshot.queue.len() {
                        let index = ui.queue_selected;
                        // Keep the selection on a valid row after removal
                        ui.queue_selected = index.min(snapshot.queue.len().saturating_sub(2));
                        drop(ui);
                        self.session.dispatch(Action::Remove(index))?;
                    }
                    return Ok(());
                }
                _ => {}
            },
        }

        if handle_ui_key(&mut ui, key) {
            return Ok(());
        }
        drop(ui);

        if let Some(action) = playback_action(key.code, snapshot) {
            self.session.dispatch(action)?;
        }
        Ok(())
    }
}

/// Keys that only change UI state. Returns true when the key was consumed.
fn handle_ui_key(ui: &mut UiState, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Tab if key.modifiers.contains(KeyModifiers::SHIFT) => ui.pane = ui.pane.prev(),
        KeyCode::Tab => ui.pane = ui.pane.next(),
        KeyCode::BackTab => ui.pane = ui.pane.prev(),
        KeyCode::Char('/') | KeyCode::Char('g') | KeyCode::Char('G') => ui.pane = Pane::Search,
        KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => ui.show_help = true,
        KeyCode::Char('q') | KeyCode::Char('Q') => ui.should_quit = true,
        _ => return false,
    }
    true
}

/// Map a global playback key to a session action.
fn playback_action(code: KeyCode, snapshot: &SessionSnapshot) -> Option<Action> {
    let playback = &snapshot.playback;
    let action = match code {
        KeyCode::Char(' ') => Action::TogglePlayPause,
        KeyCode::Char('n') | KeyCode::Char('N') => Action::Next,
        KeyCode::Char('p') | KeyCode::Char('P') => Action::Previous,
        KeyCode::Char('s') | KeyCode::Char('S') => Action::SetShuffle(!snapshot.shuffle),
        KeyCode::Char('r') | KeyCode::Char('R') => Action::CycleRepeat,
        KeyCode::Char('l') | KeyCode::Char('L') => Action::ToggleLike,
        KeyCode::Char('+') | KeyCode::Char('=') => Action::SetSpeed(playback.speed + SPEED_STEP),
        KeyCode::Char('-') | KeyCode::Char('_') => Action::SetSpeed(playback.speed - SPEED_STEP),
        KeyCode::Right => Action::Seek(playback.current_time + SEEK_STEP_SECS),
        KeyCode::Left => Action::Seek((playback.current_time - SEEK_STEP_SECS).max(0.0)),
        KeyCode::Char('c') | KeyCode::Char('C') => Action::ClearQueue,
        KeyCode::Char('y') | KeyCode::Char('Y') => Action::Retry,
        KeyCode::Esc => Action::Stop,
        _ => return None,
    };
    Some(action)
}
