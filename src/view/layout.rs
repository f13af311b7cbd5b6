//! Layout rendering (top bar, search results, queue)

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, ListItem, Padding, Paragraph},
    Frame,
};

use tubeplay::{PlaybackStatus, SessionSnapshot, Track};

use crate::controller::{Pane, UiState};
use super::utils::{format_duration, render_scrollable_list, track_column_widths, truncate_string};

fn border_style(ui_state: &UiState, pane: Pane) -> Style {
    if ui_state.pane == pane {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    }
}

pub fn render_top_bar(frame: &mut Frame, area: Rect, ui_state: &UiState, snapshot: &SessionSnapshot) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),     // Search input
            Constraint::Length(16), // Session status
        ])
        .split(area);

    let search_style = if ui_state.pane == Pane::Search {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::White)
    };

    let search_text = if ui_state.searching {
        format!("Searching for \"{}\"...", ui_state.search_query)
    } else if ui_state.search_query.is_empty() {
        "Type to search...".to_string()
    } else {
        ui_state.search_query.clone()
    };

    let search = Paragraph::new(search_text).style(search_style).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Search ")
            .padding(Padding::horizontal(1))
            .border_style(border_style(ui_state, Pane::Search)),
    );
    frame.render_widget(search, chunks[0]);

    let status_color = match snapshot.status {
        PlaybackStatus::Playing => Color::Green,
        PlaybackStatus::Loading => Color::Yellow,
        PlaybackStatus::Error => Color::Red,
        PlaybackStatus::Idle | PlaybackStatus::Paused => Color::Cyan,
    };
    let status = Paragraph::new(snapshot.status.to_string())
        .style(Style::default().fg(status_color))
        .block(Block::default().borders(Borders::ALL).title(" Status "));
    frame.render_widget(status, chunks[1]);
}

fn track_row(
    track: &Track,
    index: usize,
    widths: (usize, usize, usize, usize),
    style: Style,
) -> ListItem<'static> {
    let (num_width, title_width, channel_width, duration_width) = widths;
    let text = format!(
        " {:>num_width$}  {}  {}  {:>duration_width$}",
        index + 1,
        truncate_string(&track.title, title_width),
        truncate_string(&track.channel.name, channel_width),
        format_duration(f64::from(track.duration)),
    );
    ListItem::new(text).style(style)
}

pub fn render_results(frame: &mut Frame, area: Rect, ui_state: &UiState, playing_id: Option<&str>) {
    let focused = ui_state.pane == Pane::Results;
    let content_width = area.width.saturating_sub(2) as usize;
    let widths = track_column_widths(content_width, ui_state.results.len());

    let items: Vec<ListItem> = ui_state
        .results
        .iter()
        .enumerate()
        .map(|(i, track)| {
            let is_selected = i == ui_state.results_selected;
            let is_playing = playing_id == Some(track.id.as_str());
            let style = if is_selected && focused {
                Style::default().fg(Color::Black).bg(Color::Green).add_modifier(Modifier::BOLD)
            } else if is_playing {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::White)
            };
            track_row(track, i, widths, style)
        })
        .collect();

    let title = if ui_state.results.is_empty() {
        " Results ".to_string()
    } else {
        format!(" Results ({}) ", ui_state.results.len())
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(border_style(ui_state, Pane::Results));

    let selected = (!ui_state.results.is_empty()).then_some(ui_state.results_selected);
    render_scrollable_list(frame, area, items, selected, block);
}

pub fn render_queue(frame: &mut Frame, area: Rect, ui_state: &UiState, snapshot: &SessionSnapshot) {
    let focused = ui_state.pane == Pane::Queue;
    let content_width = area.width.saturating_sub(2) as usize;
    let widths = track_column_widths(content_width, snapshot.queue.len());

    let items: Vec<ListItem> = snapshot
        .queue
        .iter()
        .enumerate()
        .map(|(i, track)| {
            let is_selected = i == ui_state.queue_selected;
            let is_current = snapshot.current_index == Some(i);
            let style = if is_selected && focused {
                Style::default().fg(Color::Black).bg(Color::Green).add_modifier(Modifier::BOLD)
            } else if is_current {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            track_row(track, i, widths, style)
        })
        .collect();

    let title = match snapshot.current_index {
        Some(i) => format!(" Queue ({}/{}) ", i + 1, snapshot.queue.len()),
        None => format!(" Queue ({}) ", snapshot.queue.len()),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(border_style(ui_state, Pane::Queue));

    let selected = (!snapshot.queue.is_empty()).then_some(ui_state.queue_selected);
    render_scrollable_list(frame, area, items, selected, block);
}
