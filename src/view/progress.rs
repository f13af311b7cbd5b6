//! Progress bar rendering

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Gauge},
    Frame,
};

use tubeplay::{PlaybackStatus, RepeatMode, SessionSnapshot};
use super::utils::format_duration;

pub fn render_progress_bar(frame: &mut Frame, area: Rect, snapshot: &SessionSnapshot) {
    let playback = &snapshot.playback;

    let status_text = match (&snapshot.track, snapshot.status) {
        (_, PlaybackStatus::Error) => {
            let message = snapshot
                .error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Playback failed".to_string());
            format!(" ✖ {} (y to retry, n to skip)", message)
        }
        (None, _) => " No track playing".to_string(),
        (Some(track), PlaybackStatus::Loading) => format!(" ⏳ {} | {}", track.title, track.channel.name),
        (Some(track), PlaybackStatus::Playing) => format!(" ▶ {} | {}", track.title, track.channel.name),
        (Some(track), _) => format!(" ⏸ {} | {}", track.title, track.channel.name),
    };

    let shuffle_text = if snapshot.shuffle { "Shuffle: On" } else { "Shuffle: Off" };
    let repeat_text = match snapshot.repeat {
        RepeatMode::Off => "Repeat: Off",
        RepeatMode::All => "Repeat: All",
        RepeatMode::One => "Repeat: One",
    };
    let liked_text = if snapshot.liked { " | ♥" } else { "" };
    let speed_text = format!("{:.2}x", playback.speed);

    let time_str = format!(
        "{} / {}",
        format_duration(playback.current_time),
        format_duration(playback.duration)
    );

    let title = format!("{} ", status_text);
    let controls_info = format!(" {} | {} | {}{} ", shuffle_text, repeat_text, speed_text, liked_text);

    let gauge_color = if snapshot.status == PlaybackStatus::Error { Color::Red } else { Color::Green };
    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .title_bottom(Line::from(controls_info).right_aligned()),
        )
        .gauge_style(Style::default().fg(gauge_color))
        .ratio(playback.progress_ratio())
        .label(time_str);

    frame.render_widget(gauge, area);
}
