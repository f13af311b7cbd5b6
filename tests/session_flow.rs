mod common;

use common::{start, track, ScriptedResolver};
use tubeplay::{ErrorKind, PlaybackStatus, RepeatMode, Session};

#[tokio::test(start_paused = true)]
async fn play_by_id_resolves_metadata_then_plays() {
    let mut h = start(ScriptedResolver::with_tracks(&[track("a", 120)]));

    h.session.play("a").unwrap();
    let snapshot = h.until_playing("a").await;

    let current = snapshot.track.unwrap();
    assert_eq!(current.title, "Title a");
    assert_eq!(current.channel.name, "Channel a");
    assert_eq!(snapshot.playback.duration, 120.0);
    assert!(snapshot.error.is_none());
    assert_eq!(snapshot.current_index, None);
}

#[tokio::test(start_paused = true)]
async fn next_stops_at_the_end_of_the_queue_without_repeat() {
    let mut h = start(ScriptedResolver::with_tracks(&[]));
    h.session.enqueue_track(track("a", 120)).unwrap();
    h.session.enqueue_track(track("b", 120)).unwrap();

    h.session.play_index(0).unwrap();
    h.until_playing("a").await;

    h.session.next().unwrap();
    let snapshot = h.until_playing("b").await;
    assert_eq!(snapshot.current_index, Some(1));

    h.session.next().unwrap();
    h.settle().await;
    let snapshot = h.session.state();
    assert_eq!(snapshot.track_id(), Some("b"));
    assert_eq!(snapshot.current_index, Some(1));
    assert_eq!(snapshot.status, PlaybackStatus::Playing);
    assert_eq!(h.resolver.locator_calls("b"), 1);
}

#[tokio::test(start_paused = true)]
async fn previous_after_three_seconds_restarts_the_track() {
    let mut h = start(ScriptedResolver::with_tracks(&[]));
    h.session.enqueue_track(track("a", 120)).unwrap();
    h.session.enqueue_track(track("b", 120)).unwrap();

    h.session.play_index(1).unwrap();
    h.until_playing("b").await;
    h.until("five seconds in", |s| s.playback.current_time >= 5.0).await;

    h.session.previous().unwrap();
    let snapshot = h
        .until("restart", |s| s.playback.current_time < 3.0)
        .await;
    assert_eq!(snapshot.track_id(), Some("b"));
    assert_eq!(snapshot.current_index, Some(1));
    assert_eq!(h.resolver.locator_calls("b"), 1);
}

#[tokio::test(start_paused = true)]
async fn previous_near_the_start_moves_back() {
    let mut h = start(ScriptedResolver::with_tracks(&[]));
    h.session.enqueue_track(track("a", 120)).unwrap();
    h.session.enqueue_track(track("b", 120)).unwrap();

    h.session.play_index(1).unwrap();
    h.until_playing("b").await;

    h.session.previous().unwrap();
    let snapshot = h.until_playing("a").await;
    assert_eq!(snapshot.current_index, Some(0));
}

#[tokio::test(start_paused = true)]
async fn end_of_track_advances_then_pauses_at_the_end() {
    let mut h = start(ScriptedResolver::with_tracks(&[]));
    h.session.enqueue_track(track("a", 2)).unwrap();
    h.session.enqueue_track(track("b", 2)).unwrap();

    h.session.play_index(0).unwrap();
    h.until_playing("a").await;

    let snapshot = h.until_playing("b").await;
    assert_eq!(snapshot.current_index, Some(1));

    let snapshot = h
        .until("paused at the end", |s| s.status == PlaybackStatus::Paused)
        .await;
    assert_eq!(snapshot.track_id(), Some("b"));
    assert_eq!(snapshot.playback.current_time, 2.0);
}

#[tokio::test(start_paused = true)]
async fn repeat_all_wraps_to_the_first_track() {
    let mut h = start(ScriptedResolver::with_tracks(&[]));
    h.session.enqueue_track(track("a", 2)).unwrap();
    h.session.enqueue_track(track("b", 2)).unwrap();
    h.session.set_repeat(RepeatMode::All).unwrap();

    h.session.play_index(1).unwrap();
    h.until_playing("b").await;

    let snapshot = h.until_playing("a").await;
    assert_eq!(snapshot.current_index, Some(0));
    assert_eq!(h.resolver.locator_calls("a"), 1);
}

#[tokio::test(start_paused = true)]
async fn repeat_one_replays_without_a_new_locator() {
    let mut h = start(ScriptedResolver::with_tracks(&[]));
    h.session.cycle_repeat().unwrap();
    h.session.cycle_repeat().unwrap();
    h.session.play_track(track("a", 3)).unwrap();
    h.until_playing("a").await;

    assert_eq!(h.session.state().repeat, RepeatMode::One);

    h.until("late in the track", |s| s.playback.current_time >= 2.0).await;
    let snapshot = h
        .until("replay from the top", |s| s.playback.current_time < 1.0)
        .await;
    assert_eq!(snapshot.track_id(), Some("a"));
    assert!(snapshot.is_playing());
    assert_eq!(h.resolver.locator_calls("a"), 1);
}

#[tokio::test(start_paused = true)]
async fn single_track_queue_loops_under_repeat_all() {
    let mut h = start(ScriptedResolver::with_tracks(&[]));
    h.session.enqueue_track(track("a", 3)).unwrap();
    h.session.set_repeat(RepeatMode::All).unwrap();

    h.session.play_index(0).unwrap();
    h.until_playing("a").await;
    h.until("late in the track", |s| s.playback.current_time >= 2.0).await;

    let snapshot = h
        .until("looped", |s| s.playback.current_time < 1.0)
        .await;
    assert!(snapshot.is_playing());
    assert_eq!(snapshot.current_index, Some(0));
}

#[tokio::test(start_paused = true)]
async fn clearing_the_queue_stops_and_next_stays_idle() {
    let mut h = start(ScriptedResolver::with_tracks(&[]));
    h.session.enqueue_track(track("a", 120)).unwrap();
    h.session.enqueue_track(track("b", 120)).unwrap();
    h.session.play_index(0).unwrap();
    h.until_playing("a").await;

    h.session.clear_queue().unwrap();
    let snapshot = h
        .until("idle", |s| s.track.is_none() && s.status == PlaybackStatus::Idle)
        .await;
    assert!(snapshot.queue.is_empty());
    assert_eq!(snapshot.current_index, None);

    h.session.next().unwrap();
    h.settle().await;
    let snapshot = h.session.state();
    assert!(snapshot.track.is_none());
    assert_eq!(snapshot.status, PlaybackStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn a_slow_locator_for_an_abandoned_track_never_binds() {
    let resolver = ScriptedResolver::with_tracks(&[]);
    let gate = resolver.gate("a");
    let mut h = start(resolver);

    h.session.play_track(track("a", 120)).unwrap();
    h.until("a loading", |s| {
        s.status == PlaybackStatus::Loading && s.track_id() == Some("a")
    })
    .await;

    h.session.play_track(track("b", 120)).unwrap();
    h.until_playing("b").await;

    gate.notify_one();
    h.settle().await;
    let snapshot = h.session.state();
    assert_eq!(snapshot.track_id(), Some("b"));
    assert!(snapshot.is_playing());

    // Coming back to the track fetches a fresh locator.
    h.session.play_track(track("a", 120)).unwrap();
    h.until_playing("a").await;
    assert_eq!(h.resolver.locator_calls("a"), 2);
}

#[tokio::test(start_paused = true)]
async fn unknown_track_surfaces_metadata_not_found() {
    let mut h = start(ScriptedResolver::with_tracks(&[]));

    h.session.play("missing").unwrap();
    let snapshot = h
        .until("error", |s| s.status == PlaybackStatus::Error)
        .await;

    let error = snapshot.error.unwrap();
    assert_eq!(error.kind(), ErrorKind::MetadataNotFound);
    assert_eq!(error.to_string(), "Could not find this track");
    assert_eq!(h.resolver.locator_calls("missing"), 0);
}

#[tokio::test(start_paused = true)]
async fn locator_failure_is_stream_unavailable_and_not_retried() {
    let resolver = ScriptedResolver::with_tracks(&[]).without_locator("a");
    let mut h = start(resolver);

    h.session.play_track(track("a", 120)).unwrap();
    let snapshot = h
        .until("error", |s| s.status == PlaybackStatus::Error)
        .await;

    assert_eq!(snapshot.error.unwrap().kind(), ErrorKind::StreamUnavailable);
    h.settle().await;
    assert_eq!(h.resolver.locator_calls("a"), 1);
}

#[tokio::test(start_paused = true)]
async fn device_error_does_not_auto_advance() {
    let resolver = ScriptedResolver::with_tracks(&[]).with_broken_stream("a");
    let mut h = start(resolver);
    h.session.enqueue_track(track("a", 120)).unwrap();
    h.session.enqueue_track(track("b", 120)).unwrap();

    h.session.play_index(0).unwrap();
    let snapshot = h
        .until("error", |s| s.status == PlaybackStatus::Error)
        .await;
    assert_eq!(snapshot.error.unwrap().kind(), ErrorKind::DeviceError);

    tokio::time::sleep(std::time::Duration::from_secs(10)).await;
    let snapshot = h.session.state();
    assert_eq!(snapshot.status, PlaybackStatus::Error);
    assert_eq!(snapshot.track_id(), Some("a"));
    assert_eq!(snapshot.current_index, Some(0));

    // An explicit action recovers.
    h.session.next().unwrap();
    let snapshot = h.until_playing("b").await;
    assert!(snapshot.error.is_none());
}

#[tokio::test(start_paused = true)]
async fn retry_reloads_the_current_track() {
    let resolver = ScriptedResolver::with_tracks(&[]).without_locator("a");
    let mut h = start(resolver);

    h.session.play_track(track("a", 120)).unwrap();
    h.until("error", |s| s.status == PlaybackStatus::Error).await;

    h.session.retry().unwrap();
    h.settle().await;
    assert_eq!(h.resolver.locator_calls("a"), 2);
    assert_eq!(h.session.state().status, PlaybackStatus::Error);
}

#[tokio::test(start_paused = true)]
async fn pause_and_resume() {
    let mut h = start(ScriptedResolver::with_tracks(&[]));
    h.session.play_track(track("a", 120)).unwrap();
    h.until_playing("a").await;

    h.session.toggle_play_pause().unwrap();
    let paused = h
        .until("paused", |s| s.status == PlaybackStatus::Paused)
        .await;
    h.settle().await;
    let drift = h.session.state().playback.current_time - paused.playback.current_time;
    assert!(drift.abs() <= 0.25, "clock kept running while paused: {drift}");

    h.session.toggle_play_pause().unwrap();
    h.until_playing("a").await;
}

#[tokio::test(start_paused = true)]
async fn speed_is_clamped() {
    let mut h = start(ScriptedResolver::with_tracks(&[]));

    h.session.set_speed(3.0).unwrap();
    h.until("max speed", |s| s.playback.speed == 2.0).await;

    h.session.set_speed(0.1).unwrap();
    h.until("min speed", |s| s.playback.speed == 0.5).await;
}

#[tokio::test(start_paused = true)]
async fn like_resets_when_the_track_changes() {
    let mut h = start(ScriptedResolver::with_tracks(&[]));
    h.session.enqueue_track(track("a", 120)).unwrap();
    h.session.enqueue_track(track("b", 120)).unwrap();
    h.session.play_index(0).unwrap();
    h.until_playing("a").await;

    h.session.toggle_like().unwrap();
    h.until("liked", |s| s.liked).await;

    h.session.next().unwrap();
    let snapshot = h.until_playing("b").await;
    assert!(!snapshot.liked);
}

#[tokio::test(start_paused = true)]
async fn enqueue_by_id_resolves_metadata_and_skips_unknown_ids() {
    let mut h = start(ScriptedResolver::with_tracks(&[track("a", 90)]));

    h.session.enqueue("nope").unwrap();
    h.session.enqueue("a").unwrap();
    let snapshot = h.until("enqueued", |s| s.queue.len() == 1).await;
    assert_eq!(snapshot.queue[0].title, "Title a");

    h.settle().await;
    assert_eq!(h.session.state().queue.len(), 1);
    assert_eq!(h.session.state().status, PlaybackStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn next_after_ad_hoc_play_starts_the_queue() {
    let mut h = start(ScriptedResolver::with_tracks(&[]));
    h.session.enqueue_track(track("a", 120)).unwrap();
    h.session.enqueue_track(track("b", 120)).unwrap();

    h.session.play_track(track("x", 120)).unwrap();
    let snapshot = h.until_playing("x").await;
    assert_eq!(snapshot.current_index, None);

    h.session.next().unwrap();
    let snapshot = h.until_playing("a").await;
    assert_eq!(snapshot.current_index, Some(0));
}

#[tokio::test(start_paused = true)]
async fn removing_before_the_cursor_keeps_the_current_track() {
    let mut h = start(ScriptedResolver::with_tracks(&[]));
    for id in ["a", "b", "c"] {
        h.session.enqueue_track(track(id, 120)).unwrap();
    }
    h.session.play_index(2).unwrap();
    h.until_playing("c").await;

    h.session.remove(0).unwrap();
    let snapshot = h.until("removed", |s| s.queue.len() == 2).await;
    assert_eq!(snapshot.current_index, Some(1));
    assert_eq!(snapshot.track_id(), Some("c"));
}

#[tokio::test(start_paused = true)]
async fn shuffle_stays_within_the_queue() {
    let mut h = start(ScriptedResolver::with_tracks(&[]));
    for id in ["a", "b", "c"] {
        h.session.enqueue_track(track(id, 120)).unwrap();
    }
    h.session.set_shuffle(true).unwrap();
    h.session.play_index(0).unwrap();
    h.until_playing("a").await;

    for _ in 0..5 {
        h.session.next().unwrap();
        let snapshot = h
            .until("shuffled track playing", |s| s.is_playing())
            .await;
        let index = snapshot.current_index.unwrap();
        assert_eq!(snapshot.track_id(), Some(snapshot.queue[index].id.as_str()));
    }
}

#[tokio::test(start_paused = true)]
async fn search_does_not_touch_session_state() {
    let h = start(ScriptedResolver::with_tracks(&[track("a", 90), track("b", 90)]));

    let found = h.session.search("Title b").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, "b");
    assert!(h.session.state().queue.is_empty());
}

#[tokio::test(start_paused = true)]
async fn close_shuts_the_session_down() {
    let mut h = start(ScriptedResolver::with_tracks(&[]));
    h.session.play_track(track("a", 120)).unwrap();
    h.until_playing("a").await;

    h.session.close().unwrap();
    h.session.closed().await;
    assert!(h.session.is_closed());
    assert!(h.session.play("a").is_err());
}

#[tokio::test(start_paused = true)]
async fn resuming_after_the_queue_ends_plays_from_the_top() {
    let mut h = start(ScriptedResolver::with_tracks(&[]));
    h.session.enqueue_track(track("a", 2)).unwrap();
    h.session.play_index(0).unwrap();
    h.until_playing("a").await;
    h.until("parked at the end", |s| s.status == PlaybackStatus::Paused)
        .await;

    h.session.toggle_play_pause().unwrap();
    let snapshot = h
        .until("rewound", |s| s.is_playing() && s.playback.current_time < 2.0)
        .await;
    assert_eq!(snapshot.track_id(), Some("a"));

    // The device really plays again: the track runs out a second time.
    h.until("parked again", |s| s.status == PlaybackStatus::Paused)
        .await;
    assert_eq!(h.resolver.locator_calls("a"), 1);
}

#[tokio::test(start_paused = true)]
async fn seek_while_loading_is_kept_once_playback_starts() {
    let resolver = ScriptedResolver::with_tracks(&[]);
    let gate = resolver.gate("a");
    let mut h = start(resolver);

    h.session.play_track(track("a", 120)).unwrap();
    h.until("a loading", |s| s.status == PlaybackStatus::Loading)
        .await;
    h.session.seek(30.0).unwrap();
    h.until("seek recorded", |s| s.playback.current_time == 30.0)
        .await;

    gate.notify_one();
    h.until_playing("a").await;
    h.settle().await;
    let time = h.session.state().playback.current_time;
    assert!((30.0..=32.0).contains(&time), "playback started from {time}");
}

#[tokio::test(start_paused = true)]
async fn previous_at_exactly_three_seconds_moves_back() {
    let mut h = start(ScriptedResolver::with_tracks(&[]));
    h.session.enqueue_track(track("a", 120)).unwrap();
    h.session.enqueue_track(track("b", 120)).unwrap();
    h.session.play_index(1).unwrap();
    h.until_playing("b").await;

    h.session.toggle_play_pause().unwrap();
    h.session.seek(3.0).unwrap();
    h.until("paused at three seconds", |s| {
        s.status == PlaybackStatus::Paused && s.playback.current_time == 3.0
    })
    .await;

    h.session.previous().unwrap();
    let snapshot = h.until_playing("a").await;
    assert_eq!(snapshot.current_index, Some(0));
}

#[tokio::test(start_paused = true)]
async fn previous_from_the_first_track_wraps_under_repeat_all() {
    let mut h = start(ScriptedResolver::with_tracks(&[]));
    h.session.enqueue_track(track("a", 120)).unwrap();
    h.session.enqueue_track(track("b", 120)).unwrap();
    h.session.set_repeat(RepeatMode::All).unwrap();
    h.session.play_index(0).unwrap();
    h.until_playing("a").await;
    h.until("one second in", |s| s.playback.current_time >= 1.0)
        .await;

    h.session.previous().unwrap();
    let snapshot = h.until_playing("b").await;
    assert_eq!(snapshot.current_index, Some(1));
}
