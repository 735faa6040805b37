//! End-to-end behaviour of the player service with in-memory collaborators

mod common;

use clrplayer::{
    Artwork, MetadataRecord, PlaybackState, PlayerError, PlayerEvent, RemoteCommand,
    RouteChangeReason, SessionCategory, SessionEvent, StreamId,
};
use common::*;
use std::sync::atomic::Ordering;
use std::time::Duration;

fn show_a() -> StreamId {
    StreamId::new(SHOW_A)
}

fn show_b() -> StreamId {
    StreamId::new(SHOW_B)
}

#[tokio::test]
async fn test_play_pause_parity() {
    let harness = Harness::new(MockArtwork::immediate(Artwork::Placeholder));
    let (player, _task) = harness.spawn();

    let mut plays = 0i32;
    let mut pauses = 0i32;
    for step in [true, true, false, true, false, false, true, false] {
        let snapshot = if step {
            plays += 1;
            player.play_live().await.unwrap()
        } else {
            pauses += 1;
            player.pause().await.unwrap()
        };
        assert_eq!(snapshot.is_playing, step, "after {plays} plays / {pauses} pauses");
    }

    let snapshot = player.toggle().await.unwrap();
    assert!(snapshot.is_playing);
    let snapshot = player.toggle().await.unwrap();
    assert!(!snapshot.is_playing);
    assert_eq!(snapshot.state, PlaybackState::LivePaused);
    assert_eq!(harness.backend.open_count(), 1);
    assert_eq!(
        harness.backend.last().url.as_str(),
        url::Url::parse(LIVE_URL).unwrap().as_str()
    );
}

#[tokio::test]
async fn test_engine_configures_session_and_activates_on_play() {
    let harness = Harness::new(MockArtwork::immediate(Artwork::Placeholder));
    harness.session.fail.store(true, Ordering::SeqCst);
    let (player, _task) = harness.spawn();

    let snapshot = player.play_live().await.unwrap();

    assert!(snapshot.is_playing);
    assert_eq!(
        *harness.session.configured.lock().unwrap(),
        vec![SessionCategory::Playback]
    );
    assert_eq!(harness.session.activations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_metadata_builds_label_and_fetches_artwork() {
    let harness = Harness::new(MockArtwork::immediate(test_artwork()));
    let (player, _task) = harness.spawn();
    player.play_live().await.unwrap();

    harness.backend.last().emit(vec![
        MetadataRecord::title("Song Title"),
        MetadataRecord::artist("Artist Name"),
    ]);

    let snapshot = wait_for(&player, |s| s.artwork.is_some()).await;
    assert_eq!(snapshot.track_label(), Some("Artist Name — Song Title"));
    assert_eq!(snapshot.artwork, Some(harness.artwork.artwork.clone()));
    assert_eq!(
        *harness.artwork.calls.lock().unwrap(),
        vec![(Some("Artist Name".to_string()), "Song Title".to_string())]
    );
}

#[tokio::test]
async fn test_artist_only_metadata_skips_artwork() {
    let harness = Harness::new(MockArtwork::immediate(test_artwork()));
    let (player, _task) = harness.spawn();
    player.play_live().await.unwrap();

    harness.backend.last().emit(vec![MetadataRecord::artist("Artist Name")]);

    let snapshot = wait_for(&player, |s| s.track_label().is_some()).await;
    assert_eq!(snapshot.track_label(), Some("Artist Name"));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(harness.artwork.call_count(), 0);
    assert_eq!(player.snapshot().artwork, None);
}

#[tokio::test]
async fn test_same_stream_twice_is_noop() {
    let harness = Harness::new(MockArtwork::immediate(test_artwork()));
    let (player, _task) = harness.spawn();

    player.play_stream(show_a()).await.unwrap();
    harness.backend.last().emit(vec![MetadataRecord::title("Song")]);
    let before = wait_for(&player, |s| s.artwork.is_some()).await;

    let after = player.play_stream(show_a()).await.unwrap();

    assert_eq!(after.state, before.state);
    assert_eq!(after.track, before.track);
    assert_eq!(after.artwork, before.artwork);
    assert_eq!(harness.backend.open_count(), 1);
}

#[tokio::test]
async fn test_switch_clears_label_and_artwork_before_new_metadata() {
    let harness = Harness::new(MockArtwork::immediate(test_artwork()));
    let (player, _task) = harness.spawn();

    player.play_stream(show_a()).await.unwrap();
    let first = harness.backend.last();
    first.emit(vec![MetadataRecord::title("Song A")]);
    wait_for(&player, |s| s.artwork.is_some()).await;

    let snapshot = player.play_stream(show_b()).await.unwrap();

    assert_eq!(snapshot.state, PlaybackState::ShowPlaying(show_b()));
    assert_eq!(snapshot.track_label(), None);
    assert_eq!(snapshot.artwork, None);
    assert!(first.is_disposed());

    // The old connection no longer feeds the engine
    first.emit(vec![MetadataRecord::title("Late Song A")]);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(player.snapshot().track_label(), None);
}

#[tokio::test]
async fn test_late_artwork_for_previous_stream_is_dropped() {
    let harness = Harness::new(MockArtwork::gated(test_artwork()));
    let (player, _task) = harness.spawn();

    player.play_stream(show_a()).await.unwrap();
    harness.backend.last().emit(vec![MetadataRecord::title("Song A")]);
    wait_for(&player, |s| s.track_label() == Some("Song A")).await;
    eventually(|| harness.artwork.call_count() == 1).await;

    player.play_stream(show_b()).await.unwrap();
    harness.artwork.release(1);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(player.snapshot().artwork, None);

    // A lookup for the current stream still lands
    harness.backend.last().emit(vec![MetadataRecord::title("Song B")]);
    eventually(|| harness.artwork.call_count() == 2).await;
    harness.artwork.release(1);
    let snapshot = wait_for(&player, |s| s.artwork.is_some()).await;
    assert_eq!(snapshot.track_label(), Some("Song B"));
}

#[tokio::test]
async fn test_restore_live_when_live_playing_pauses() {
    let harness = Harness::new(MockArtwork::immediate(Artwork::Placeholder));
    let (player, _task) = harness.spawn();
    player.play_live().await.unwrap();

    let snapshot = player.restore_live().await.unwrap();

    assert!(!snapshot.is_playing);
    assert_eq!(snapshot.current_stream, Some(StreamId::live()));
    assert_eq!(harness.backend.open_count(), 1);
}

#[tokio::test]
async fn test_restore_live_from_show_arms_live_silently() {
    let harness = Harness::new(MockArtwork::immediate(Artwork::Placeholder));
    let (player, _task) = harness.spawn();
    player.play_stream(show_a()).await.unwrap();

    let snapshot = player.restore_live().await.unwrap();
    assert_eq!(snapshot.state, PlaybackState::PreparingLive);
    assert!(!snapshot.is_playing);
    let live = harness.backend.last();
    assert!(!live.is_playing());

    let snapshot = player.play_live().await.unwrap();
    assert_eq!(snapshot.state, PlaybackState::LivePlaying);
    assert!(live.is_playing());
    assert_eq!(harness.backend.open_count(), 2);
}

#[tokio::test]
async fn test_stop_from_every_reachable_state() {
    let harness = Harness::new(MockArtwork::immediate(test_artwork()));
    let (player, _task) = harness.spawn();

    let setups: Vec<Vec<&str>> = vec![
        vec![],
        vec!["live"],
        vec!["live", "pause"],
        vec!["show"],
        vec!["show", "pause"],
        vec!["show", "restore"],
    ];

    for setup in setups {
        for step in &setup {
            match *step {
                "live" => player.play_live().await.unwrap(),
                "show" => player.play_stream(show_a()).await.unwrap(),
                "pause" => player.pause().await.unwrap(),
                "restore" => player.restore_live().await.unwrap(),
                _ => unreachable!(),
            };
        }
        if setup.first().is_some() {
            harness.backend.last().emit(vec![MetadataRecord::title("Song")]);
            wait_for(&player, |s| s.track_label().is_some()).await;
        }

        let snapshot = player.stop().await.unwrap();
        assert!(!snapshot.is_playing, "{setup:?}");
        assert_eq!(snapshot.current_stream, None, "{setup:?}");
        assert_eq!(snapshot.track_label(), None, "{setup:?}");
        assert_eq!(snapshot.artwork, None, "{setup:?}");
        assert_eq!(snapshot.state, PlaybackState::Idle, "{setup:?}");
    }
}

#[tokio::test]
async fn test_toggle_stream_row_behaviour() {
    let harness = Harness::new(MockArtwork::immediate(Artwork::Placeholder));
    let (player, _task) = harness.spawn();

    let snapshot = player.toggle_stream(show_a()).await.unwrap();
    assert_eq!(snapshot.playing_show_id(), Some(&show_a()));

    let snapshot = player.toggle_stream(show_b()).await.unwrap();
    assert_eq!(snapshot.playing_show_id(), Some(&show_b()));

    let snapshot = player.toggle_stream(show_b()).await.unwrap();
    assert_eq!(snapshot.state, PlaybackState::Idle);
}

#[tokio::test]
async fn test_seek_on_live_publishes_nothing() {
    let harness = Harness::new(MockArtwork::immediate(Artwork::Placeholder));
    let (player, _task) = harness.spawn();
    player.play_live().await.unwrap();
    let events = player.subscribe_events();

    player.seek_by(15.0).await.unwrap();
    player.seek_forward().await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(player.snapshot().seek.current_position_seconds, None);
    assert!(harness.backend.last().state.lock().unwrap().seeks.is_empty());
    assert!(events
        .try_iter()
        .all(|e| !matches!(e, PlayerEvent::SeekReadout { .. })));
}

#[tokio::test]
async fn test_seek_forward_and_clamp_to_duration() {
    let harness = Harness::new(MockArtwork::immediate(Artwork::Placeholder));
    let (player, _task) = harness.spawn();
    player.play_stream(show_a()).await.unwrap();
    let handle = harness.backend.last();

    handle.set_position(100.0);
    player.seek_forward().await.unwrap();
    let snapshot = wait_for(&player, |s| s.seek.current_position_seconds.is_some()).await;
    assert_eq!(snapshot.seek.current_position_seconds, Some(115.0));
    assert_eq!(handle.state.lock().unwrap().seeks, vec![(115.0, true)]);

    handle.set_position(190.0);
    player.seek_by(200.0).await.unwrap();
    let snapshot = wait_for(&player, |s| s.seek.current_position_seconds == Some(200.0)).await;
    assert!(snapshot.seek.current_position_seconds <= Some(SHOW_DURATION));

    handle.set_position(5.0);
    player.seek_backward().await.unwrap();
    wait_for(&player, |s| s.seek.current_position_seconds == Some(0.0)).await;
}

#[tokio::test]
async fn test_seek_readout_clears_itself() {
    let harness = Harness::new(MockArtwork::immediate(Artwork::Placeholder));
    let (player, _task) = harness.spawn();
    player.play_stream(show_a()).await.unwrap();
    harness.backend.last().set_position(30.0);

    player.seek_by(15.0).await.unwrap();
    wait_for(&player, |s| s.seek.current_position_seconds == Some(45.0)).await;
    wait_for(&player, |s| s.seek.current_position_seconds.is_none()).await;
}

#[tokio::test]
async fn test_readout_clears_when_next_seek_fails() {
    let harness = Harness::new(MockArtwork::immediate(Artwork::Placeholder));
    let (player, _task) = harness.spawn();
    player.play_stream(show_a()).await.unwrap();
    let handle = harness.backend.last();
    handle.set_position(100.0);

    player.seek_forward().await.unwrap();
    wait_for(&player, |s| s.seek.current_position_seconds == Some(115.0)).await;

    handle.state.lock().unwrap().refuse_seeks = true;
    player.seek_forward().await.unwrap();
    eventually(|| handle.state.lock().unwrap().seeks.len() == 2).await;

    wait_for(&player, |s| s.seek.current_position_seconds.is_none()).await;
    assert_eq!(handle.state.lock().unwrap().position, 115.0);
}

#[tokio::test]
async fn test_interruption_pauses_and_resumes() {
    let harness = Harness::new(MockArtwork::immediate(Artwork::Placeholder));
    let (player, _task) = harness.spawn();
    player.play_live().await.unwrap();
    eventually(|| harness.session.subscriber_count() == 1).await;

    harness.session.emit(SessionEvent::InterruptionBegan);
    wait_for(&player, |s| !s.is_playing).await;

    harness.session.emit(SessionEvent::InterruptionEnded {
        should_resume: true,
    });
    let snapshot = wait_for(&player, |s| s.is_playing).await;
    assert_eq!(snapshot.state, PlaybackState::LivePlaying);
}

#[tokio::test]
async fn test_interruption_without_resume_hint_stays_paused() {
    let harness = Harness::new(MockArtwork::immediate(Artwork::Placeholder));
    let (player, _task) = harness.spawn();
    player.play_stream(show_a()).await.unwrap();
    eventually(|| harness.session.subscriber_count() == 1).await;

    harness.session.emit(SessionEvent::InterruptionBegan);
    wait_for(&player, |s| !s.is_playing).await;
    harness.session.emit(SessionEvent::InterruptionEnded {
        should_resume: false,
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let snapshot = player.snapshot();
    assert_eq!(snapshot.state, PlaybackState::ShowPaused(show_a()));
}

#[tokio::test]
async fn test_lost_output_device_pauses() {
    let harness = Harness::new(MockArtwork::immediate(Artwork::Placeholder));
    let (player, _task) = harness.spawn();
    player.play_live().await.unwrap();
    eventually(|| harness.session.subscriber_count() == 1).await;

    harness
        .session
        .emit(SessionEvent::RouteChanged(RouteChangeReason::NewDeviceAvailable));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(player.snapshot().is_playing);

    harness
        .session
        .emit(SessionEvent::RouteChanged(RouteChangeReason::OldDeviceUnavailable));
    wait_for(&player, |s| s.state == PlaybackState::LivePaused).await;
}

#[tokio::test]
async fn test_remote_commands() {
    let harness = Harness::new(MockArtwork::immediate(Artwork::Placeholder));
    let (player, _task) = harness.spawn();
    eventually(|| harness.session.subscriber_count() == 1).await;

    harness.now_playing.remote(RemoteCommand::Play);
    wait_for(&player, |s| s.is_playing).await;

    harness.now_playing.remote(RemoteCommand::Pause);
    wait_for(&player, |s| !s.is_playing && s.current_stream.is_some()).await;

    harness.now_playing.remote(RemoteCommand::Toggle);
    wait_for(&player, |s| s.is_playing).await;
}

#[tokio::test]
async fn test_now_playing_updates() {
    let harness = Harness::new(MockArtwork::immediate(test_artwork()));
    let (player, _task) = harness.spawn();

    player.play_stream(show_a()).await.unwrap();
    let info = harness.now_playing.last().unwrap();
    assert_eq!(info.title, SHOW_A);
    assert_eq!(info.playback_rate, 1.0);
    assert_eq!(info.duration, Some(SHOW_DURATION));
    assert_eq!(info.artwork, None);

    harness.backend.last().emit(vec![
        MetadataRecord::artist("Band"),
        MetadataRecord::title("Tune"),
    ]);
    wait_for(&player, |s| s.artwork.is_some()).await;
    let info = harness.now_playing.last().unwrap();
    assert_eq!(info.title, "Band — Tune");
    assert!(info.artwork.is_some());

    let count = harness.now_playing.update_count();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(harness.now_playing.update_count(), count);

    harness.session.emit(SessionEvent::EnteredForeground);
    eventually(|| harness.now_playing.update_count() == count + 1).await;

    player.pause().await.unwrap();
    assert_eq!(harness.now_playing.last().unwrap().playback_rate, 0.0);

    player.stop().await.unwrap();
    assert_eq!(harness.now_playing.clears.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_events_follow_snapshots() {
    let harness = Harness::new(MockArtwork::immediate(Artwork::Placeholder));
    let (player, _task) = harness.spawn();
    let events = player.subscribe_events();

    player.play_live().await.unwrap();
    harness.backend.last().emit(vec![MetadataRecord::title("Song")]);
    wait_for(&player, |s| s.artwork.is_some()).await;
    player.stop().await.unwrap();

    let received: Vec<PlayerEvent> = events.try_iter().collect();
    assert!(matches!(
        received.first(),
        Some(PlayerEvent::StateChanged {
            state: PlaybackState::LivePlaying,
            is_playing: true
        })
    ));
    assert!(received
        .iter()
        .any(|e| matches!(e, PlayerEvent::TrackChanged { track } if track.title.as_deref() == Some("Song"))));
    assert!(received.contains(&PlayerEvent::ArtworkChanged {
        artwork: Some(Artwork::Placeholder)
    }));
    assert!(matches!(
        received.last(),
        Some(PlayerEvent::ArtworkChanged { artwork: None })
    ));
}

#[tokio::test]
async fn test_unplayable_stream_stays_preparing() {
    let harness = Harness::new(MockArtwork::immediate(Artwork::Placeholder));
    harness.backend.fail_open.store(true, Ordering::SeqCst);
    let (player, _task) = harness.spawn();

    let snapshot = player.play_stream(show_a()).await.unwrap();
    assert_eq!(snapshot.state, PlaybackState::PreparingShow(show_a()));
    assert!(!snapshot.is_playing);

    // Retrying once the backend recovers
    harness.backend.fail_open.store(false, Ordering::SeqCst);
    let snapshot = player.play_stream(show_a()).await.unwrap();
    assert_eq!(snapshot.state, PlaybackState::ShowPlaying(show_a()));
}

#[tokio::test]
async fn test_prepare_live_on_start() {
    let mut harness = Harness::new(MockArtwork::immediate(Artwork::Placeholder));
    harness.settings.prepare_live_on_start = true;
    let (player, _task) = harness.spawn();

    let snapshot = wait_for(&player, |s| s.state == PlaybackState::PreparingLive).await;
    assert!(!snapshot.is_playing);
    assert_eq!(snapshot.current_stream, Some(StreamId::live()));
    assert!(!harness.backend.last().is_playing());
}

#[tokio::test]
async fn test_shutdown_releases_everything() {
    let harness = Harness::new(MockArtwork::immediate(Artwork::Placeholder));
    let (player, task) = harness.spawn();
    player.play_live().await.unwrap();
    eventually(|| harness.session.subscriber_count() == 1).await;

    let snapshot = player.shutdown().await.unwrap();
    assert_eq!(snapshot.state, PlaybackState::Idle);
    tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .unwrap()
        .unwrap();

    assert!(harness.backend.last().is_disposed());
    assert_eq!(harness.session.subscriber_count(), 0);
    assert!(matches!(
        player.play_live().await,
        Err(PlayerError::ServiceStopped)
    ));
}

#[test]
fn test_dropping_handles_ends_service() {
    tokio_test::block_on(async {
        let harness = Harness::new(MockArtwork::immediate(Artwork::Placeholder));
        let (player, task) = harness.spawn();
        player.play_live().await.unwrap();
        drop(player);

        task.await.unwrap();
        assert!(harness.backend.last().is_disposed());
    });
}
