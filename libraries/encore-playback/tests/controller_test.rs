//! Session controller tests
//!
//! Run the full session task against mock resources with paused time.

mod common;

use common::{
    memory_store, spawn_session, track, CountingStore, FailingStore, MockFactory,
    RecordingNavigator, StaticProvider, TestSession,
};
use encore_core::TrackId;
use encore_playback::{
    ErrorKind, ExpandedView, InlineView, MiniBar, PlaybackError, PlaybackStatus, ResourceEvent,
    SessionConfig, SessionController, SessionParts, SessionViewModel, ViewAdapter,
};
use encore_storage::playback_session::KEY_POSITION;
use encore_storage::{SessionPatch, SessionStore};
use std::sync::Arc;
use std::time::Duration;

// ===== Helpers =====

fn provider() -> StaticProvider {
    StaticProvider::new()
        .with(track("a1"))
        .with(track("a2"))
        .with(track("b1"))
}

fn id(raw: &str) -> TrackId {
    TrackId::new(raw)
}

async fn playing(session: &TestSession, raw: &str) -> Arc<SessionViewModel> {
    let expected = id(raw);
    session
        .handle
        .wait_for(|view| view.track_id.as_ref() == Some(&expected) && view.is_playing())
        .await
        .unwrap()
}

async fn started(raw: &str) -> TestSession {
    let session = spawn_session(MockFactory::new(), provider(), memory_store());
    session.handle.set_current_track(id(raw)).unwrap();
    playing(&session, raw).await;
    session
}

// ===== Track binding =====

#[tokio::test(start_paused = true)]
async fn binds_track_and_autoplays() {
    let session = started("a1").await;

    let view = session.handle.snapshot().await.unwrap();
    assert_eq!(view.title(), "Song a1");
    assert_eq!(view.duration_seconds, Some(200.0));
    assert_eq!(session.factory.live(), 1);
    assert_eq!(session.factory.last().plays(), 1);

    let persisted = session.store.load().unwrap().unwrap();
    assert_eq!(persisted.last_played, id("a1"));
}

#[tokio::test(start_paused = true)]
async fn switching_tracks_leaves_one_live_resource() {
    let session = started("a1").await;

    session.handle.set_current_track(id("b1")).unwrap();
    playing(&session, "b1").await;

    assert_eq!(session.factory.live(), 1);
    assert!(session.factory.resource(0).released());
    assert_eq!(session.factory.last().url(), "https://cdn/b1/320.mp4");

    // Nothing the old resource says may reach the new session
    session.handle.set_next_track(Some(id("a2"))).unwrap();
    session.factory.resource(0).emit(ResourceEvent::TimeUpdate {
        position_seconds: 99.0,
    });
    session.factory.resource(0).emit(ResourceEvent::Ended);

    let view = session.handle.snapshot().await.unwrap();
    assert_eq!(view.track_id, Some(id("b1")));
    assert_eq!(view.status, PlaybackStatus::Playing);
    assert!(view.position_seconds < 99.0);
    assert!(session.navigator.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn slow_resolution_of_replaced_track_is_discarded() {
    let slow = StaticProvider::new()
        .with_delay(track("a1"), Duration::from_millis(500))
        .with(track("b1"));
    let session = spawn_session(MockFactory::new(), slow, memory_store());

    session.handle.set_current_track(id("a1")).unwrap();
    session.handle.set_current_track(id("b1")).unwrap();
    playing(&session, "b1").await;

    tokio::time::sleep(Duration::from_secs(1)).await;

    let view = session.handle.snapshot().await.unwrap();
    assert_eq!(view.track_id, Some(id("b1")));
    assert_eq!(view.title(), "Song b1");
    assert_eq!(session.factory.created(), 1);
    assert_eq!(session.factory.live(), 1);
}

#[tokio::test(start_paused = true)]
async fn rebinding_the_same_track_is_a_no_op() {
    let session = started("a1").await;

    session.handle.set_current_track(id("a1")).unwrap();
    session.handle.snapshot().await.unwrap();

    assert_eq!(session.factory.created(), 1);
}

#[tokio::test(start_paused = true)]
async fn last_played_is_persisted_before_resolution() {
    let slow = StaticProvider::new().with_delay(track("a1"), Duration::from_secs(10));
    let session = spawn_session(MockFactory::new(), slow, memory_store());

    session.handle.set_current_track(id("a1")).unwrap();
    let view = session.handle.snapshot().await.unwrap();

    assert_eq!(view.status, PlaybackStatus::Loading);
    assert_eq!(view.track_id, Some(id("a1")));
    assert_eq!(session.store.load().unwrap().unwrap().last_played, id("a1"));
}

// ===== Restore =====

#[tokio::test(start_paused = true)]
async fn position_is_restored_only_for_last_played_track() {
    let store = memory_store();
    store
        .save(&SessionPatch::new().last_played(id("a1")).position(42.0))
        .unwrap();
    let session = spawn_session(MockFactory::new(), provider(), store);

    session.handle.set_current_track(id("a1")).unwrap();
    playing(&session, "a1").await;
    assert_eq!(session.factory.last().seeks(), vec![43.0]);

    session.handle.set_current_track(id("b1")).unwrap();
    let view = playing(&session, "b1").await;
    assert!(session.factory.last().seeks().is_empty());
    assert!(view.position_seconds < 1.0);
}

#[tokio::test(start_paused = true)]
async fn binding_another_track_resets_saved_position() {
    let store = memory_store();
    store
        .save(&SessionPatch::new().last_played(id("a1")).position(150.0))
        .unwrap();

    let first = spawn_session(MockFactory::new(), provider(), store.clone());
    first.handle.set_current_track(id("b1")).unwrap();
    first.handle.pause().unwrap();
    first.handle.snapshot().await.unwrap();
    first.handle.shutdown().unwrap();

    let persisted = store.load().unwrap().unwrap();
    assert_eq!(persisted.last_played, id("b1"));
    assert_eq!(persisted.position_seconds, 0.0);

    let second = spawn_session(MockFactory::new(), provider(), store);
    second.handle.set_current_track(id("b1")).unwrap();
    second
        .handle
        .wait_for(|view| view.status == PlaybackStatus::Ready)
        .await
        .unwrap();
    assert!(second.factory.last().seeks().is_empty());
}

#[tokio::test(start_paused = true)]
async fn paused_intent_is_respected() {
    let store = memory_store();
    store
        .save(&SessionPatch::new().last_played(id("a1")).play_intent(false))
        .unwrap();
    let session = spawn_session(MockFactory::new(), provider(), store);

    session.handle.set_current_track(id("a1")).unwrap();
    session
        .handle
        .wait_for(|view| view.status == PlaybackStatus::Ready)
        .await
        .unwrap();
    assert_eq!(session.factory.last().plays(), 0);

    session.handle.play().unwrap();
    playing(&session, "a1").await;
    assert!(session.store.load().unwrap().unwrap().play_intent);
}

#[tokio::test(start_paused = true)]
async fn volume_and_loop_are_global() {
    let session = started("a1").await;

    session.handle.set_volume(0.4).unwrap();
    session.handle.set_loop(true).unwrap();
    session.handle.snapshot().await.unwrap();

    let persisted = session.store.load().unwrap().unwrap();
    assert_eq!(persisted.volume, 0.4);
    assert!(persisted.looping);

    session.handle.set_current_track(id("b1")).unwrap();
    let view = playing(&session, "b1").await;
    assert_eq!(view.volume, 0.4);
    assert!(view.looping);
    assert_eq!(session.factory.last().gain(), 0.4);
    assert!(session.factory.last().looping());
}

// ===== Transport =====

#[tokio::test(start_paused = true)]
async fn pause_twice_has_one_effect() {
    let session = started("a1").await;

    session.handle.pause().unwrap();
    session.handle.pause().unwrap();
    let view = session.handle.snapshot().await.unwrap();

    assert_eq!(view.status, PlaybackStatus::Paused);
    assert_eq!(session.factory.last().pauses(), 1);
    assert!(!session.store.load().unwrap().unwrap().play_intent);
}

#[tokio::test(start_paused = true)]
async fn toggle_play_pause() {
    let session = started("a1").await;

    session.handle.toggle_play_pause().unwrap();
    let view = session.handle.snapshot().await.unwrap();
    assert_eq!(view.status, PlaybackStatus::Paused);

    session.handle.toggle_play_pause().unwrap();
    playing(&session, "a1").await;
}

#[tokio::test(start_paused = true)]
async fn rapid_seeks_apply_once() {
    let session = started("a1").await;

    session.handle.seek(10.0).unwrap();
    session.handle.seek(20.0).unwrap();
    session.handle.seek(30.0).unwrap();
    let view = session.handle.snapshot().await.unwrap();

    assert_eq!(view.position_seconds, 30.0);
    assert!(session.factory.last().seeks().is_empty());

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(session.factory.last().seeks(), vec![30.0]);

    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(
        session.store.load().unwrap().unwrap().position_seconds,
        30.0
    );
}

#[tokio::test(start_paused = true)]
async fn scrubbing_writes_position_at_most_once_per_second() {
    let counting = CountingStore::new();
    let session = spawn_session(
        MockFactory::new(),
        provider(),
        SessionStore::new(counting.clone()),
    );
    session.handle.set_current_track(id("a1")).unwrap();
    playing(&session, "a1").await;
    session.handle.pause().unwrap();
    session.handle.snapshot().await.unwrap();
    let before = counting.writes(KEY_POSITION);

    for step in 0..17 {
        session.handle.seek(10.0 + f64::from(step)).unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
    }
    let during = counting.writes(KEY_POSITION) - before;
    assert!(during <= 2, "{} position writes while scrubbing", during);

    // The last position still lands once the interval has passed
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(
        session.store.load().unwrap().unwrap().position_seconds,
        26.0
    );
    assert!(counting.writes(KEY_POSITION) - before <= 2);
}

#[tokio::test(start_paused = true)]
async fn mute_keeps_volume() {
    let session = started("a1").await;

    session.handle.set_volume(0.6).unwrap();
    session.handle.toggle_mute().unwrap();
    let view = session.handle.snapshot().await.unwrap();

    assert!(view.muted);
    assert_eq!(view.volume, 0.6);
    assert_eq!(session.factory.last().gain(), 0.0);

    session.handle.unmute().unwrap();
    session.handle.snapshot().await.unwrap();
    assert_eq!(session.factory.last().gain(), 0.6);
}

#[tokio::test(start_paused = true)]
async fn unmuting_silence_persists_restored_volume() {
    let session = started("a1").await;

    session.handle.set_volume(0.0).unwrap();
    session.handle.mute().unwrap();
    session.handle.unmute().unwrap();
    let view = session.handle.snapshot().await.unwrap();

    assert_eq!(view.volume, 0.5);
    assert_eq!(session.store.load().unwrap().unwrap().volume, 0.5);
}

#[tokio::test(start_paused = true)]
async fn pause_persists_current_position() {
    let session = started("a1").await;

    session.factory.last().emit(ResourceEvent::TimeUpdate {
        position_seconds: 42.0,
    });
    session.handle.pause().unwrap();
    session.handle.snapshot().await.unwrap();

    assert_eq!(
        session.store.load().unwrap().unwrap().position_seconds,
        42.0
    );
}

// ===== Position persistence =====

#[tokio::test(start_paused = true)]
async fn position_is_persisted_about_once_per_second() {
    let session = started("a1").await;
    let saved = |store: &SessionStore| store.load().unwrap().unwrap().position_seconds;

    session.factory.last().emit(ResourceEvent::TimeUpdate {
        position_seconds: 12.0,
    });
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(saved(&session.store), 12.0);

    session.factory.last().emit(ResourceEvent::TimeUpdate {
        position_seconds: 13.0,
    });
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(saved(&session.store), 12.0);

    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert_eq!(saved(&session.store), 13.0);
}

#[tokio::test(start_paused = true)]
async fn nothing_is_persisted_while_paused() {
    let session = started("a1").await;
    session.handle.pause().unwrap();
    session.handle.snapshot().await.unwrap();

    session.factory.last().emit(ResourceEvent::TimeUpdate {
        position_seconds: 50.0,
    });
    tokio::time::sleep(Duration::from_secs(3)).await;

    assert!(session.store.load().unwrap().unwrap().position_seconds < 50.0);
}

// ===== End of track =====

#[tokio::test(start_paused = true)]
async fn natural_end_persists_full_duration() {
    let session = started("a1").await;

    session.factory.last().emit(ResourceEvent::TimeUpdate {
        position_seconds: 190.0,
    });
    session.factory.last().emit(ResourceEvent::Ended);
    session.handle.snapshot().await.unwrap();

    assert_eq!(
        session.store.load().unwrap().unwrap().position_seconds,
        200.0
    );
}

#[tokio::test(start_paused = true)]
async fn ended_track_navigates_to_next_exactly_once() {
    let session = started("a1").await;
    session.handle.set_next_track(Some(id("a2"))).unwrap();

    session.factory.last().emit(ResourceEvent::Ended);
    session.factory.last().emit(ResourceEvent::Ended);
    let view = session.handle.snapshot().await.unwrap();

    assert_eq!(view.status, PlaybackStatus::Ended);
    assert_eq!(session.navigator.calls(), vec![id("a2")]);
}

#[tokio::test(start_paused = true)]
async fn ended_track_without_next_stays_ended() {
    let session = started("a1").await;

    session.factory.last().emit(ResourceEvent::Ended);
    let view = session.handle.snapshot().await.unwrap();

    assert_eq!(view.status, PlaybackStatus::Ended);
    assert!(session.navigator.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn looping_track_restarts_without_navigation() {
    let session = started("a1").await;
    session.handle.set_loop(true).unwrap();
    session.handle.set_next_track(Some(id("a2"))).unwrap();

    session.factory.last().emit(ResourceEvent::Ended);
    let view = session.handle.snapshot().await.unwrap();

    assert_eq!(view.status, PlaybackStatus::Playing);
    assert_eq!(view.position_seconds, 0.0);
    assert!(session.navigator.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn next_track_is_cleared_on_attach() {
    let session = started("a1").await;
    session.handle.set_next_track(Some(id("a2"))).unwrap();

    session.handle.set_current_track(id("b1")).unwrap();
    let view = playing(&session, "b1").await;
    assert_eq!(view.next_track, None);
}

// ===== Errors =====

#[tokio::test(start_paused = true)]
async fn unknown_track_shows_resolution_notice() {
    let session = spawn_session(MockFactory::new(), provider(), memory_store());

    session.handle.set_current_track(id("zz")).unwrap();
    let view = session
        .handle
        .wait_for(|view| view.status == PlaybackStatus::Errored)
        .await
        .unwrap();

    assert_eq!(view.notice.as_ref().map(|n| n.kind), Some(ErrorKind::Resolution));
    assert_eq!(session.factory.created(), 0);

    session.handle.dismiss_notice().unwrap();
    let view = session.handle.snapshot().await.unwrap();
    assert!(view.notice.is_none());
    assert_eq!(view.status, PlaybackStatus::Errored);
}

#[tokio::test(start_paused = true)]
async fn empty_track_id_is_rejected() {
    let session = spawn_session(MockFactory::new(), provider(), memory_store());

    session.handle.set_current_track(id("")).unwrap();
    let view = session.handle.snapshot().await.unwrap();

    assert_eq!(view.status, PlaybackStatus::Idle);
    assert_eq!(view.notice.as_ref().map(|n| n.kind), Some(ErrorKind::Resolution));
    assert!(session.store.load().unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn blocked_play_offers_tap_to_play() {
    let session = spawn_session(MockFactory::blocking(), provider(), memory_store());

    session.handle.set_current_track(id("a1")).unwrap();
    let view = session
        .handle
        .wait_for(|view| view.notice.is_some())
        .await
        .unwrap();

    assert!(view.notice.as_ref().unwrap().is_tap_to_play());
    assert_eq!(view.status, PlaybackStatus::Paused);
    assert!(MiniBar::new(session.handle.clone())
        .render()
        .contains("tap to play"));
}

#[tokio::test(start_paused = true)]
async fn resource_failure_is_terminal() {
    let session = started("a1").await;

    session
        .factory
        .last()
        .emit(ResourceEvent::Error("network lost".into()));
    let view = session.handle.snapshot().await.unwrap();
    assert_eq!(view.status, PlaybackStatus::Errored);
    assert_eq!(
        view.notice.as_ref().map(|n| n.kind),
        Some(ErrorKind::PlaybackFailure)
    );

    session.handle.play().unwrap();
    let view = session.handle.snapshot().await.unwrap();
    assert_eq!(view.status, PlaybackStatus::Errored);
    assert_eq!(session.factory.last().plays(), 1);
}

#[tokio::test(start_paused = true)]
async fn unavailable_store_does_not_stop_playback() {
    let store = SessionStore::new(Arc::new(FailingStore));
    let session = spawn_session(MockFactory::new(), provider(), store);

    session.handle.set_current_track(id("a1")).unwrap();
    playing(&session, "a1").await;

    session.handle.set_volume(0.2).unwrap();
    session.handle.toggle_like().unwrap();
    let view = session.handle.snapshot().await.unwrap();

    assert!(view.is_playing());
    assert!(!view.liked);
    assert!(view.notice.is_none());
}

// ===== Likes and clear =====

#[tokio::test(start_paused = true)]
async fn clear_releases_and_forgets_session() {
    let session = started("a1").await;
    session.handle.toggle_like().unwrap();
    session.handle.expand().unwrap();
    let view = session.handle.snapshot().await.unwrap();
    assert!(view.liked);
    assert!(view.expanded);

    session.handle.clear().unwrap();
    let view = session.handle.snapshot().await.unwrap();

    assert_eq!(view.status, PlaybackStatus::Idle);
    assert_eq!(view.track_id, None);
    assert_eq!(view.metadata, None);
    assert!(!view.liked);
    assert!(!view.expanded);
    assert_eq!(session.factory.live(), 0);
    assert!(session.store.load().unwrap().is_none());

    // Likes outlive the session
    assert!(session.store.is_liked(&id("a1")).unwrap());
}

#[tokio::test(start_paused = true)]
async fn liked_flag_follows_the_track() {
    let session = started("a1").await;
    session.handle.toggle_like().unwrap();
    assert!(session.handle.snapshot().await.unwrap().liked);

    session.handle.set_current_track(id("b1")).unwrap();
    let view = playing(&session, "b1").await;
    assert!(!view.liked);

    session.handle.set_current_track(id("a1")).unwrap();
    let view = playing(&session, "a1").await;
    assert!(view.liked);
}

// ===== View adapters =====

#[tokio::test(start_paused = true)]
async fn adapters_observe_the_same_view_model() {
    let session = started("a1").await;
    let bar = MiniBar::new(session.handle.clone());
    let expanded = ExpandedView::new(session.handle.clone());
    let inline = InlineView::new(session.handle.clone(), id("a1"));

    bar.expand().unwrap();
    session.handle.snapshot().await.unwrap();

    assert!(Arc::ptr_eq(&bar.current(), &expanded.current()));
    assert!(Arc::ptr_eq(&bar.current(), &inline.current()));
    assert!(expanded.is_open());
    assert!(inline.is_current());

    assert!(bar.render().contains("Song a1 - Arijit Singh"));
    assert!(expanded.render().contains("loop: off"));
    assert!(inline.render().contains("Song a1"));

    expanded.collapse().unwrap();
    session.handle.snapshot().await.unwrap();
    assert!(!expanded.is_open());
}

#[tokio::test(start_paused = true)]
async fn inline_view_binds_its_track() {
    let session = started("a1").await;
    let page = InlineView::new(session.handle.clone(), id("b1"));
    assert!(!page.is_current());
    assert_eq!(page.render(), "b1 (not playing)");

    page.play().unwrap();
    playing(&session, "b1").await;
    assert!(page.is_current());
}

#[tokio::test(start_paused = true)]
async fn view_updates_are_atomic() {
    let session = spawn_session(MockFactory::new(), provider(), memory_store());
    let mut rx = session.handle.subscribe();

    session.handle.set_current_track(id("a1")).unwrap();
    session.handle.set_current_track(id("b1")).unwrap();

    // Every published view is internally consistent
    loop {
        rx.changed().await.unwrap();
        let view = rx.borrow_and_update().clone();
        if let Some(ref metadata) = view.metadata {
            assert_eq!(Some(&metadata.id), view.track_id.as_ref());
        }
        if view.track_id.is_none() {
            assert_eq!(view.status, PlaybackStatus::Idle);
        }
        if view.track_id == Some(id("b1")) && view.is_playing() {
            break;
        }
    }
}

// ===== Shutdown =====

#[tokio::test(start_paused = true)]
async fn shutdown_releases_the_resource() {
    let factory = MockFactory::new();
    let (handle, task) = SessionController::spawn(SessionParts {
        factory: factory.clone(),
        provider: Arc::new(provider()),
        store: memory_store(),
        navigator: RecordingNavigator::new(),
        config: SessionConfig::default(),
    });

    handle.set_current_track(id("a1")).unwrap();
    handle.wait_for(|view| view.is_playing()).await.unwrap();

    handle.shutdown().unwrap();
    task.await.unwrap();

    assert_eq!(factory.live(), 0);
    assert!(matches!(handle.play(), Err(PlaybackError::SessionClosed)));
}
