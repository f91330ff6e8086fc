//! Tests for the non-interactive player commands

use encore_cli::app::{Player, Start};
use encore_cli::config::PlayerConfig;
use encore_client::{ApiConfig, MetadataClient};
use encore_core::TrackId;
use encore_storage::{MemoryStore, RedbStore, SessionPatch, SessionStore};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn player(store: SessionStore) -> Player {
    let client = MetadataClient::new(ApiConfig::new("http://localhost:9")).unwrap();
    Player::with_parts(client, store, PlayerConfig::default())
}

fn memory_player() -> Player {
    player(SessionStore::new(Arc::new(MemoryStore::new())))
}

#[test]
fn test_status_without_session() {
    let player = memory_player();
    assert_eq!(player.status().unwrap(), "No saved session");
}

#[test]
fn test_status_describes_saved_session() {
    let player = memory_player();
    player
        .store()
        .save(
            &SessionPatch::new()
                .last_played(TrackId::new("yDeAS8Eh"))
                .position(75.0),
        )
        .unwrap();
    player.toggle_like(&TrackId::new("yDeAS8Eh")).unwrap();

    let status = player.status().unwrap();
    assert!(status.contains("last played: yDeAS8Eh"));
    assert!(status.contains("position:    1:15"));
    assert!(status.contains("liked:       yes"));
}

#[test]
fn test_like_toggles() {
    let player = memory_player();
    let id = TrackId::new("a1");

    assert!(player.toggle_like(&id).unwrap());
    assert!(!player.toggle_like(&id).unwrap());
}

#[test]
fn test_clear_forgets_session() {
    let player = memory_player();
    player
        .store()
        .save(&SessionPatch::new().last_played(TrackId::new("a1")))
        .unwrap();

    player.clear().unwrap();
    assert!(player.store().load().unwrap().is_none());
}

#[test]
fn test_session_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("encore.redb");

    {
        let store = SessionStore::new(Arc::new(RedbStore::open(&path).unwrap()));
        store
            .save(&SessionPatch::new().last_played(TrackId::new("a1")).position(12.0))
            .unwrap();
    }

    let store = SessionStore::new(Arc::new(RedbStore::open(&path).unwrap()));
    let status = player(store).status().unwrap();
    assert!(status.contains("last played: a1"));
    assert!(status.contains("position:    0:12"));
}

#[tokio::test]
async fn test_resume_without_session_returns() {
    let player = memory_player();
    player.run(Start::Resume).await.unwrap();
}

// ===== Download =====

async fn media_server() -> MockServer {
    let server = MockServer::start().await;
    let media = format!("{}/media", server.uri());
    Mock::given(method("GET"))
        .and(path("/api/songs/yDeAS8Eh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{
                "id": "yDeAS8Eh",
                "name": "Kesariya",
                "duration": 268,
                "artists": { "primary": [{ "name": "Arijit Singh" }] },
                "downloadUrl": [
                    { "quality": "96kbps", "url": format!("{}/96.mp4", media) },
                    { "quality": "320kbps", "url": null }
                ]
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/media/96.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"mp4-bytes".to_vec()))
        .mount(&server)
        .await;
    server
}

fn player_for(server: &MockServer) -> Player {
    let client = MetadataClient::new(ApiConfig::new(server.uri())).unwrap();
    Player::with_parts(
        client,
        SessionStore::new(Arc::new(MemoryStore::new())),
        PlayerConfig::default(),
    )
}

#[tokio::test]
async fn test_download_saves_best_playable_stream() {
    let server = media_server().await;
    let dir = tempfile::tempdir().unwrap();

    let dest = player_for(&server)
        .download(&TrackId::new("yDeAS8Eh"), dir.path())
        .await
        .unwrap();

    assert_eq!(dest, dir.path().join("Kesariya.mp4"));
    assert_eq!(std::fs::read(&dest).unwrap(), b"mp4-bytes");
}

#[tokio::test]
async fn test_download_unknown_track_fails() {
    let server = media_server().await;
    let dir = tempfile::tempdir().unwrap();

    let result = player_for(&server)
        .download(&TrackId::new("missing"), dir.path())
        .await;

    assert!(matches!(
        result,
        Err(encore_cli::error::CliError::Resolution(_))
    ));
}
