//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p videostore-api`.

#![allow(dead_code)]

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use videostore_api::setup::routes::setup_routes;
use videostore_api::AppState;
use videostore_core::{Config, StorageBackend};
use videostore_storage::{LocalVideoStore, MemoryVideoStore, VideoStore};

pub const INDEX_HTML: &str = "<!doctype html><title>Videos</title><h1>Video Store</h1>";
pub const APP_JS: &str = "console.log('gallery');";

/// Test application: server plus the temp directories it owns.
pub struct TestApp {
    pub server: TestServer,
    pub video_dir: PathBuf,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Names of published record directories (staging excluded).
    pub fn record_dirs(&self) -> Vec<String> {
        list_dir(&self.video_dir)
            .into_iter()
            .filter(|name| !name.starts_with('.'))
            .collect()
    }

    /// Entries left in the staging area.
    pub fn staged_entries(&self) -> Vec<String> {
        list_dir(&self.video_dir.join(".staging"))
    }
}

fn list_dir(path: &Path) -> Vec<String> {
    match std::fs::read_dir(path) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    }
}

fn test_config(temp_dir: &TempDir) -> Config {
    let static_dir = temp_dir.path().join("static");
    std::fs::create_dir_all(&static_dir).expect("create static dir");
    std::fs::write(static_dir.join("index.html"), INDEX_HTML).expect("write index.html");
    std::fs::write(static_dir.join("app.js"), APP_JS).expect("write app.js");

    Config {
        video_dir: temp_dir.path().join("videos"),
        static_dir,
        ..Config::default()
    }
}

fn build_app(config: Config, store: Arc<dyn VideoStore>, temp_dir: TempDir) -> TestApp {
    let video_dir = config.video_dir.clone();
    let state = AppState::new(store);
    let app = setup_routes(&config, state).expect("Failed to build routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        video_dir,
        _temp_dir: temp_dir,
    }
}

/// Setup test app backed by the filesystem store in a temp dir.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {}).await
}

/// Same as [`setup_test_app`], with a hook to adjust the config first.
pub async fn setup_test_app_with(adjust: impl FnOnce(&mut Config)) -> TestApp {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = test_config(&temp_dir);
    adjust(&mut config);

    let store = LocalVideoStore::new(config.video_dir.clone())
        .await
        .expect("Failed to create local store");
    build_app(config, Arc::new(store), temp_dir)
}

/// Setup test app backed by the in-memory store.
pub async fn setup_memory_app() -> TestApp {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = test_config(&temp_dir);
    config.storage_backend = StorageBackend::Memory;
    build_app(config, Arc::new(MemoryVideoStore::new()), temp_dir)
}

/// Multipart body with a `file` part and a `metadata` text part.
pub fn upload_form(file_name: Option<&str>, data: &[u8], metadata: &str) -> MultipartForm {
    let mut part = Part::bytes(bytes::Bytes::copy_from_slice(data)).mime_type("video/mp4");
    if let Some(name) = file_name {
        part = part.file_name(name);
    }
    MultipartForm::new()
        .add_part("file", part)
        .add_text("metadata", metadata.to_string())
}

/// Upload and return the new id, asserting success.
pub async fn upload_video(
    client: &TestServer,
    file_name: &str,
    data: &[u8],
    metadata: &str,
) -> String {
    let response = client
        .post("/videos/")
        .multipart(upload_form(Some(file_name), data, metadata))
        .await;
    assert_eq!(response.status_code(), 200, "upload failed: {}", response.text());

    let body: serde_json::Value = response.json();
    body.get("id")
        .and_then(|v| v.as_str())
        .expect("Expected 'id' in upload response")
        .to_string()
}
