//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p vitrine-api`.

#![allow(dead_code)]

pub mod fixtures;
pub mod media_host;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use std::sync::Arc;
use vitrine_api::setup::{database, routes};
use vitrine_api::state::AppState;
use vitrine_core::{CompressionConfig, Config};
use vitrine_processing::ImageCompressor;
use vitrine_storage::MediaHost;

use media_host::RecordingHost;

/// Test application: server plus handles on the shared state.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub host: Arc<RecordingHost>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// POST a single file to the upload endpoint.
    pub async fn upload(&self, filename: &str, mime: &str, data: Vec<u8>) -> TestResponse {
        let part = Part::bytes(data).file_name(filename).mime_type(mime);
        let form = MultipartForm::new().add_part("file", part);
        self.server
            .post("/dashboard/upload-image")
            .multipart(form)
            .await
    }
}

/// Default config: in-memory database, cloudinary settings unused because the
/// media host is injected.
pub fn create_test_config(compression: CompressionConfig) -> Config {
    let mut config = Config::default();
    config.compression = compression;
    config
}

/// App with the default 10 MiB cap: everything small passes through.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(CompressionConfig::default(), RecordingHost::new()).await
}

/// App whose compression cap is `max_bytes`, so small fixtures get compressed.
pub async fn setup_test_app_with_cap(max_bytes: u64) -> TestApp {
    setup_test_app_with(
        CompressionConfig::with_max_bytes(max_bytes),
        RecordingHost::new(),
    )
    .await
}

pub async fn setup_test_app_with(compression: CompressionConfig, host: RecordingHost) -> TestApp {
    let config = create_test_config(compression);
    let host = Arc::new(host);
    let media_host: Arc<dyn MediaHost> = host.clone();
    let state = build_state(config, media_host).await;

    TestApp {
        server: server_for(&state),
        state,
        host,
    }
}

pub async fn build_state(config: Config, media_host: Arc<dyn MediaHost>) -> Arc<AppState> {
    let db_pool = database::setup_database(&config)
        .await
        .expect("Failed to set up test database");
    let compressor =
        ImageCompressor::new(config.compression.clone()).expect("Invalid test compression config");
    Arc::new(AppState::new(config, db_pool, compressor, media_host))
}

pub fn server_for(state: &Arc<AppState>) -> TestServer {
    let router =
        routes::setup_routes(&state.config, state.clone()).expect("Failed to build routes");
    TestServer::new(router).expect("Failed to create test server")
}
