#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use mediagen_api::config::ServerConfig;
use mediagen_api::router::build_app_router;
use mediagen_api::state::AppState;
use mediagen_db::{InMemoryJobStore, JobStore};
use mediagen_provider::MockProvider;
use mediagen_storage::{MemoryBlobStore, StorageConfig};
use mediagen_worker::{Dispatcher, ExecutionEngine, WorkerConfig};
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        default_max_retries: 3,
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryJobStore>,
}

/// Build the full application router over an in-memory store, the mock
/// provider and in-memory artifact storage.
///
/// Uses the same [`build_app_router`] as `main.rs`, so tests exercise the
/// production middleware stack. `media_root` mounts a local `/media`
/// directory.
pub fn build_test_app_with_media(media_root: Option<PathBuf>) -> TestApp {
    let config = test_config();
    let store = Arc::new(InMemoryJobStore::new());
    let engine = Arc::new(ExecutionEngine::new(
        store.clone(),
        Arc::new(MockProvider::new()),
        Arc::new(MemoryBlobStore::new()),
        &WorkerConfig::default(),
    ));
    let dispatcher = Dispatcher::start(engine, 2);

    let storage = match media_root {
        Some(root) => StorageConfig::Local {
            root,
            url_prefix: "/media".into(),
        },
        None => StorageConfig::S3 {
            bucket: "unused".into(),
            region: "us-east-1".into(),
        },
    };

    let state = AppState {
        store: store.clone() as Arc<dyn JobStore>,
        config: Arc::new(config.clone()),
        dispatcher,
    };

    TestApp {
        router: build_app_router(state, &config, &storage),
        store,
    }
}

pub fn build_test_app() -> TestApp {
    build_test_app_with_media(None)
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
