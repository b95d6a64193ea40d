//! Integration tests for the generation job endpoints.

mod common;

use chrono::Utc;
use common::{body_bytes, body_json, get, post_json};
use axum::http::StatusCode;
use mediagen_core::job::{Job, JobStatus, NewJob};
use mediagen_db::JobStore;
use serde_json::json;

async fn seed_job(store: &dyn JobStore, prompt: &str) -> Job {
    let input = NewJob {
        prompt: prompt.into(),
        ..Default::default()
    };
    let job = Job::create(input, 3, Utc::now()).unwrap();
    store.insert(&job).await.unwrap();
    job
}

// ---------------------------------------------------------------------------
// POST /api/v1/generate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn generate_returns_201_with_pending_job() {
    let app = common::build_test_app();
    let response = post_json(
        app.router,
        "/api/v1/generate",
        json!({"prompt": "  a castle in the clouds  ", "parameters": {"filters": {"size": 512}}}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["status"], "pending");
    assert!(json["message"].is_string());

    let id: uuid::Uuid = json["job_id"].as_str().unwrap().parse().unwrap();
    let stored = app.store.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.prompt, "a castle in the clouds");
    assert_eq!(stored.max_retries, 3);
    assert_eq!(stored.parameters["filters"], json!({"size": 512}));
}

#[tokio::test]
async fn generate_accepts_max_retries() {
    let app = common::build_test_app();
    let response = post_json(
        app.router,
        "/api/v1/generate",
        json!({"prompt": "x", "max_retries": 0}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let id: uuid::Uuid = json["job_id"].as_str().unwrap().parse().unwrap();
    assert_eq!(app.store.find_by_id(id).await.unwrap().unwrap().max_retries, 0);
}

#[tokio::test]
async fn generate_rejects_empty_prompt() {
    let app = common::build_test_app();
    let response = post_json(app.router.clone(), "/api/v1/generate", json!({"prompt": ""})).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");

    let response = post_json(app.router, "/api/v1/generate", json!({"prompt": "   \t "})).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn generate_rejects_oversized_prompt_and_bad_retries() {
    let app = common::build_test_app();

    let long = "a".repeat(2001);
    let response = post_json(app.router.clone(), "/api/v1/generate", json!({"prompt": long})).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = post_json(
        app.router.clone(),
        "/api/v1/generate",
        json!({"prompt": "ok", "max_retries": 11}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = post_json(app.router, "/api/v1/generate", json!({"parameters": {}})).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// ---------------------------------------------------------------------------
// GET /api/v1/status/{job_id}
// ---------------------------------------------------------------------------

#[tokio::test]
async fn status_returns_projection() {
    let app = common::build_test_app();
    let job = seed_job(app.store.as_ref(), "a quiet harbour").await;

    let response = get(app.router, &format!("/api/v1/status/{}", job.id)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["job_id"], job.id.to_string());
    assert_eq!(json["status"], "pending");
    assert_eq!(json["retry_count"], 0);
    assert!(json["result_url"].is_null());
    assert!(json["error_message"].is_null());
    assert!(json["created_at"].is_string());
    assert!(json["updated_at"].is_string());
}

#[tokio::test]
async fn status_of_unknown_job_is_404() {
    let app = common::build_test_app();
    let response = get(
        app.router,
        &format!("/api/v1/status/{}", uuid::Uuid::new_v4()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

#[tokio::test]
async fn malformed_job_id_is_422() {
    let app = common::build_test_app();

    let response = get(app.router.clone(), "/api/v1/status/not-a-uuid").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = get(app.router, "/api/v1/jobs/12345").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// ---------------------------------------------------------------------------
// GET /api/v1/jobs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn get_job_returns_full_record() {
    let app = common::build_test_app();
    let job = seed_job(app.store.as_ref(), "a red fox").await;

    let response = get(app.router, &format!("/api/v1/jobs/{}", job.id)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["id"], job.id.to_string());
    assert_eq!(json["data"]["prompt"], "a red fox");
    assert_eq!(json["data"]["max_retries"], 3);
}

#[tokio::test]
async fn list_jobs_filters_by_status() {
    let app = common::build_test_app();
    seed_job(app.store.as_ref(), "one").await;
    let mut done = seed_job(app.store.as_ref(), "two").await;
    let now = Utc::now();
    done.begin_attempt(now).unwrap();
    done.complete("/media/two.png", "memory://two.png", now).unwrap();
    app.store.update(&done).await.unwrap();

    let response = get(app.router.clone(), "/api/v1/jobs").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 2);

    let response = get(app.router, "/api/v1/jobs?status=completed&limit=10").await;
    let json = body_json(response).await;
    let data = json["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["status"], JobStatus::Completed.as_str());
}

// ---------------------------------------------------------------------------
// /media
// ---------------------------------------------------------------------------

#[tokio::test]
async fn local_media_is_served() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("abc.png"), b"png-bytes").unwrap();
    let app = common::build_test_app_with_media(Some(dir.path().to_path_buf()));

    let response = get(app.router, "/media/abc.png").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"png-bytes");
}
