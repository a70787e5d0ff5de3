#![cfg(feature = "imagen")]

//! ImagenClient tests against a local stand-in for the Vertex AI endpoint.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};
use storygen_core::{AspectRatio, ImageRequest};
use storygen_error::{ImagenErrorKind, StorygenErrorKind};
use storygen_interface::ImageGenerator;
use storygen_models::ImagenClient;
use storygen_rate_limit::RetryPolicy;

#[derive(Clone, Default)]
struct FakeVertex {
    /// HTTP statuses to return before succeeding
    failures: Arc<Mutex<Vec<u16>>>,
    calls: Arc<AtomicUsize>,
    last_body: Arc<Mutex<Option<Value>>>,
    last_auth: Arc<Mutex<Option<String>>>,
    last_path: Arc<Mutex<Option<String>>>,
}

async fn predict(
    State(state): State<FakeVertex>,
    Path((project, location, model)): Path<(String, String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.calls.fetch_add(1, Ordering::SeqCst);
    *state.last_path.lock().unwrap() = Some(format!("{}/{}/{}", project, location, model));
    *state.last_auth.lock().unwrap() = headers
        .get("authorization")
        .map(|v| v.to_str().unwrap().to_string());

    let count = body["parameters"]["sampleCount"].as_u64().unwrap_or(1);
    *state.last_body.lock().unwrap() = Some(body);

    let failure = {
        let mut failures = state.failures.lock().unwrap();
        if failures.is_empty() {
            None
        } else {
            Some(failures.remove(0))
        }
    };
    if let Some(code) = failure {
        return (
            StatusCode::from_u16(code).unwrap(),
            Json(json!({"error": {"code": code, "message": "fake failure"}})),
        );
    }

    let predictions: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "bytesBase64Encoded": STANDARD.encode(format!("image-{}", i)),
                "mimeType": "image/png"
            })
        })
        .collect();
    (StatusCode::OK, Json(json!({ "predictions": predictions })))
}

async fn spawn_fake(state: FakeVertex) -> String {
    let app = Router::new()
        .route(
            "/v1/projects/{project}/locations/{location}/publishers/google/models/{model}",
            post(predict),
        )
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client(endpoint: &str) -> ImagenClient {
    ImagenClient::new("proj", "us-central1", "imagegeneration@006", "token-abc", None)
        .with_endpoint(endpoint)
        .with_retry_policy(RetryPolicy {
            initial_backoff_ms: 1,
            max_retries: 2,
            max_delay_secs: 1,
        })
}

fn request(count: u32) -> ImageRequest {
    ImageRequest::builder()
        .prompt("A robot and a kitten")
        .negative_prompt(Some("photorealistic".to_string()))
        .aspect_ratio(AspectRatio::Wide)
        .number_of_images(count)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_generate_images_decodes_predictions() -> anyhow::Result<()> {
    let state = FakeVertex::default();
    let endpoint = spawn_fake(state.clone()).await;

    let images = client(&endpoint).generate_images(&request(2)).await?;

    assert_eq!(images.len(), 2);
    assert_eq!(images[0].data(), b"image-0");
    assert_eq!(images[1].data(), b"image-1");
    assert_eq!(images[0].format(), "png");

    assert_eq!(
        state.last_path.lock().unwrap().as_deref(),
        Some("proj/us-central1/imagegeneration@006:predict")
    );
    assert_eq!(
        state.last_auth.lock().unwrap().as_deref(),
        Some("Bearer token-abc")
    );
    let body = state.last_body.lock().unwrap().clone().unwrap();
    assert_eq!(body["instances"][0]["prompt"], "A robot and a kitten");
    assert_eq!(body["parameters"]["negativePrompt"], "photorealistic");
    assert_eq!(body["parameters"]["aspectRatio"], "16:9");
    Ok(())
}

#[tokio::test]
async fn test_transient_errors_are_retried() -> anyhow::Result<()> {
    let state = FakeVertex::default();
    state.failures.lock().unwrap().extend([503, 429]);
    let endpoint = spawn_fake(state.clone()).await;

    let images = client(&endpoint).generate_images(&request(1)).await?;

    assert_eq!(images.len(), 1);
    assert_eq!(state.calls.load(Ordering::SeqCst), 3);
    Ok(())
}

#[tokio::test]
async fn test_permanent_errors_fail_fast() {
    let state = FakeVertex::default();
    state.failures.lock().unwrap().push(400);
    let endpoint = spawn_fake(state.clone()).await;

    let err = client(&endpoint)
        .generate_images(&request(1))
        .await
        .unwrap_err();

    assert_eq!(state.calls.load(Ordering::SeqCst), 1);
    match err.kind() {
        StorygenErrorKind::Imagen(e) => assert!(matches!(
            e.kind,
            ImagenErrorKind::HttpError {
                status_code: 400,
                ..
            }
        )),
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_model_override_changes_url() -> anyhow::Result<()> {
    let state = FakeVertex::default();
    let endpoint = spawn_fake(state.clone()).await;

    let req = ImageRequest::builder()
        .prompt("castle")
        .model(Some("imagen-3.0-generate-002".to_string()))
        .build()?;
    client(&endpoint).generate_images(&req).await?;

    assert_eq!(
        state.last_path.lock().unwrap().as_deref(),
        Some("proj/us-central1/imagen-3.0-generate-002:predict")
    );
    Ok(())
}
