#![cfg(feature = "server")]

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use ielts_coach::{server, Config};
use reqwest::multipart::{Form, Part};
use serde_json::{json, Value as JsonValue};

#[derive(Clone)]
struct UpstreamState {
    responses: Arc<Mutex<VecDeque<(StatusCode, JsonValue)>>>,
    hits: Arc<AtomicUsize>,
    bodies: Arc<Mutex<Vec<JsonValue>>>,
}

async fn generate_handler(
    State(state): State<UpstreamState>,
    Json(body): Json<JsonValue>,
) -> impl IntoResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);
    state.bodies.lock().expect("bodies mutex").push(body);
    let (status, body) = state
        .responses
        .lock()
        .expect("response queue mutex")
        .pop_front()
        .unwrap_or((StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "empty queue"})));
    (status, Json(body))
}

struct Harness {
    app_url: String,
    hits: Arc<AtomicUsize>,
    bodies: Arc<Mutex<Vec<JsonValue>>>,
    tasks: Vec<tokio::task::JoinHandle<()>>,
}

impl Drop for Harness {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

async fn serve(app: Router) -> (String, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("must bind test listener");
    let address = listener.local_addr().expect("must have local addr");
    let task = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server must run");
    });
    (format!("http://{address}"), task)
}

/// Starts a Gemini-shaped mock upstream and the coach server pointed at it.
async fn spawn_harness(responses: Vec<(StatusCode, JsonValue)>) -> Harness {
    spawn_harness_with(responses, &[]).await
}

async fn spawn_harness_with(
    responses: Vec<(StatusCode, JsonValue)>,
    overrides: &[(&'static str, &str)],
) -> Harness {
    let state = UpstreamState {
        responses: Arc::new(Mutex::new(responses.into())),
        hits: Arc::new(AtomicUsize::new(0)),
        bodies: Arc::new(Mutex::new(Vec::new())),
    };
    let upstream = Router::new()
        .route("/v1beta/models/:model_action", post(generate_handler))
        .with_state(state.clone());
    let (upstream_url, upstream_task) = serve(upstream).await;

    let mut vars: HashMap<&str, String> = HashMap::from([
        ("GEMINI_API_KEY", "test-key".to_owned()),
        ("COACH_API_BASE_URL", format!("{upstream_url}/v1beta")),
        ("COACH_RETRY_BASE_MS", "1".to_owned()),
        ("COACH_TIMEOUT_MS", "2000".to_owned()),
        ("COACH_STATIC_DIR", "tests/static-missing".to_owned()),
    ]);
    vars.extend(overrides.iter().map(|(key, value)| (*key, (*value).to_owned())));
    let config = Config::from_lookup(|key| vars.get(key).cloned()).expect("config must load");
    let service = config.build_service().expect("service must build");
    let (app_url, app_task) = serve(server::router(service, &config)).await;

    Harness {
        app_url,
        hits: state.hits,
        bodies: state.bodies,
        tasks: vec![upstream_task, app_task],
    }
}

fn gemini_text(text: &str) -> JsonValue {
    json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
}

fn audio_part(bytes: &'static [u8]) -> Part {
    Part::bytes(bytes)
        .file_name("answer.webm")
        .mime_str("audio/webm")
        .expect("valid mime")
}

fn filled_audio_part(len: usize, fill: u8) -> Part {
    Part::bytes(vec![fill; len])
        .file_name("answer.webm")
        .mime_str("audio/webm")
        .expect("valid mime")
}

#[tokio::test]
async fn analyze_without_file_is_bad_request() {
    let harness = spawn_harness(vec![]).await;

    let response = reqwest::Client::new()
        .post(format!("{}/analyze-speech", harness.app_url))
        .multipart(Form::new().text("question", "Describe your hometown."))
        .send()
        .await
        .expect("request must complete");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: JsonValue = response.json().await.expect("json body");
    assert_eq!(body, json!({ "error": "No audio file uploaded." }));
    assert_eq!(harness.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_audio_field_is_treated_as_missing_file() {
    let harness = spawn_harness(vec![]).await;

    let response = reqwest::Client::new()
        .post(format!("{}/analyze-speech", harness.app_url))
        .multipart(Form::new().part("audio", audio_part(b"")))
        .send()
        .await
        .expect("request must complete");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: JsonValue = response.json().await.expect("json body");
    assert_eq!(body, json!({ "error": "No audio file uploaded." }));
    assert_eq!(harness.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn upload_limit_applies_to_each_file() {
    let harness = spawn_harness_with(
        vec![(StatusCode::OK, gemini_text("Two clips heard."))],
        &[("COACH_MAX_UPLOAD_BYTES", "1024")],
    )
    .await;

    let form = Form::new()
        .part("audio_part_0", filled_audio_part(800, 1))
        .part("audio_part_1", filled_audio_part(800, 2));
    let response = reqwest::Client::new()
        .post(format!("{}/analyze-speech", harness.app_url))
        .multipart(form)
        .send()
        .await
        .expect("request must complete");

    assert_eq!(response.status(), StatusCode::OK);
    let body: JsonValue = response.json().await.expect("json body");
    assert_eq!(body, json!({ "analysis": "Two clips heard." }));
    assert_eq!(harness.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn oversized_file_is_rejected_before_upstream_call() {
    let harness = spawn_harness_with(vec![], &[("COACH_MAX_UPLOAD_BYTES", "1024")]).await;

    let response = reqwest::Client::new()
        .post(format!("{}/analyze-speech", harness.app_url))
        .multipart(Form::new().part("audio", filled_audio_part(2048, 0)))
        .send()
        .await
        .expect("request must complete");

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body: JsonValue = response.json().await.expect("json body");
    assert_eq!(body["error"], "Audio file exceeds the 1024 byte upload limit.");
    assert_eq!(harness.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn non_multipart_request_is_treated_as_missing_file() {
    let harness = spawn_harness(vec![]).await;

    let response = reqwest::Client::new()
        .post(format!("{}/checkband", harness.app_url))
        .json(&json!({ "audio": "nope" }))
        .send()
        .await
        .expect("request must complete");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: JsonValue = response.json().await.expect("json body");
    assert_eq!(body["error"], "No audio file uploaded.");
}

#[tokio::test]
async fn analyze_relays_generated_text() {
    let harness = spawn_harness(vec![(StatusCode::OK, gemini_text("Band 9 sample."))]).await;

    let response = reqwest::Client::new()
        .post(format!("{}/analyze-speech", harness.app_url))
        .multipart(Form::new().part("audio", audio_part(b"webm")))
        .send()
        .await
        .expect("request must complete");

    assert_eq!(response.status(), StatusCode::OK);
    let body: JsonValue = response.json().await.expect("json body");
    assert_eq!(body, json!({ "analysis": "Band 9 sample." }));

    let sent = harness.bodies.lock().expect("bodies mutex")[0].clone();
    assert_eq!(sent["contents"][0]["parts"][1]["inlineData"]["data"], "d2VibQ==");
}

#[tokio::test]
async fn multi_part_upload_is_sent_in_part_order() {
    let harness = spawn_harness(vec![(
        StatusCode::OK,
        gemini_text(r#"{"transcript":"t","band7":"a","band8":"b","band9":"c"}"#),
    )])
    .await;

    let form = Form::new()
        .part("audio_part_1", audio_part(b"second"))
        .text("question_1", "Why?")
        .part("audio_part_0", audio_part(b"first"))
        .text("question_0", "What?");
    let response = reqwest::Client::new()
        .post(format!("{}/sample-answers", harness.app_url))
        .multipart(form)
        .send()
        .await
        .expect("request must complete");

    assert_eq!(response.status(), StatusCode::OK);
    let body: JsonValue = response.json().await.expect("json body");
    assert_eq!(
        body,
        json!({ "transcript": "t", "band7": "a", "band8": "b", "band9": "c" })
    );

    let sent = harness.bodies.lock().expect("bodies mutex")[0].clone();
    let parts = sent["contents"][0]["parts"].as_array().expect("parts").clone();
    assert_eq!(parts[1]["text"], "Question 1: What?\nQuestion 2: Why?");
    assert_eq!(parts[3]["inlineData"]["data"], "Zmlyc3Q=");
    assert_eq!(parts[5]["inlineData"]["data"], "c2Vjb25k");
}

#[tokio::test]
async fn persistent_rate_limit_is_generic_500() {
    let harness = spawn_harness(vec![
        (StatusCode::TOO_MANY_REQUESTS, json!({})),
        (StatusCode::TOO_MANY_REQUESTS, json!({})),
        (StatusCode::TOO_MANY_REQUESTS, json!({})),
    ])
    .await;

    let response = reqwest::Client::new()
        .post(format!("{}/checkband", harness.app_url))
        .multipart(Form::new().part("audio", audio_part(b"webm")))
        .send()
        .await
        .expect("request must complete");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: JsonValue = response.json().await.expect("json body");
    assert_eq!(
        body["error"],
        "Failed to get a response from the AI provider after multiple retries."
    );
    assert_eq!(harness.hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn check_band_returns_band_and_feedback() {
    let harness = spawn_harness(vec![(
        StatusCode::OK,
        gemini_text(r#"{"band": 7.5, "feedback": "Good range of vocabulary."}"#),
    )])
    .await;

    let response = reqwest::Client::new()
        .post(format!("{}/checkband", harness.app_url))
        .multipart(Form::new().part("audio", audio_part(b"webm")))
        .send()
        .await
        .expect("request must complete");

    assert_eq!(response.status(), StatusCode::OK);
    let body: JsonValue = response.json().await.expect("json body");
    assert_eq!(body, json!({ "band": 7.5, "feedback": "Good range of vocabulary." }));
}

#[tokio::test]
async fn health_reports_provider() {
    let harness = spawn_harness(vec![]).await;

    let body: JsonValue = reqwest::get(format!("{}/health", harness.app_url))
        .await
        .expect("request must complete")
        .json()
        .await
        .expect("json body");

    assert_eq!(body, json!({ "status": "ok", "provider": "gemini" }));
}
