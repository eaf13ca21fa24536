//! Backend client and pipeline tests against a local HTTP server

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use sap::backend::{BackendClient, BackendCommand, BackendEvent, BackendPipeline};
use sap::config::ClientConfig;
use sap::SapError;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

const FAKE_AUDIO: &[u8] = b"RIFF\x24\x00\x00\x00WAVEfmt ";

/// What the fake backend saw
#[derive(Clone, Default)]
struct Seen {
    queries: Arc<Mutex<Vec<Value>>>,
    uploads: Arc<Mutex<Vec<(String, Option<String>, Option<String>, usize)>>>,
    speech: Arc<Mutex<Vec<Value>>>,
}

async fn query(State(seen): State<Seen>, Json(body): Json<Value>) -> Json<Value> {
    seen.queries.lock().push(body.clone());
    let text = body["text"].as_str().unwrap_or("<image>").to_string();
    Json(json!({
        "answer": format!("You said: {}", text),
        "session_id": body["session_id"],
        "mode": "rag",
        "caption": null,
        "retrieved": [{"id": "fern-1", "source": "field-guide", "text": "Ferns like shade."}]
    }))
}

async fn stt(State(seen): State<Seen>, mut multipart: Multipart) -> Json<Value> {
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let len = field.bytes().await.unwrap().len();
        seen.uploads.lock().push((name, file_name, content_type, len));
    }
    Json(json!({ "text": "which moss is this" }))
}

async fn tts(State(seen): State<Seen>, Json(body): Json<Value>) -> Vec<u8> {
    seen.speech.lock().push(body);
    FAKE_AUDIO.to_vec()
}

async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn healthy_backend() -> (SocketAddr, Seen) {
    let seen = Seen::default();
    let router = Router::new()
        .route("/query", post(query))
        .route("/stt", post(stt))
        .route("/tts", post(tts))
        .with_state(seen.clone());
    (serve(router).await, seen)
}

async fn failing_backend() -> SocketAddr {
    let router = Router::new()
        .route(
            "/query",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        )
        .route("/stt", post(|| async { Json(json!({ "detail": "no text" })) }))
        .route("/tts", post(|| async { StatusCode::OK }));
    serve(router).await
}

fn client_for(addr: SocketAddr) -> BackendClient {
    let config = ClientConfig::default()
        .with_backend_url(format!("http://{}", addr))
        .with_session_id("test-session")
        .with_request_timeout(Duration::from_secs(5));
    BackendClient::new(config).unwrap()
}

#[tokio::test]
async fn test_query_sends_text_and_session() {
    let (addr, seen) = healthy_backend().await;
    let client = client_for(addr);

    let response = client.query(Some("Hello".into()), None).await.unwrap();

    assert_eq!(response.answer, "You said: Hello");
    assert_eq!(response.mode.as_deref(), Some("rag"));
    assert_eq!(response.retrieved.len(), 1);
    assert_eq!(response.retrieved[0].id, "fern-1");

    let queries = seen.queries.lock();
    assert_eq!(
        queries[0],
        json!({ "text": "Hello", "image_base64": null, "session_id": "test-session" })
    );
}

#[tokio::test]
async fn test_query_image_only_sends_null_text() {
    let (addr, seen) = healthy_backend().await;
    let client = client_for(addr);

    let response = client.query(None, Some("aGVsbG8=".into())).await.unwrap();

    assert_eq!(response.answer, "You said: <image>");
    let queries = seen.queries.lock();
    assert!(queries[0]["text"].is_null());
    assert_eq!(queries[0]["image_base64"], "aGVsbG8=");
}

#[tokio::test]
async fn test_transcribe_uploads_wav_file_field() {
    let (addr, seen) = healthy_backend().await;
    let client = client_for(addr);

    let text = client.transcribe(vec![0u8; 64]).await.unwrap();

    assert_eq!(text, "which moss is this");
    let uploads = seen.uploads.lock();
    assert_eq!(uploads.len(), 1);
    let (name, file_name, content_type, len) = &uploads[0];
    assert_eq!(name, "file");
    assert_eq!(file_name.as_deref(), Some("audio.wav"));
    assert_eq!(content_type.as_deref(), Some("audio/wav"));
    assert_eq!(*len, 64);
}

#[tokio::test]
async fn test_synthesize_returns_audio_bytes() {
    let (addr, seen) = healthy_backend().await;
    let client = client_for(addr);

    let audio = client.synthesize("Hi there").await.unwrap();

    assert_eq!(audio, FAKE_AUDIO);
    assert_eq!(seen.speech.lock()[0], json!({ "text": "Hi there" }));
}

#[tokio::test]
async fn test_error_status_is_transport_error() {
    let client = client_for(failing_backend().await);

    let error = client.query(Some("Hello".into()), None).await.unwrap_err();
    assert!(matches!(error, SapError::Transport(_)), "got {:?}", error);
}

#[tokio::test]
async fn test_malformed_bodies_are_invalid_responses() {
    let client = client_for(failing_backend().await);

    let error = client.transcribe(vec![1, 2, 3]).await.unwrap_err();
    assert!(matches!(error, SapError::InvalidResponse(_)), "got {:?}", error);

    let error = client.synthesize("Hi").await.unwrap_err();
    assert!(matches!(error, SapError::InvalidResponse(_)), "got {:?}", error);
}

fn wait_for_event(handle: &sap::backend::BackendHandle) -> BackendEvent {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        if let Some(event) = handle.try_recv() {
            return event;
        }
        assert!(Instant::now() < deadline, "timed out waiting for backend event");
        std::thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn test_pipeline_round_trip() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let (addr, _seen) = runtime.block_on(healthy_backend());

    let config = ClientConfig::default().with_backend_url(format!("http://{}", addr));
    let handle = BackendPipeline::new(config).unwrap().start_worker().unwrap();

    let request_id = Uuid::new_v4();
    handle
        .send(BackendCommand::Query {
            text: Some("Hello".into()),
            image_base64: None,
            request_id,
        })
        .unwrap();

    match wait_for_event(&handle) {
        BackendEvent::Answer {
            answer,
            request_id: answered,
        } => {
            assert_eq!(answer, "You said: Hello");
            assert_eq!(answered, request_id);
        }
        other => panic!("expected an answer, got {:?}", other),
    }

    handle
        .send(BackendCommand::Synthesize {
            text: "You said: Hello".into(),
            message_index: 1,
            request_id,
        })
        .unwrap();
    match wait_for_event(&handle) {
        BackendEvent::Speech {
            audio,
            message_index,
            ..
        } => {
            assert_eq!(audio, FAKE_AUDIO);
            assert_eq!(message_index, 1);
        }
        other => panic!("expected speech, got {:?}", other),
    }

    handle.send(BackendCommand::Shutdown).unwrap();
    assert!(matches!(wait_for_event(&handle), BackendEvent::Shutdown));
}

#[test]
fn test_pipeline_reports_failed_query() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let addr = runtime.block_on(failing_backend());

    let config = ClientConfig::default().with_backend_url(format!("http://{}", addr));
    let handle = BackendPipeline::new(config).unwrap().start_worker().unwrap();

    let request_id = Uuid::new_v4();
    handle
        .send(BackendCommand::Query {
            text: Some("Hello".into()),
            image_base64: None,
            request_id,
        })
        .unwrap();

    match wait_for_event(&handle) {
        BackendEvent::QueryFailed {
            error,
            request_id: failed,
        } => {
            assert_eq!(failed, request_id);
            assert!(matches!(error, SapError::Transport(_)));
        }
        other => panic!("expected a failure, got {:?}", other),
    }
}
