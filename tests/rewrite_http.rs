//! Integration tests for the HTTP rewrite client against a local mock service

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use clear_convey::core::KeyValueStore;
use clear_convey::preferences::{MultiCategory, SelectionState, SingleCategory};
use clear_convey::rewrite::{HttpRewriteService, RewriteError, RewriteService};
use clear_convey::session::SESSION_KEY;
use clear_convey::share::ShareLink;
use clear_convey::storage::FileStore;
use clear_convey::{SessionStore, Submission, ThreadController};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Bodies the mock service received
type Seen = Arc<Mutex<Vec<Value>>>;

/// Answers like the real service: uppercases the text and keeps or issues a thread id
async fn revise_ok(State(seen): State<Seen>, Json(body): Json<Value>) -> Json<Value> {
    let text = body["text"].as_str().unwrap_or_default().to_string();
    let thread_id = body["threadId"].as_str().unwrap_or("srv-1").to_string();
    seen.lock().unwrap().push(body);
    Json(json!({
        "revised": text.to_uppercase(),
        "threadId": thread_id,
        "analysis": { "rationale": "louder" },
        "metadata": { "wordCount": { "original": 7, "revised": 7 } }
    }))
}

async fn revise_fails(State(seen): State<Seen>, Json(body): Json<Value>) -> Response {
    seen.lock().unwrap().push(body);
    (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response()
}

async fn revise_malformed() -> Json<Value> {
    Json(json!({ "revised": "no thread here" }))
}

async fn revise_rate_limited() -> Response {
    (StatusCode::TOO_MANY_REQUESTS, "slow down").into_response()
}

async fn revise_slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(2)).await;
    Json(json!({ "revised": "late", "threadId": "t" }))
}

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn spawn_with<H, T>(handler: H) -> (String, Seen)
where
    H: axum::handler::Handler<T, Seen>,
    T: 'static,
{
    let seen: Seen = Arc::default();
    let app = Router::new()
        .route("/revise", post(handler))
        .with_state(seen.clone());
    (spawn(app).await, seen)
}

fn open_store(temp: &TempDir) -> (Arc<FileStore>, Arc<tokio::sync::Mutex<SessionStore>>) {
    let persistence = Arc::new(FileStore::new(temp.path()).unwrap());
    let link = Arc::new(ShareLink::parse("https://clearconvey.app/").unwrap());
    let store = SessionStore::open(persistence.clone(), link);
    (persistence, Arc::new(tokio::sync::Mutex::new(store)))
}

fn controller(base_url: &str, temp: &TempDir) -> ThreadController {
    let service = HttpRewriteService::new(base_url).unwrap();
    ThreadController::new(Arc::new(service), open_store(temp).1)
}

#[tokio::test]
async fn test_successful_revision() {
    let (base_url, seen) = spawn_with(revise_ok).await;
    let temp = TempDir::new().unwrap();
    let controller = controller(&base_url, &temp);

    let mut selection = SelectionState::new();
    selection.toggle_multi(MultiCategory::Tone, "clear");
    selection.toggle_multi(MultiCategory::Tone, "gentle");
    selection.toggle_single(SingleCategory::SocialPlatform, "linkedin");

    let request = controller
        .build_request(&Submission::new("hello there", &selection).with_content_type("social"))
        .await;
    let response = HttpRewriteService::new(&base_url)
        .unwrap()
        .revise(&request)
        .await
        .unwrap();

    assert_eq!(response.revised, "HELLO THERE");
    assert_eq!(response.thread_id, "srv-1");
    assert_eq!(response.word_count().unwrap().original, 7);

    let body = seen.lock().unwrap()[0].clone();
    assert_eq!(body["text"], "hello there");
    assert_eq!(body["contentType"], "social");
    assert_eq!(body["similarity"], 50);
    assert_eq!(body["socialPlatform"], "linkedin");
    assert_eq!(body["chips"]["tone"], json!(["clear", "gentle"]));
    assert_eq!(body["chipWeights"]["tone"][1]["weight"], 0.8);
    assert!(body.get("threadId").is_none());
}

#[tokio::test]
async fn test_server_error_is_typed() {
    let (base_url, seen) = spawn_with(revise_fails).await;
    let temp = TempDir::new().unwrap();
    let controller = controller(&base_url, &temp);

    let err = controller
        .submit(Submission::new("hi", &SelectionState::new()))
        .await
        .unwrap_err();
    assert!(matches!(
        err.rewrite_error(),
        Some(RewriteError::ServiceError(body)) if body == "boom"
    ));
    assert!(err.rewrite_error().unwrap().is_retryable());
    // Exactly one attempt, no implicit retry
    assert_eq!(seen.lock().unwrap().len(), 1);
    assert_eq!(controller.store().lock().await.state().thread_count(), 0);
}

#[tokio::test]
async fn test_rate_limit_and_malformed() {
    let temp = TempDir::new().unwrap();
    let selection = SelectionState::new();

    let base_url = spawn(Router::new().route("/revise", post(revise_rate_limited))).await;
    let err = controller(&base_url, &temp)
        .submit(Submission::new("hi", &selection))
        .await
        .unwrap_err();
    assert!(matches!(err.rewrite_error(), Some(RewriteError::RateLimited(_))));

    let base_url = spawn(Router::new().route("/revise", post(revise_malformed))).await;
    let controller = controller(&base_url, &temp);
    let err = controller
        .submit(Submission::new("hi", &selection))
        .await
        .unwrap_err();
    assert!(matches!(err.rewrite_error(), Some(RewriteError::Malformed(_))));
    assert_eq!(controller.store().lock().await.state().thread_count(), 0);
}

#[tokio::test]
async fn test_timeout_is_network_error() {
    let base_url = spawn(Router::new().route("/revise", post(revise_slow))).await;
    let service = HttpRewriteService::new(&base_url)
        .unwrap()
        .with_timeout(Duration::from_millis(200));
    let temp = TempDir::new().unwrap();
    let controller = ThreadController::new(Arc::new(service), open_store(&temp).1);

    let err = controller
        .submit(Submission::new("hi", &SelectionState::new()))
        .await
        .unwrap_err();
    assert!(matches!(err.rewrite_error(), Some(RewriteError::Network(_))));
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let temp = TempDir::new().unwrap();
    let err = controller(&format!("http://{}", addr), &temp)
        .submit(Submission::new("hi", &SelectionState::new()))
        .await
        .unwrap_err();
    assert!(matches!(err.rewrite_error(), Some(RewriteError::Network(_))));
}

#[tokio::test]
async fn test_service_behind_path_prefix() {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .nest("/api", Router::new().route("/revise", post(revise_ok)))
        .with_state(seen.clone());
    let base_url = spawn(app).await;

    let temp = TempDir::new().unwrap();
    let controller = controller(&format!("{}/api", base_url), &temp);
    let version = controller
        .submit(Submission::new("hi", &SelectionState::new()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(version.output_text, "HI");
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_thread_lifecycle_over_http() {
    let (base_url, seen) = spawn_with(revise_ok).await;
    let temp = TempDir::new().unwrap();
    let (persistence, store) = open_store(&temp);
    let controller = ThreadController::new(
        Arc::new(HttpRewriteService::new(&base_url).unwrap()),
        store.clone(),
    );
    let selection = SelectionState::new();

    controller
        .submit(Submission::new("hello", &selection))
        .await
        .unwrap();
    controller
        .submit(Submission::new("hello again", &selection).refining(true))
        .await
        .unwrap();

    {
        let store = store.lock().await;
        assert_eq!(store.state().thread_count(), 1);
        let thread = store.thread("srv-1").unwrap();
        assert_eq!(thread.original_text(), "hello");
        assert_eq!(thread.versions().len(), 2);
        // Word counts come from the service metadata
        assert_eq!(thread.versions()[0].word_count.original, 7);
    }
    assert_eq!(seen.lock().unwrap()[1]["threadId"], "srv-1");

    // A failing service leaves the stored session byte-for-byte unchanged
    let before = persistence.get(SESSION_KEY).unwrap().unwrap();
    let (failing_url, _) = spawn_with(revise_fails).await;
    let failing = ThreadController::new(
        Arc::new(HttpRewriteService::new(&failing_url).unwrap()),
        store.clone(),
    );
    let err = failing
        .submit(Submission::new("hello once more", &selection).refining(true))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Sorry, there was an error. Please try again.");
    assert_eq!(persistence.get(SESSION_KEY).unwrap().unwrap(), before);
}
