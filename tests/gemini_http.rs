//! End-to-end tests of the Gemini adapter against an in-process mock server.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chaplin_studio::chat::{Conversation, Message, APOLOGY_MESSAGE, WELCOME_MESSAGE};
use chaplin_studio::image::{EditOutcome, HttpPlaceholder, ImageAsset, ImageSession, PlaceholderSource};
use chaplin_studio::{GeminiClient, GenAiClient, RequestLifecycle, StudioConfig, StudioError};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

const PNG: [u8; 16] = [
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D, b'I', b'H', b'D', b'R',
];

#[derive(Debug, Clone)]
struct RecordedRequest {
    model_action: String,
    api_key: Option<String>,
    body: Value,
}

#[derive(Clone, Default)]
struct MockState {
    responses: Arc<Mutex<VecDeque<(StatusCode, Value)>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

async fn generate_content(
    State(state): State<MockState>,
    Path(model_action): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.requests.lock().unwrap().push(RecordedRequest {
        model_action,
        api_key: headers
            .get("x-goog-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });
    let (status, body) = state
        .responses
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or((StatusCode::SERVICE_UNAVAILABLE, json!({"error": {"message": "no response"}})));
    (status, Json(body))
}

async fn get_model(headers: HeaderMap) -> StatusCode {
    match headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) {
        Some("test-key") => StatusCode::OK,
        _ => StatusCode::FORBIDDEN,
    }
}

async fn placeholder_png() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/png")], Bytes::from_static(&PNG))
}

struct MockGemini {
    addr: SocketAddr,
    state: MockState,
}

impl MockGemini {
    async fn start(responses: Vec<(StatusCode, Value)>) -> Self {
        let state = MockState {
            responses: Arc::new(Mutex::new(responses.into())),
            ..Default::default()
        };

        let app = Router::new()
            .route(
                "/v1beta/models/{model}",
                post(generate_content).get(get_model),
            )
            .route("/frames/chaplin.png", get(placeholder_png))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    fn config(&self) -> StudioConfig {
        StudioConfig::builder()
            .api_key("test-key")
            .base_url(format!("http://{}/v1beta", self.addr))
            .chat_model("gemini-3.1-pro-preview")
            .placeholder_url(self.url("/frames/chaplin.png"))
            .system_instruction("You are a director's assistant.")
            .build()
            .unwrap()
    }

    fn client(&self) -> GeminiClient {
        GeminiClient::new(self.config())
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

fn image_reply(mime_type: &str, data: &str) -> (StatusCode, Value) {
    (
        StatusCode::OK,
        json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        {"text": "Here is your frame."},
                        {"inlineData": {"mimeType": mime_type, "data": data}}
                    ]
                },
                "finishReason": "STOP"
            }]
        }),
    )
}

fn text_reply(text: &str) -> (StatusCode, Value) {
    (
        StatusCode::OK,
        json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": text}]},
                "finishReason": "STOP"
            }]
        }),
    )
}

#[tokio::test]
async fn image_edit_sends_image_and_prompt() {
    let server = MockGemini::start(vec![image_reply("image/png", "c2VwaWE=")]).await;
    let client = server.client();

    let edited = client
        .request_image_edit("iVBORw0KGgo=", "image/png", "add sepia tone")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(edited.data_uri(), "data:image/png;base64,c2VwaWE=");

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].model_action, "gemini-2.5-flash-image:generateContent");
    assert_eq!(requests[0].api_key.as_deref(), Some("test-key"));

    let parts = &requests[0].body["contents"][0]["parts"];
    assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
    assert_eq!(parts[0]["inlineData"]["data"], "iVBORw0KGgo=");
    assert_eq!(parts[1]["text"], "add sepia tone");
}

#[tokio::test]
async fn session_edit_round_trip() {
    let server = MockGemini::start(vec![
        image_reply("image/jpeg", "/9j/4AAQ"),
        text_reply("I can only describe it."),
    ])
    .await;
    let client = server.client();

    let mut session = ImageSession::new();
    session.load_from_file(&PNG, "image/png");
    let outcome = session.submit_edit(&client, "add sepia tone").await.unwrap();
    assert!(outcome.is_edited());
    assert_eq!(
        session.edited().unwrap().data_uri(),
        "data:image/jpeg;base64,/9j/4AAQ"
    );

    // The uploaded bytes reach the wire unchanged.
    let requests = server.requests();
    let sent = &requests[0].body["contents"][0]["parts"][0]["inlineData"];
    let original = ImageAsset::encode(&PNG, "image/png").extract().unwrap();
    assert_eq!(sent["data"], original.data.as_str());
    assert_eq!(sent["mimeType"], "image/png");

    let outcome = session.submit_edit(&client, "make it colorful").await.unwrap();
    assert!(matches!(outcome, EditOutcome::NoImage));
    assert_eq!(
        session.edited().unwrap().data_uri(),
        "data:image/jpeg;base64,/9j/4AAQ"
    );
}

#[tokio::test]
async fn chat_sends_history_and_system_instruction() {
    let server = MockGemini::start(vec![
        text_reply("Greetings, director."),
        text_reply("Try a vertical-video Tramp."),
    ])
    .await;
    let client = server.client();
    let mut conversation = Conversation::new();

    conversation.send_message(&client, "hello").await.unwrap();
    conversation
        .send_message(&client, "How do I modernize Modern Times?")
        .await
        .unwrap();

    assert_eq!(
        conversation.messages(),
        &[
            Message::model(WELCOME_MESSAGE),
            Message::user("hello"),
            Message::model("Greetings, director."),
            Message::user("How do I modernize Modern Times?"),
            Message::model("Try a vertical-video Tramp."),
        ]
    );

    let requests = server.requests();
    assert_eq!(requests[1].model_action, "gemini-3.1-pro-preview:generateContent");
    let body = &requests[1].body;
    assert_eq!(
        body["systemInstruction"]["parts"][0]["text"],
        "You are a director's assistant."
    );
    let roles: Vec<&str> = body["contents"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["role"].as_str().unwrap())
        .collect();
    assert_eq!(roles, vec!["model", "user", "model", "user"]);
    assert_eq!(
        body["contents"][3]["parts"][0]["text"],
        "How do I modernize Modern Times?"
    );
}

#[tokio::test]
async fn server_errors_are_contained() {
    let server = MockGemini::start(vec![
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": {"code": 500, "message": "backend exploded"}}),
        ),
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": {"code": 500, "message": "backend exploded"}}),
        ),
    ])
    .await;
    let client = server.client();

    let mut conversation = Conversation::new();
    let reply = conversation.send_message(&client, "hello").await.unwrap();
    assert_eq!(reply.text(), APOLOGY_MESSAGE);
    assert_eq!(conversation.lifecycle(), RequestLifecycle::Failed);

    let mut session = ImageSession::new();
    session.load_from_file(&PNG, "image/png");
    let outcome = session.submit_edit(&client, "add sepia tone").await.unwrap();
    match outcome {
        EditOutcome::Failed(StudioError::Api { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "backend exploded");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(session.edited().is_none());
}

#[tokio::test]
async fn auth_and_rate_limit_errors() {
    let server = MockGemini::start(vec![
        (
            StatusCode::FORBIDDEN,
            json!({"error": {"code": 403, "message": "API key not valid"}}),
        ),
        (
            StatusCode::TOO_MANY_REQUESTS,
            json!({"error": {"code": 429, "message": "quota"}}),
        ),
    ])
    .await;
    let client = server.client();

    let err = client.request_chat_reply(&[], "hello").await.unwrap_err();
    assert!(matches!(err, StudioError::Auth(ref m) if m == "API key not valid"));

    let err = client.request_chat_reply(&[], "hello").await.unwrap_err();
    assert!(matches!(err, StudioError::RateLimited { .. }));
    assert!(err.is_remote_call());
}

#[tokio::test]
async fn unreachable_service_is_network_error() {
    let config = StudioConfig::builder()
        .api_key("test-key")
        .base_url("http://127.0.0.1:1/v1beta")
        .build()
        .unwrap();
    let client = GeminiClient::new(config);

    let err = client
        .request_image_edit("AAAA", "image/png", "add sepia tone")
        .await
        .unwrap_err();
    assert!(matches!(err, StudioError::Network(_)));
}

#[tokio::test]
async fn placeholder_fetch() {
    let server = MockGemini::start(vec![]).await;

    let placeholder = HttpPlaceholder::from_config(&server.config());
    let asset = placeholder.fetch().await.unwrap();
    let payload = asset.extract().unwrap();
    assert_eq!(payload.mime_type, "image/png");
    assert_eq!(payload.decode().unwrap(), PNG.to_vec());

    let mut session = ImageSession::new();
    session.load_from_remote_placeholder(&placeholder).await.unwrap();
    assert_eq!(session.original(), Some(&asset));

    let missing = HttpPlaceholder::new(server.url("/frames/missing.png"));
    let err = session
        .load_from_remote_placeholder(&missing)
        .await
        .unwrap_err();
    assert!(matches!(err, StudioError::PlaceholderFetch(_)));
    assert_eq!(session.original(), Some(&asset));
}

#[tokio::test]
async fn health_check_uses_key() {
    let server = MockGemini::start(vec![]).await;
    server.client().health_check().await.unwrap();

    let config = StudioConfig::builder()
        .api_key("wrong-key")
        .base_url(format!("http://{}/v1beta", server.addr))
        .build()
        .unwrap();
    let err = GeminiClient::new(config).health_check().await.unwrap_err();
    assert!(matches!(err, StudioError::Auth(_)));
}
