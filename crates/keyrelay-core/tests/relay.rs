use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use keyrelay_core::{Core, RELAY_API_PATH, RELAY_PATH, RETRY_HINT};
use keyrelay_provider_core::{
    ConfigSnapshot, Credential, CredentialResolver, GenerativeClient, NumericOrder, PoolNames,
    StaticSource, UpstreamFailure,
};
use keyrelay_provider_impl::RotatingProvider;

#[derive(Default)]
struct ScriptedClient {
    replies: HashMap<String, Result<String, UpstreamFailure>>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedClient {
    fn ok(mut self, secret: &str, text: &str) -> Self {
        self.replies.insert(secret.to_string(), Ok(text.to_string()));
        self
    }

    fn fail(mut self, secret: &str, status: u16, message: &str) -> Self {
        self.replies
            .insert(secret.to_string(), Err(UpstreamFailure::new(status, message)));
        self
    }

    fn slow(mut self, secret: &str, delay: Duration) -> Self {
        self.delays.insert(secret.to_string(), delay);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeClient for ScriptedClient {
    async fn generate(
        &self,
        credential: &Credential,
        _model: &str,
        _prompt: &str,
    ) -> Result<String, UpstreamFailure> {
        self.calls.lock().unwrap().push(credential.secret().to_string());
        if let Some(delay) = self.delays.get(credential.secret()) {
            tokio::time::sleep(*delay).await;
        }
        self.replies
            .get(credential.secret())
            .cloned()
            .unwrap_or_else(|| Err(UpstreamFailure::new(503, "unscripted")))
    }
}

fn core(keys: &[(&str, &str)], client: Arc<ScriptedClient>) -> Core {
    let config: ConfigSnapshot = keys.iter().copied().collect();
    let resolver = CredentialResolver::new(PoolNames::default(), Arc::new(NumericOrder));
    let provider = RotatingProvider::new(resolver, Arc::new(StaticSource(config)), client);
    Core::new(Arc::new(provider))
}

fn app(keys: &[(&str, &str)], client: Arc<ScriptedClient>) -> Router {
    core(keys, client).router()
}

async fn post(app: Router, path: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn rotates_past_forbidden_key() {
    let client = Arc::new(ScriptedClient::default().fail("k1", 403, "leaked").ok("k2", "hasil"));
    let app = app(
        &[("GEMINI_API_KEY_1", "k1"), ("GEMINI_API_KEY_2", "k2")],
        client.clone(),
    );
    let (status, body) = post(app, RELAY_PATH, json!({ "prompt": "selamat pagi" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "text": "hasil" }));
    assert_eq!(client.calls(), vec!["k1", "k2"]);
}

#[tokio::test]
async fn bad_prompt_is_not_rotated() {
    let client = Arc::new(
        ScriptedClient::default()
            .fail("k1", 400, "invalid prompt")
            .ok("k2", "never"),
    );
    let app = app(
        &[("GEMINI_API_KEY_1", "k1"), ("GEMINI_API_KEY_2", "k2")],
        client.clone(),
    );
    let (status, body) = post(app, RELAY_API_PATH, json!({ "prompt": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid prompt");
    assert_eq!(body["details"], RETRY_HINT);
    assert_eq!(client.calls(), vec!["k1"]);
}

#[tokio::test]
async fn missing_keys_fail_before_any_call() {
    let client = Arc::new(ScriptedClient::default());
    let app = app(&[("PATH", "/usr/bin")], client.clone());
    let (status, body) = post(app, RELAY_PATH, json!({ "prompt": "halo" })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({ "error": "No Gemini API keys found in environment variables" })
    );
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn exhausted_pool_reports_last_failure() {
    let client = Arc::new(
        ScriptedClient::default()
            .fail("k1", 500, "first broke")
            .fail("k2", 500, "second broke"),
    );
    let app = app(
        &[("GEMINI_API_KEY_1", "k1"), ("GEMINI_API_KEY_2", "k2")],
        client.clone(),
    );
    let (status, body) = post(app, RELAY_PATH, json!({ "model": "gemini-2.5-flash", "prompt": "halo" })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "second broke");
    assert_eq!(client.calls(), vec!["k1", "k2"]);
}

#[tokio::test]
async fn rate_limit_status_is_passed_through_when_last() {
    let client = Arc::new(ScriptedClient::default().fail("k1", 429, "quota exceeded"));
    let app = app(&[("GEMINI_API_KEY", "k1")], client.clone());
    let (status, body) = post(app, RELAY_PATH, json!({ "prompt": "halo" })).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "quota exceeded");
}

#[tokio::test]
async fn non_post_is_rejected() {
    let client = Arc::new(ScriptedClient::default().ok("k1", "never"));
    let app = app(&[("GEMINI_API_KEY_1", "k1")], client.clone());
    let request = Request::builder()
        .method(Method::GET)
        .uri(RELAY_PATH)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()["allow"], "POST");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"Method Not Allowed");
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn malformed_body_is_a_bad_request() {
    let client = Arc::new(ScriptedClient::default().ok("k1", "never"));
    let app = app(&[("GEMINI_API_KEY_1", "k1")], client.clone());
    let (status, body) = post(app, RELAY_PATH, json!({ "model": "gemini-2.0-flash" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request body");
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn health_does_not_touch_credentials() {
    let client = Arc::new(ScriptedClient::default());
    let app = app(&[], client.clone());
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn timeout_abandons_the_rotation() {
    let client = Arc::new(
        ScriptedClient::default()
            .ok("k1", "too late")
            .slow("k1", Duration::from_secs(5))
            .ok("k2", "never"),
    );
    let app = core(
        &[("GEMINI_API_KEY_1", "k1"), ("GEMINI_API_KEY_2", "k2")],
        client.clone(),
    )
    .with_timeout(Some(Duration::from_millis(100)))
    .router();
    let request = Request::builder()
        .method(Method::POST)
        .uri(RELAY_PATH)
        .header("content-type", "application/json")
        .body(Body::from(json!({ "prompt": "halo" }).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(client.calls(), vec!["k1"]);
}

#[tokio::test]
async fn oversized_body_is_rejected_before_any_call() {
    let client = Arc::new(ScriptedClient::default().ok("k1", "never"));
    let app = core(&[("GEMINI_API_KEY_1", "k1")], client.clone())
        .with_body_limit(16)
        .router();
    let request = Request::builder()
        .method(Method::POST)
        .uri(RELAY_PATH)
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "prompt": "terjemahkan kalimat yang cukup panjang ini" }).to_string(),
        ))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(client.calls().is_empty());
}
