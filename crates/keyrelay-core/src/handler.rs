use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method};
use axum::response::Response;
use bytes::Bytes;
use http::StatusCode;
use http::header::CONTENT_TYPE;
use serde_json::{Value, json};
use tracing::info;

use keyrelay_protocol::relay::{RelayRequestBody, RelayTextResponse};
use keyrelay_provider_core::{CallContext, GenerationRequest, Outcome};

use crate::core::CoreState;
use crate::error::ProxyError;

pub async fn relay_handler(
    State(state): State<Arc<CoreState>>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if method != Method::POST {
        return error_response(ProxyError::method_not_allowed());
    }

    let body: RelayRequestBody = match serde_json::from_slice(&body) {
        Ok(body) => body,
        Err(err) => return error_response(ProxyError::invalid_body(err.to_string())),
    };

    let ctx = CallContext {
        request_id: request_id(&headers),
    };
    info!(
        event = "relay_request",
        request_id = ctx.request_id.as_deref().unwrap_or(""),
        provider = %state.provider.name(),
        model = body.model.as_deref().unwrap_or(""),
        prompt_chars = body.prompt.chars().count()
    );

    match state
        .provider
        .call(GenerationRequest::new(body.model, body.prompt), ctx)
        .await
    {
        Ok(Outcome::Success { text }) => text_response(RelayTextResponse { text }),
        Ok(Outcome::Failure { status, message }) => {
            error_response(ProxyError::upstream(status, message))
        }
        Err(err) => error_response(ProxyError::configuration(err.to_string())),
    }
}

pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn text_response(body: RelayTextResponse) -> Response {
    match serde_json::to_vec(&body) {
        Ok(bytes) => {
            let mut resp = Response::new(Body::from(bytes));
            resp.headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            resp
        }
        Err(err) => error_response(ProxyError::upstream(
            StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            err.to_string(),
        )),
    }
}

fn error_response(err: ProxyError) -> Response {
    let mut resp = Response::new(Body::from(err.body));
    *resp.status_mut() = err.status;
    resp.headers_mut().extend(err.headers);
    resp
}

fn request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-request-id")
        .or_else(|| headers.get("x-nf-request-id"))
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}
