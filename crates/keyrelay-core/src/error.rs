use bytes::Bytes;
use http::header::{ALLOW, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, StatusCode};

use keyrelay_protocol::relay::RelayErrorResponse;

pub const RETRY_HINT: &str = "Please try again later or check API key status.";

#[derive(Debug)]
pub struct ProxyError {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ProxyError {
    pub fn method_not_allowed() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ALLOW, HeaderValue::from_static("POST"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
        Self {
            status: StatusCode::METHOD_NOT_ALLOWED,
            headers,
            body: Bytes::from_static(b"Method Not Allowed"),
        }
    }

    pub fn invalid_body(details: impl Into<String>) -> Self {
        Self::json(
            StatusCode::BAD_REQUEST,
            RelayErrorResponse {
                error: "Invalid request body".to_string(),
                details: Some(details.into()),
            },
        )
    }

    /// No credential could be resolved; reported before any upstream call.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::json(
            StatusCode::INTERNAL_SERVER_ERROR,
            RelayErrorResponse {
                error: message.into(),
                details: None,
            },
        )
    }

    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        let status = StatusCode::from_u16(status)
            .ok()
            .filter(|status| status.is_client_error() || status.is_server_error())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::json(
            status,
            RelayErrorResponse {
                error: message.into(),
                details: Some(RETRY_HINT.to_string()),
            },
        )
    }

    fn json(status: StatusCode, body: RelayErrorResponse) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let body = serde_json::to_vec(&body).map(Bytes::from).unwrap_or_default();
        Self {
            status,
            headers,
            body,
        }
    }
}
