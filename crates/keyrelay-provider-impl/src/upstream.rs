use http::StatusCode;

use keyrelay_protocol::gemini::ErrorResponse;
use keyrelay_provider_core::UpstreamFailure;

/// How a 400 from upstream is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BadRequestPolicy {
    /// Every 400 is a request-content problem.
    Terminal,
    /// A 400 whose message mentions "api key" is a credential problem.
    #[default]
    RetryOnKeyMessage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Retryable,
    Terminal,
}

impl FailureClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureClass::Retryable => "retryable",
            FailureClass::Terminal => "terminal",
        }
    }
}

pub fn classify_failure(failure: &UpstreamFailure, policy: BadRequestPolicy) -> FailureClass {
    if failure.status != StatusCode::BAD_REQUEST.as_u16() {
        return FailureClass::Retryable;
    }
    match policy {
        BadRequestPolicy::Terminal => FailureClass::Terminal,
        BadRequestPolicy::RetryOnKeyMessage if mentions_api_key(&failure.message) => {
            FailureClass::Retryable
        }
        BadRequestPolicy::RetryOnKeyMessage => FailureClass::Terminal,
    }
}

fn mentions_api_key(message: &str) -> bool {
    message.to_ascii_lowercase().contains("api key")
}

/// Normalizes a non-2xx upstream response into a status and a message.
pub fn failure_from_response(status: StatusCode, body: &[u8]) -> UpstreamFailure {
    let message = serde_json::from_slice::<ErrorResponse>(body)
        .ok()
        .and_then(|envelope| envelope.error.message)
        .filter(|message| !message.trim().is_empty())
        .or_else(|| {
            let text = String::from_utf8_lossy(body).trim().to_string();
            (!text.is_empty()).then_some(text)
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("upstream request failed")
                .to_string()
        });
    UpstreamFailure::new(status.as_u16(), message)
}

pub fn network_failure(err: wreq::Error) -> UpstreamFailure {
    UpstreamFailure::without_status(err.to_string())
}
