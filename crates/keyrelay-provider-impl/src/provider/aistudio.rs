use std::time::Instant;

use async_trait::async_trait;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, StatusCode};
use tracing::{info, warn};

use keyrelay_protocol::gemini::generate_content::{
    GenerateContentRequest, GenerateContentResponse,
};
use keyrelay_provider_core::{Credential, GenerativeClient, UpstreamFailure};

use crate::client::build_client;
use crate::upstream::{failure_from_response, network_failure};

pub const PROVIDER_NAME: &str = "aistudio";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Generative Language API (`generateContent`) client.
#[derive(Debug, Clone)]
pub struct AistudioClient {
    client: wreq::Client,
    base_url: String,
}

impl AistudioClient {
    pub fn new(base_url: Option<&str>, proxy: Option<&str>) -> Result<Self, wreq::Error> {
        Ok(Self {
            client: build_client(proxy)?,
            base_url: base_url
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl GenerativeClient for AistudioClient {
    async fn generate(
        &self,
        credential: &Credential,
        model: &str,
        prompt: &str,
    ) -> Result<String, UpstreamFailure> {
        let model = valid_model_name(model)?;
        let request = GenerateContentRequest::from_prompt(model, prompt);
        let path = format!("/v1beta/models/{}:generateContent", request.path.model);
        let url = build_url(&self.base_url, &path);
        let headers = build_gemini_headers(credential.secret())?;
        let started_at = Instant::now();
        info!(
            event = "upstream_request",
            provider = %PROVIDER_NAME,
            op = "gemini.generate",
            method = "POST",
            path = %path,
            model = %model,
            key_suffix = %credential.suffix()
        );
        let response = self
            .client
            .post(url)
            .headers(headers)
            .json(&request.body)
            .send()
            .await
            .map_err(|err| {
                warn!(
                    event = "upstream_response",
                    provider = %PROVIDER_NAME,
                    op = "gemini.generate",
                    status = "error",
                    elapsed_ms = started_at.elapsed().as_millis(),
                    error = %err
                );
                network_failure(err)
            })?;
        let status = response.status();
        info!(
            event = "upstream_response",
            provider = %PROVIDER_NAME,
            op = "gemini.generate",
            status = %status.as_u16(),
            elapsed_ms = started_at.elapsed().as_millis()
        );

        let body = response.bytes().await.map_err(network_failure)?;
        if !status.is_success() {
            return Err(failure_from_response(status, &body));
        }
        let payload: GenerateContentResponse = serde_json::from_slice(&body).map_err(|err| {
            UpstreamFailure::without_status(format!("invalid generateContent response: {err}"))
        })?;
        payload.text().ok_or_else(|| match payload.block_reason() {
            Some(reason) => {
                UpstreamFailure::without_status(format!("Response was blocked due to {reason}"))
            }
            None => UpstreamFailure::without_status("Response contained no text"),
        })
    }
}

fn build_gemini_headers(api_key: &str) -> Result<HeaderMap, UpstreamFailure> {
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-goog-api-key",
        HeaderValue::from_str(api_key).map_err(|err| {
            UpstreamFailure::without_status(format!("api key is not a valid header value: {err}"))
        })?,
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

/// Model names become a URL path segment on a request carrying the key.
fn valid_model_name(model: &str) -> Result<&str, UpstreamFailure> {
    let name = model.trim_start_matches("models/");
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-');
    if name.is_empty() || !name.chars().all(allowed) {
        return Err(UpstreamFailure::new(
            StatusCode::BAD_REQUEST.as_u16(),
            format!("invalid model name: {model:?}"),
        ));
    }
    Ok(name)
}

fn build_url(base: &str, path: &str) -> String {
    let mut path = path.trim_start_matches('/');
    if base.ends_with("/v1beta") && path.starts_with("v1beta/") {
        path = path.trim_start_matches("v1beta/");
    }
    format!("{base}/{path}")
}
