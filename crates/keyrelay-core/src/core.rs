use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{any, get};
use keyrelay_provider_core::Provider;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handler::{health_handler, relay_handler};

/// Path the browser client has always posted to.
pub const RELAY_PATH: &str = "/.netlify/functions/gemini";
pub const RELAY_API_PATH: &str = "/api/gemini";
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

pub struct CoreState {
    pub provider: Arc<dyn Provider>,
}

pub struct Core {
    state: Arc<CoreState>,
    body_limit: usize,
    timeout: Option<Duration>,
}

impl Core {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            state: Arc::new(CoreState { provider }),
            body_limit: DEFAULT_BODY_LIMIT,
            timeout: None,
        }
    }

    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// Outer bound for a whole relay request, upstream attempts included.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .route(RELAY_PATH, any(relay_handler))
            .route(RELAY_API_PATH, any(relay_handler))
            .route("/health", get(health_handler))
            .with_state(self.state.clone())
            .layer(DefaultBodyLimit::max(self.body_limit));
        if let Some(timeout) = self.timeout {
            router = router.layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                timeout,
            ));
        }
        router.layer(TraceLayer::new_for_http())
    }
}
