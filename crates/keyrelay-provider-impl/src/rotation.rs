use std::sync::Arc;

use async_trait::async_trait;
use tracing::error;

use keyrelay_provider_core::{
    CallContext, ConfigSource, CredentialResolver, DEFAULT_MODEL, GenerationRequest,
    GenerativeClient, Outcome, Provider, ResolveError,
};

use crate::dispatch::dispatch_generation;
use crate::provider::PROVIDER_NAME;
use crate::upstream::BadRequestPolicy;

/// Resolves a fresh credential pool per request and rotates through it.
pub struct RotatingProvider {
    resolver: CredentialResolver,
    source: Arc<dyn ConfigSource>,
    client: Arc<dyn GenerativeClient>,
    policy: BadRequestPolicy,
    default_model: String,
}

impl RotatingProvider {
    pub fn new(
        resolver: CredentialResolver,
        source: Arc<dyn ConfigSource>,
        client: Arc<dyn GenerativeClient>,
    ) -> Self {
        Self {
            resolver,
            source,
            client,
            policy: BadRequestPolicy::default(),
            default_model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_policy(mut self, policy: BadRequestPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn policy(&self) -> BadRequestPolicy {
        self.policy
    }
}

#[async_trait]
impl Provider for RotatingProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn call(
        &self,
        req: GenerationRequest,
        ctx: CallContext,
    ) -> Result<Outcome, ResolveError> {
        let snapshot = self.source.snapshot();
        let pool = self.resolver.resolve(&snapshot).map_err(|err| {
            error!(
                event = "pool_unavailable",
                request_id = ctx.request_id.as_deref().unwrap_or(""),
                error = %err
            );
            err
        })?;
        Ok(dispatch_generation(
            self.client.as_ref(),
            &pool,
            &req,
            &self.default_model,
            self.policy,
            &ctx,
        )
        .await)
    }
}
