use async_trait::async_trait;

use crate::credential::Credential;
use crate::credential_pool::ResolveError;
use crate::request::GenerationRequest;
use crate::response::{Outcome, UpstreamFailure};

#[derive(Debug, Clone, Default)]
pub struct CallContext {
    pub request_id: Option<String>,
}

/// One text-generation call against the upstream model service with a single credential.
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    async fn generate(
        &self,
        credential: &Credential,
        model: &str,
        prompt: &str,
    ) -> Result<String, UpstreamFailure>;
}

/// Answers a whole relay request.
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    async fn call(
        &self,
        req: GenerationRequest,
        ctx: CallContext,
    ) -> Result<Outcome, ResolveError>;
}
