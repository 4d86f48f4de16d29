use tracing::{info, warn};

use keyrelay_provider_core::{
    CallContext, CredentialPool, GenerationRequest, GenerativeClient, Outcome, UpstreamFailure,
};

use crate::upstream::{BadRequestPolicy, FailureClass, classify_failure};

const ALL_KEYS_FAILED: &str = "All API keys failed";

/// Tries the pool in order, one attempt per credential, strictly sequentially.
///
/// Stops at the first success or the first terminal failure. When every
/// credential fails with a retryable error the last of those errors is reported.
pub async fn dispatch_generation<C>(
    client: &C,
    pool: &CredentialPool,
    req: &GenerationRequest,
    default_model: &str,
    policy: BadRequestPolicy,
    ctx: &CallContext,
) -> Outcome
where
    C: GenerativeClient + ?Sized,
{
    let model = req.model_or(default_model);
    let mut last_failure: Option<UpstreamFailure> = None;

    for (idx, credential) in pool.iter().enumerate() {
        let attempt = idx + 1;
        match client.generate(credential, model, &req.prompt).await {
            Ok(text) => {
                info!(
                    event = "attempt_succeeded",
                    request_id = ctx.request_id.as_deref().unwrap_or(""),
                    attempt = attempt,
                    key_suffix = %credential.suffix(),
                    tier = credential.tier().as_str(),
                    model = %model
                );
                return Outcome::Success { text };
            }
            Err(failure) => {
                let class = classify_failure(&failure, policy);
                warn!(
                    event = "attempt_failed",
                    request_id = ctx.request_id.as_deref().unwrap_or(""),
                    attempt = attempt,
                    key_suffix = %credential.suffix(),
                    tier = credential.tier().as_str(),
                    model = %model,
                    status = failure.status,
                    class = class.as_str(),
                    error = %failure.message
                );
                match class {
                    FailureClass::Terminal => return failure.into(),
                    FailureClass::Retryable => last_failure = Some(failure),
                }
            }
        }
    }

    last_failure
        .unwrap_or_else(|| UpstreamFailure::without_status(ALL_KEYS_FAILED))
        .into()
}
