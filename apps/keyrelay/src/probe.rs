use std::error::Error;

use keyrelay_provider_core::{
    ConfigSource, Credential, CredentialPool, CredentialResolver, EnvSource, GenerativeClient,
    UpstreamFailure,
};

use crate::cli::ProbeArgs;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ModelAttempt {
    pub(crate) model: String,
    pub(crate) result: Result<(), UpstreamFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct KeyReport {
    pub(crate) source: String,
    pub(crate) suffix: String,
    pub(crate) attempts: Vec<ModelAttempt>,
}

impl KeyReport {
    pub(crate) fn working_model(&self) -> Option<&str> {
        self.attempts
            .iter()
            .find(|attempt| attempt.result.is_ok())
            .map(|attempt| attempt.model.as_str())
    }
}

pub(crate) async fn run(
    resolver: &CredentialResolver,
    client: &dyn GenerativeClient,
    args: &ProbeArgs,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let pool = resolver.resolve(&EnvSource.snapshot())?;
    let reports = probe_pool(&pool, client, &args.models, &args.prompt).await;

    for report in &reports {
        for attempt in &report.attempts {
            match &attempt.result {
                Ok(()) => println!("{} ...{} {}: ok", report.source, report.suffix, attempt.model),
                Err(failure) => println!(
                    "{} ...{} {}: {}",
                    report.source, report.suffix, attempt.model, failure
                ),
            }
        }
    }
    let healthy = reports
        .iter()
        .filter(|report| report.working_model().is_some())
        .count();
    println!("{healthy}/{} keys answered", reports.len());

    if healthy == 0 {
        return Err("no key produced a successful response".into());
    }
    Ok(())
}

/// Per key, tries the models in order and stops at the first one that answers.
pub(crate) async fn probe_pool(
    pool: &CredentialPool,
    client: &dyn GenerativeClient,
    models: &[String],
    prompt: &str,
) -> Vec<KeyReport> {
    let mut reports = Vec::with_capacity(pool.len());
    for credential in pool {
        reports.push(probe_key(credential, client, models, prompt).await);
    }
    reports
}

async fn probe_key(
    credential: &Credential,
    client: &dyn GenerativeClient,
    models: &[String],
    prompt: &str,
) -> KeyReport {
    let mut attempts = Vec::new();
    for model in models {
        let result = client.generate(credential, model, prompt).await.map(|_| ());
        let answered = result.is_ok();
        attempts.push(ModelAttempt {
            model: model.clone(),
            result,
        });
        if answered {
            break;
        }
    }
    KeyReport {
        source: credential.source().to_string(),
        suffix: credential.suffix().to_string(),
        attempts,
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use keyrelay_provider_core::CredentialTier;

    use super::*;

    struct OnlyPro;

    #[async_trait]
    impl GenerativeClient for OnlyPro {
        async fn generate(
            &self,
            credential: &Credential,
            model: &str,
            _prompt: &str,
        ) -> Result<String, UpstreamFailure> {
            match (credential.secret(), model) {
                ("dead-0001", _) => Err(UpstreamFailure::new(403, "leaked")),
                (_, "gemini-pro") => Ok("ok".to_string()),
                _ => Err(UpstreamFailure::new(404, "model not found")),
            }
        }
    }

    #[tokio::test]
    async fn falls_through_models_until_one_answers() {
        let pool = CredentialPool::new(vec![
            Credential::new("GEMINI_API_KEY_1", "live-0002", CredentialTier::Normal),
            Credential::new("GEMINI_API_KEY_2", "dead-0001", CredentialTier::Normal),
        ]);
        let models = vec!["gemini-1.5-flash".to_string(), "gemini-pro".to_string()];
        let reports = probe_pool(&pool, &OnlyPro, &models, "test").await;

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].suffix, "0002");
        assert_eq!(reports[0].attempts.len(), 2);
        assert_eq!(reports[0].working_model(), Some("gemini-pro"));

        assert_eq!(reports[1].attempts.len(), 2);
        assert_eq!(reports[1].working_model(), None);
        assert_eq!(
            reports[1].attempts[0].result,
            Err(UpstreamFailure::new(403, "leaked"))
        );
    }
}
