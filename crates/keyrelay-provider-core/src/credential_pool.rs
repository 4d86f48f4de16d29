use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use rand::seq::SliceRandom;
use thiserror::Error;
use tracing::debug;

use crate::config::ConfigSnapshot;
use crate::credential::{Credential, CredentialTier};

pub const NORMAL_KEY_PREFIX: &str = "GEMINI_API_KEY_";
pub const ULTIMATE_FALLBACK_KEY: &str = "GEMINI_API_KEY_FALLBACK";
pub const LEGACY_DEFAULT_KEY: &str = "GEMINI_API_KEY";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("No Gemini API keys found in environment variables")]
    NoCredentials,
}

/// Configuration names the resolver reads credentials from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolNames {
    pub normal_prefix: String,
    pub ultimate_fallback: String,
    pub legacy_default: String,
}

impl Default for PoolNames {
    fn default() -> Self {
        Self {
            normal_prefix: NORMAL_KEY_PREFIX.to_string(),
            ultimate_fallback: ULTIMATE_FALLBACK_KEY.to_string(),
            legacy_default: LEGACY_DEFAULT_KEY.to_string(),
        }
    }
}

/// Orders the normal tier of a pool. Other tiers are positioned by the resolver.
pub trait KeyOrder: Send + Sync {
    fn name(&self) -> &'static str;

    fn order(&self, credentials: &mut [Credential]);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RandomOrder;

impl KeyOrder for RandomOrder {
    fn name(&self) -> &'static str {
        "random"
    }

    fn order(&self, credentials: &mut [Credential]) {
        credentials.shuffle(&mut rand::rng());
    }
}

/// Ascending by the number trailing the variable name; unnumbered names go last, by name.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericOrder;

impl KeyOrder for NumericOrder {
    fn name(&self) -> &'static str {
        "numeric"
    }

    fn order(&self, credentials: &mut [Credential]) {
        credentials.sort_by(|a, b| {
            match (numeric_suffix(a.source()), numeric_suffix(b.source())) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
            .then_with(|| a.source().cmp(b.source()))
        });
    }
}

fn numeric_suffix(name: &str) -> Option<u64> {
    let digits = name.len() - name.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    name[name.len() - digits..].parse().ok()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialPool {
    credentials: Vec<Credential>,
}

impl CredentialPool {
    pub fn new(credentials: Vec<Credential>) -> Self {
        Self { credentials }
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Credential> {
        self.credentials.iter()
    }

    pub fn credentials(&self) -> &[Credential] {
        &self.credentials
    }
}

impl<'a> IntoIterator for &'a CredentialPool {
    type Item = &'a Credential;
    type IntoIter = std::slice::Iter<'a, Credential>;

    fn into_iter(self) -> Self::IntoIter {
        self.credentials.iter()
    }
}

#[derive(Clone)]
pub struct CredentialResolver {
    names: PoolNames,
    order: Arc<dyn KeyOrder>,
}

impl CredentialResolver {
    pub fn new(names: PoolNames, order: Arc<dyn KeyOrder>) -> Self {
        Self { names, order }
    }

    pub fn order_name(&self) -> &'static str {
        self.order.name()
    }

    /// Builds `[legacy-default?] + [normal, ordered] + [ultimate-fallback?]` with unique secrets.
    pub fn resolve(&self, config: &ConfigSnapshot) -> Result<CredentialPool, ResolveError> {
        let mut seen: HashSet<&str> = HashSet::new();

        let mut normal = Vec::new();
        for (name, value) in config.iter() {
            if !name.starts_with(self.names.normal_prefix.as_str())
                || name == self.names.ultimate_fallback
                || name == self.names.legacy_default
            {
                continue;
            }
            let value = value.trim();
            if value.is_empty() || !seen.insert(value) {
                continue;
            }
            normal.push(Credential::new(name, value, CredentialTier::Normal));
        }
        self.order.order(&mut normal);

        let fallback = self
            .configured(config, &self.names.ultimate_fallback)
            .filter(|value| seen.insert(*value))
            .map(|value| {
                Credential::new(
                    self.names.ultimate_fallback.as_str(),
                    value,
                    CredentialTier::UltimateFallback,
                )
            });

        let legacy = self
            .configured(config, &self.names.legacy_default)
            .filter(|value| seen.insert(*value))
            .map(|value| {
                Credential::new(
                    self.names.legacy_default.as_str(),
                    value,
                    CredentialTier::LegacyDefault,
                )
            });

        let mut credentials = Vec::with_capacity(normal.len() + 2);
        credentials.extend(legacy);
        credentials.extend(normal);
        credentials.extend(fallback);

        if credentials.is_empty() {
            return Err(ResolveError::NoCredentials);
        }
        debug!(
            event = "pool_resolved",
            order = self.order.name(),
            size = credentials.len(),
            keys = ?credentials.iter().map(Credential::suffix).collect::<Vec<_>>()
        );
        Ok(CredentialPool::new(credentials))
    }

    fn configured<'a>(&self, config: &'a ConfigSnapshot, name: &str) -> Option<&'a str> {
        config
            .get(name)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}
