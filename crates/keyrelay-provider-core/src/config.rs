use std::collections::BTreeMap;

/// Read-only view of process configuration captured for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSnapshot {
    entries: BTreeMap<String, String>,
}

impl ConfigSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for ConfigSnapshot
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

pub trait ConfigSource: Send + Sync {
    fn snapshot(&self) -> ConfigSnapshot;
}

/// Captures the process environment on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSource;

impl ConfigSource for EnvSource {
    fn snapshot(&self) -> ConfigSnapshot {
        // Non-unicode entries cannot hold a usable API key.
        std::env::vars_os()
            .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)))
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticSource(pub ConfigSnapshot);

impl ConfigSource for StaticSource {
    fn snapshot(&self) -> ConfigSnapshot {
        self.0.clone()
    }
}
