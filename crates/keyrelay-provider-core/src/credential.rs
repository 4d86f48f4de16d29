use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialTier {
    LegacyDefault,
    Normal,
    UltimateFallback,
}

impl CredentialTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialTier::LegacyDefault => "legacy-default",
            CredentialTier::Normal => "normal",
            CredentialTier::UltimateFallback => "ultimate-fallback",
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    source: String,
    secret: String,
    tier: CredentialTier,
}

impl Credential {
    pub fn new(source: impl Into<String>, secret: impl Into<String>, tier: CredentialTier) -> Self {
        Self {
            source: source.into(),
            secret: secret.into(),
            tier,
        }
    }

    /// Configuration variable the secret was read from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn tier(&self) -> CredentialTier {
        self.tier
    }

    /// Last four characters of the secret, safe to log.
    pub fn suffix(&self) -> &str {
        let start = self
            .secret
            .char_indices()
            .rev()
            .nth(3)
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        &self.secret[start..]
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("source", &self.source)
            .field("secret", &format_args!("...{}", self.suffix()))
            .field("tier", &self.tier)
            .finish()
    }
}
