use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use keyrelay_core::DEFAULT_BODY_LIMIT;
use keyrelay_provider_core::credential_pool::{
    LEGACY_DEFAULT_KEY, NORMAL_KEY_PREFIX, ULTIMATE_FALLBACK_KEY,
};
use keyrelay_provider_core::{DEFAULT_MODEL, KeyOrder, NumericOrder, PoolNames, RandomOrder};
use keyrelay_provider_impl::BadRequestPolicy;

#[derive(Debug, Parser)]
#[command(name = "keyrelay", version, about = "Gemini relay that rotates across a pool of API keys")]
pub(crate) struct Cli {
    #[arg(long, env = "KEYRELAY_HOST", default_value = "127.0.0.1")]
    pub(crate) host: String,
    #[arg(long, env = "KEYRELAY_PORT", default_value_t = 8888)]
    pub(crate) port: u16,
    #[arg(long, env = "KEYRELAY_DEFAULT_MODEL", default_value = DEFAULT_MODEL)]
    pub(crate) default_model: String,
    #[arg(
        long,
        env = "KEYRELAY_BAD_REQUEST_POLICY",
        value_enum,
        default_value_t = BadRequestArg::RetryOnKeyMessage
    )]
    pub(crate) bad_request_policy: BadRequestArg,
    /// Whole-request deadline; unset leaves it to the hosting environment.
    #[arg(long, env = "KEYRELAY_REQUEST_TIMEOUT_SECS")]
    pub(crate) request_timeout_secs: Option<u64>,
    #[arg(long, env = "KEYRELAY_BODY_LIMIT_BYTES", default_value_t = DEFAULT_BODY_LIMIT)]
    pub(crate) body_limit_bytes: usize,

    #[command(flatten)]
    pub(crate) upstream: UpstreamArgs,

    #[command(subcommand)]
    pub(crate) command: Option<Command>,
}

#[derive(Debug, Args)]
pub(crate) struct UpstreamArgs {
    #[arg(long, global = true, env = "KEYRELAY_BASE_URL")]
    pub(crate) base_url: Option<String>,
    #[arg(long, global = true, env = "KEYRELAY_PROXY")]
    pub(crate) proxy: Option<String>,
    #[arg(
        long,
        global = true,
        env = "KEYRELAY_KEY_ORDER",
        value_enum,
        default_value_t = KeyOrderArg::Random
    )]
    pub(crate) key_order: KeyOrderArg,
    #[arg(long, global = true, env = "KEYRELAY_KEY_PREFIX", default_value = NORMAL_KEY_PREFIX)]
    pub(crate) key_prefix: String,
    #[arg(long, global = true, env = "KEYRELAY_FALLBACK_KEY_NAME", default_value = ULTIMATE_FALLBACK_KEY)]
    pub(crate) fallback_key_name: String,
    #[arg(long, global = true, env = "KEYRELAY_LEGACY_KEY_NAME", default_value = LEGACY_DEFAULT_KEY)]
    pub(crate) legacy_key_name: String,
}

impl UpstreamArgs {
    pub(crate) fn pool_names(&self) -> PoolNames {
        PoolNames {
            normal_prefix: self.key_prefix.clone(),
            ultimate_fallback: self.fallback_key_name.clone(),
            legacy_default: self.legacy_key_name.clone(),
        }
    }
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Try every configured key against a list of models and report which work.
    Probe(ProbeArgs),
}

#[derive(Debug, Args)]
pub(crate) struct ProbeArgs {
    #[arg(
        long = "model",
        value_delimiter = ',',
        default_values = ["gemini-1.5-flash", "gemini-pro"]
    )]
    pub(crate) models: Vec<String>,
    #[arg(long, default_value = "test")]
    pub(crate) prompt: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum KeyOrderArg {
    Random,
    Numeric,
}

impl KeyOrderArg {
    pub(crate) fn strategy(self) -> Arc<dyn KeyOrder> {
        match self {
            KeyOrderArg::Random => Arc::new(RandomOrder),
            KeyOrderArg::Numeric => Arc::new(NumericOrder),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum BadRequestArg {
    Terminal,
    RetryOnKeyMessage,
}

impl From<BadRequestArg> for BadRequestPolicy {
    fn from(value: BadRequestArg) -> Self {
        match value {
            BadRequestArg::Terminal => BadRequestPolicy::Terminal,
            BadRequestArg::RetryOnKeyMessage => BadRequestPolicy::RetryOnKeyMessage,
        }
    }
}
