pub mod config;
pub mod credential;
pub mod credential_pool;
pub mod provider;
pub mod request;
pub mod response;

pub use config::{ConfigSnapshot, ConfigSource, EnvSource, StaticSource};
pub use credential::{Credential, CredentialTier};
pub use credential_pool::{
    CredentialPool, CredentialResolver, KeyOrder, NumericOrder, PoolNames, RandomOrder,
    ResolveError,
};
pub use provider::{CallContext, GenerativeClient, Provider};
pub use request::{DEFAULT_MODEL, GenerationRequest};
pub use response::{Outcome, UpstreamFailure};
