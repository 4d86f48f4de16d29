pub mod core;
pub mod error;
pub mod handler;

pub use crate::core::{Core, CoreState, DEFAULT_BODY_LIMIT, RELAY_API_PATH, RELAY_PATH};
pub use error::{ProxyError, RETRY_HINT};
