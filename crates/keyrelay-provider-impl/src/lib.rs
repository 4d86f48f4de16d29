pub mod client;
pub mod dispatch;
pub mod provider;
pub mod rotation;
pub mod upstream;

pub use dispatch::dispatch_generation;
pub use provider::{AistudioClient, DEFAULT_BASE_URL};
pub use rotation::RotatingProvider;
pub use upstream::{BadRequestPolicy, FailureClass, classify_failure};
