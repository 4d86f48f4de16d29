pub mod aistudio;

pub use aistudio::{AistudioClient, DEFAULT_BASE_URL, PROVIDER_NAME};
