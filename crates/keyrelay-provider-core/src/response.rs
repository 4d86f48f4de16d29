use std::fmt;

/// Upstream failure normalized at the client boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamFailure {
    pub status: u16,
    pub message: String,
}

impl UpstreamFailure {
    pub const UNKNOWN_STATUS: u16 = 500;

    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Failure that carried no explicit status.
    pub fn without_status(message: impl Into<String>) -> Self {
        Self::new(Self::UNKNOWN_STATUS, message)
    }
}

impl fmt::Display for UpstreamFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.status, self.message)
    }
}

impl std::error::Error for UpstreamFailure {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success { text: String },
    Failure { status: u16, message: String },
}

impl From<UpstreamFailure> for Outcome {
    fn from(failure: UpstreamFailure) -> Self {
        Outcome::Failure {
            status: failure.status,
            message: failure.message,
        }
    }
}
