use client_core::ClientError;
use thiserror::Error;

/// Shown when a long-running call times out; the job is likely still running remotely.
pub const MINING_TIMEOUT_GUIDANCE: &str = "Entity mining is taking longer than expected. \
The job may still be processing on the server; wait a few minutes and retry.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Validation,
    Network,
    Timeout,
}

impl FailureKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Network => "network",
            Self::Timeout => "timeout",
        }
    }

    /// Timeouts are a network failure that may still complete remotely.
    pub fn is_network(self) -> bool {
        matches!(self, Self::Network | Self::Timeout)
    }
}

/// A failure tagged for display. Built once at a controller boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ClassifiedFailure {
    kind: FailureKind,
    message: String,
}

impl ClassifiedFailure {
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Validation,
            message: message.into(),
        }
    }

    /// Classifies a failed request. Timeouts count as plain network failures here.
    pub fn from_client_error(err: &ClientError) -> Self {
        match err {
            ClientError::Validation(message) => Self::validation(message.clone()),
            other => Self {
                kind: FailureKind::Network,
                message: other.user_message(),
            },
        }
    }

    /// Classifies a failed long-running request, keeping timeouts distinct.
    pub fn from_long_running_error(err: &ClientError) -> Self {
        if err.is_timeout() {
            return Self {
                kind: FailureKind::Timeout,
                message: MINING_TIMEOUT_GUIDANCE.to_string(),
            };
        }
        Self::from_client_error(err)
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
