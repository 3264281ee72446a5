use thiserror::Error;

/// Failure of a single API request.
///
/// Variants carry owned strings rather than the underlying `reqwest::Error`
/// so results can be cloned into completion events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("{0}")]
    Validation(String),
    #[error("request failed with status code {status}")]
    Status { status: u16, detail: Option<String> },
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for transport timeouts and for gateway/request timeout statuses.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Status { status, .. } => matches!(status, 408 | 504),
            _ => false,
        }
    }

    /// The server's `detail` when present, otherwise the error's own text.
    pub fn user_message(&self) -> String {
        match self.detail() {
            Some(detail) => detail.to_string(),
            None => self.to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status {
                status: status.as_u16(),
                detail: None,
            }
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        Self::Validation(format!("invalid api url: {err}"))
    }
}
