use serde::{Deserialize, Serialize};

/// Failures that stop a request from being relayed.
///
/// An upstream that answers with a 4xx/5xx is not an error here; its status is
/// relayed like any other.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Invalid upstream URL {target}: {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("Upstream request to {target} timed out")]
    Timeout { target: String },

    #[error("Upstream request to {target} failed: {source}")]
    Transport {
        target: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ProxyError {
    /// Classify a reqwest failure against the URL that was attempted
    pub fn from_reqwest(target: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProxyError::Timeout {
                target: target.to_string(),
            }
        } else {
            ProxyError::Transport {
                target: target.to_string(),
                source: err,
            }
        }
    }

    /// The upstream URL that was attempted, if any
    pub fn target(&self) -> Option<&str> {
        match self {
            ProxyError::InvalidTarget { target, .. }
            | ProxyError::Timeout { target }
            | ProxyError::Transport { target, .. } => Some(target),
            ProxyError::Client(_) => None,
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            error: "Proxy request failed".to_string(),
            message: self.to_string(),
        }
    }
}

/// JSON body returned with a 500 when the upstream could not be reached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
    pub message: String,
}
