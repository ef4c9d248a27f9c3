use thiserror::Error;

/// Failure channels of the Leantime JSON-RPC client.
///
/// `Transport` and `Parse` always reach the caller. `Remote` is the JSON-RPC level
/// `error` member; the default fetch path logs it and yields an empty result instead.
#[derive(Debug, Error)]
pub enum LeantimeError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("invalid JSON response: {0}")]
    Parse(String),
    #[error("API error: {0}")]
    Remote(serde_json::Value),
}

impl LeantimeError {
    pub fn is_remote(&self) -> bool {
        matches!(self, LeantimeError::Remote(_))
    }
}

impl From<reqwest::Error> for LeantimeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            LeantimeError::Parse(e.to_string())
        } else {
            LeantimeError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for LeantimeError {
    fn from(e: serde_json::Error) -> Self {
        LeantimeError::Parse(e.to_string())
    }
}
