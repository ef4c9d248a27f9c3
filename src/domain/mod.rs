use async_trait::async_trait;
use serde_json::Value as J;
use thiserror::Error;

use crate::core::error::LeantimeError;
pub use crate::core::rows::Row;

/// A Leantime ticket row, passed through as returned (minus positional keys).
pub type Ticket = Row;
/// A Leantime user row, passed through as returned (minus positional keys).
pub type User = Row;

/// Outcome of a JSON-RPC fetch that reached Leantime and parsed.
///
/// Keeps "the call was rejected" apart from "there is nothing to return".
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Rows(Vec<T>),
    RemoteError(J),
}

impl<T> Fetched<T> {
    pub fn is_remote_error(&self) -> bool {
        matches!(self, Fetched::RemoteError(_))
    }

    /// Strict view: a remote error becomes `LeantimeError::Remote`.
    pub fn into_result(self) -> Result<Vec<T>, LeantimeError> {
        match self {
            Fetched::Rows(rows) => Ok(rows),
            Fetched::RemoteError(err) => Err(LeantimeError::Remote(err)),
        }
    }
}

/// Operations the tool server needs from Leantime.
///
/// The plain methods carry the soft-fail contract: a JSON-RPC `error` member yields an
/// empty `Vec`. Transport and parse failures are always returned as `Err`.
#[async_trait]
pub trait LeantimeApi: Send + Sync + 'static {
    async fn fetch_open_tickets_for_user(
        &self,
        user_id: Option<i64>,
    ) -> Result<Vec<Ticket>, LeantimeError>;

    async fn fetch_all_users(&self) -> Result<Vec<User>, LeantimeError>;
}

/// Uniform failure of a tool operation, with an HTTP-style status.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ToolFailure {
    /// Required caller input missing; nothing was sent upstream.
    #[error("{0}")]
    Validation(String),
    /// The Leantime call failed.
    #[error("{0}")]
    Downstream(String),
}

impl ToolFailure {
    pub fn status(&self) -> u16 {
        match self {
            ToolFailure::Validation(_) => 400,
            ToolFailure::Downstream(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strict_view_surfaces_remote_error() {
        let f: Fetched<Ticket> = Fetched::RemoteError(json!({"message": "denied"}));
        assert!(f.is_remote_error());
        let err = f.into_result().unwrap_err();
        assert!(err.is_remote());
    }

    #[test]
    fn failures_map_to_http_statuses() {
        let v = ToolFailure::Validation("User ID is required.".into());
        assert_eq!(v.status(), 400);
        assert_eq!(v.to_string(), "User ID is required.");
        assert_eq!(ToolFailure::Downstream("boom".into()).status(), 500);
    }

    #[test]
    fn rows_pass_through() {
        let f: Fetched<u8> = Fetched::Rows(vec![1, 2]);
        assert!(!f.is_remote_error());
        assert_eq!(f.into_result().unwrap(), vec![1, 2]);
    }
}
