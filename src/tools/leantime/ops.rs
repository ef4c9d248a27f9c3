//! The three tool operations, independent of the MCP wiring.

use serde::Deserialize;
use serde_json::Value as J;

use crate::domain::{LeantimeApi, Ticket, ToolFailure, User};
use crate::infra::logging::EventSink;

/// Input of `get_tickets_assigned_to_user`.
///
/// The id stays raw JSON so that missing, falsy and mistyped values all surface as 400s
/// with a readable message instead of a deserialization error.
#[derive(Debug, Default, Deserialize, rmcp::schemars::JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct TicketsArgs {
    /// Leantime user id (required, non-zero)
    #[serde(default)]
    #[schemars(with = "Option<i64>")]
    pub user_id: Option<J>,
}

/// Input of `get_all_users_by_mail`.
#[derive(Debug, Default, Deserialize, rmcp::schemars::JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct MailArgs {
    /// Email address to look up (required, case-insensitive)
    #[serde(default)]
    #[schemars(with = "Option<String>")]
    pub mail: Option<J>,
}

fn user_id_required() -> ToolFailure {
    ToolFailure::Validation("User ID is required.".into())
}

fn user_id_not_integer() -> ToolFailure {
    ToolFailure::Validation("User ID must be an integer.".into())
}

/// Read a required, truthy user id.
///
/// Integers, integral floats (`42.0`) and numeric strings (`"42"`) are accepted.
/// Missing, `null` and `0` are "required" failures; anything else is a type failure.
pub fn required_user_id(raw: Option<&J>) -> Result<i64, ToolFailure> {
    let id = match raw {
        None | Some(J::Null) => 0,
        Some(J::Number(n)) => match n.as_i64() {
            Some(id) => id,
            None => n
                .as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() <= i64::MAX as f64)
                .map(|f| f as i64)
                .ok_or_else(user_id_not_integer)?,
        },
        Some(J::String(s)) => s.trim().parse::<i64>().map_err(|_| user_id_not_integer())?,
        Some(_) => return Err(user_id_not_integer()),
    };
    if id == 0 {
        return Err(user_id_required());
    }
    Ok(id)
}

pub fn required_mail(raw: Option<&J>) -> Result<String, ToolFailure> {
    match raw {
        Some(J::String(m)) if !m.is_empty() => Ok(m.clone()),
        None | Some(J::Null) | Some(J::String(_)) => {
            Err(ToolFailure::Validation("Email address is required.".into()))
        }
        Some(_) => Err(ToolFailure::Validation("Email address must be a string.".into())),
    }
}

pub async fn get_tickets_assigned_to_user(
    api: &dyn LeantimeApi,
    log: &dyn EventSink,
    user_id: i64,
) -> Result<Vec<Ticket>, ToolFailure> {
    if user_id == 0 {
        return Err(ToolFailure::Validation("User ID is required.".into()));
    }
    api.fetch_open_tickets_for_user(Some(user_id))
        .await
        .map_err(|e| {
            log.error(&format!("Failed to get tickets for user {user_id}: {e}"));
            ToolFailure::Downstream(format!("Failed to fetch tickets: {e}"))
        })
}

pub async fn get_all_users(
    api: &dyn LeantimeApi,
    log: &dyn EventSink,
) -> Result<Vec<User>, ToolFailure> {
    api.fetch_all_users().await.map_err(|e| {
        log.error(&format!("Failed to get users: {e}"));
        ToolFailure::Downstream(format!("Failed to fetch users: {e}"))
    })
}

/// First user whose `email` equals `mail`, ignoring case.
pub async fn get_user_by_email(
    api: &dyn LeantimeApi,
    log: &dyn EventSink,
    mail: &str,
) -> Result<Option<User>, ToolFailure> {
    if mail.is_empty() {
        return Err(ToolFailure::Validation("Email address is required.".into()));
    }
    let users = get_all_users(api, log).await?;
    Ok(find_by_email(users, mail))
}

pub fn find_by_email(users: Vec<User>, mail: &str) -> Option<User> {
    let wanted = mail.to_lowercase();
    users.into_iter().find(|u| {
        u.get("email")
            .and_then(J::as_str)
            .is_some_and(|e| e.to_lowercase() == wanted)
    })
}
