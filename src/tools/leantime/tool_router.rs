use std::future::Future;
use std::sync::Arc;

use rmcp::handler::server::tool::{Parameters, ToolRouter};
use rmcp::model::{Implementation, ServerCapabilities, ServerInfo};
use serde_json::json;

use crate::domain::{LeantimeApi, ToolFailure};
use crate::infra::logging::EventSink;
use crate::infra::runtime::mcp_transport::ServerHandler;
use crate::tools::leantime::ops::{self, MailArgs, TicketsArgs};

pub const INSTRUCTIONS: &str = "This is a Leantime ticket management service that retrieves \
information about tickets and users in the Leantime project management system. You can list the \
open tickets assigned to a user by their Leantime user ID, list all users, or find a user by email \
address. Tickets carry headline, description, creation and due dates, project, status and hour \
estimates.";

impl From<ToolFailure> for rmcp::ErrorData {
    fn from(f: ToolFailure) -> Self {
        let data = Some(json!({ "status": f.status() }));
        match f {
            ToolFailure::Validation(msg) => rmcp::ErrorData::invalid_params(msg, data),
            ToolFailure::Downstream(msg) => rmcp::ErrorData::internal_error(msg, data),
        }
    }
}

#[derive(Clone)]
pub struct LeantimeSvc {
    api: Arc<dyn LeantimeApi>,
    log: Arc<dyn EventSink>,
}

impl LeantimeSvc {
    pub fn new(api: Arc<dyn LeantimeApi>, log: Arc<dyn EventSink>) -> Self {
        Self { api, log }
    }
}

impl ServerHandler for LeantimeSvc {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(INSTRUCTIONS.into()),
            ..Default::default()
        }
    }
}

#[rmcp::tool_router]
impl LeantimeSvc {
    #[rmcp::tool(
        name = "get_tickets_assigned_to_user",
        description = "Get open tickets assigned to a Leantime user. Input: {\"user_id\": int}. Returns {\"tickets\": [...]}"
    )]
    async fn get_tickets_assigned_to_user(
        &self,
        Parameters(args): Parameters<TicketsArgs>,
    ) -> Result<rmcp::Json<serde_json::Value>, rmcp::ErrorData> {
        tracing::debug!(?args, "get_tickets_assigned_to_user invoked");
        let user_id = ops::required_user_id(args.user_id.as_ref())?;
        let tickets =
            ops::get_tickets_assigned_to_user(self.api.as_ref(), self.log.as_ref(), user_id)
                .await?;
        Ok(rmcp::Json(json!({ "tickets": tickets })))
    }

    #[rmcp::tool(
        name = "get_all_users",
        description = "Get all users registered in Leantime. Returns {\"users\": [...]}"
    )]
    async fn get_all_users(&self) -> Result<rmcp::Json<serde_json::Value>, rmcp::ErrorData> {
        let users = ops::get_all_users(self.api.as_ref(), self.log.as_ref()).await?;
        Ok(rmcp::Json(json!({ "users": users })))
    }

    #[rmcp::tool(
        name = "get_all_users_by_mail",
        description = "Find a Leantime user by email address (case-insensitive). Input: {\"mail\": string}. Returns {\"user\": {...}}, empty when not found"
    )]
    async fn get_all_users_by_mail(
        &self,
        Parameters(args): Parameters<MailArgs>,
    ) -> Result<rmcp::Json<serde_json::Value>, rmcp::ErrorData> {
        let mail = ops::required_mail(args.mail.as_ref())?;
        let user = ops::get_user_by_email(self.api.as_ref(), self.log.as_ref(), &mail).await?;
        Ok(rmcp::Json(json!({ "user": user.unwrap_or_default() })))
    }
}

pub type LeantimeRouter = ToolRouter<LeantimeSvc>;

impl LeantimeSvc {
    pub fn router() -> LeantimeRouter {
        // Wrapper to expose the macro-generated private tool_router
        Self::tool_router()
    }
}

/// Factory for the rmcp transports: each session gets a handler sharing one client.
pub fn make_factory(
    api: Arc<dyn LeantimeApi>,
    log: Arc<dyn EventSink>,
) -> impl Fn() -> (LeantimeSvc, LeantimeRouter) + Clone + Send + Sync + 'static {
    move || (LeantimeSvc::new(api.clone(), log.clone()), LeantimeSvc::router())
}
