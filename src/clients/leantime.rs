use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Map, Value as J};

use crate::core::error::LeantimeError;
use crate::core::jsonrpc::{RpcReq, RpcResp};
use crate::core::rows::filter_rows;
use crate::domain::{Fetched, LeantimeApi, Row, Ticket, User};
use crate::infra::http::headers::{add_leantime_headers, add_standard_headers};
use crate::infra::logging::EventSink;
use crate::infra::runtime::limits::{make_http_client, make_http_client_with};

pub const METHOD_OPEN_USER_TICKETS: &str = "leantime.rpc.Tickets.getAllOpenUserTickets";
pub const METHOD_ALL_USERS: &str = "leantime.rpc.Users.getAll";

const LOGGED_BODY_CHARS: usize = 500;

/// JSON-RPC client for a single Leantime installation.
#[derive(Clone)]
pub struct LeantimeClient {
    base: String,
    api_key: String,
    http: Client,
    log: Arc<dyn EventSink>,
}

impl std::fmt::Debug for LeantimeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeantimeClient")
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

impl LeantimeClient {
    pub fn new(
        base: impl Into<String>,
        api_key: impl Into<String>,
        log: Arc<dyn EventSink>,
    ) -> Result<Self, LeantimeError> {
        let http = make_http_client()?;
        Ok(Self::with_http_client(base, api_key, http, log))
    }

    pub fn with_timeout(
        base: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
        log: Arc<dyn EventSink>,
    ) -> Result<Self, LeantimeError> {
        let http = make_http_client_with(timeout)?;
        Ok(Self::with_http_client(base, api_key, http, log))
    }

    pub fn with_http_client(
        base: impl Into<String>,
        api_key: impl Into<String>,
        http: Client,
        log: Arc<dyn EventSink>,
    ) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        log.info(&format!("Initialized Leantime client for {base}"));
        Self { base, api_key: api_key.into(), http, log }
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/jsonrpc", self.base)
    }

    /// GET the installation root; true on any 2xx.
    pub async fn health(&self) -> bool {
        let (builder, _rid) = add_standard_headers(self.http.get(&self.base), None);
        match builder.send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// Open tickets for `user_id`, or for the key's own user when `None` (or 0).
    pub async fn fetch_open_tickets_checked(
        &self,
        user_id: Option<i64>,
    ) -> Result<Fetched<Ticket>, LeantimeError> {
        let mut params = Map::new();
        if let Some(id) = user_id.filter(|id| *id != 0) {
            params.insert("userId".into(), json!(id));
        }
        self.call(RpcReq::new(METHOD_OPEN_USER_TICKETS, params)).await
    }

    pub async fn fetch_all_users_checked(&self) -> Result<Fetched<User>, LeantimeError> {
        self.log.debug("Getting user details");
        let mut params = Map::new();
        params.insert("activeOnly".into(), J::Bool(false));
        self.call(RpcReq::new(METHOD_ALL_USERS, params)).await
    }

    async fn call(&self, req: RpcReq) -> Result<Fetched<Row>, LeantimeError> {
        let endpoint = self.endpoint();
        let payload = serde_json::to_string(&req)?;
        self.log
            .debug(&format!("Sending request to {endpoint} with payload: {payload}"));

        let (builder, rid) = add_leantime_headers(self.http.post(&endpoint), &self.api_key);
        tracing::debug!(request_id = %rid, method = req.method, "leantime.call");

        let body = match self.send(builder.body(payload)).await {
            Ok(body) => body,
            Err(e) => {
                self.log.error(&format!("Request failed: {e}"));
                return Err(e);
            }
        };
        let truncated: String = body.chars().take(LOGGED_BODY_CHARS).collect();
        self.log.debug(&format!("Received response: {truncated}..."));

        let resp: RpcResp = match serde_json::from_str(&body) {
            Ok(resp) => resp,
            Err(e) => {
                self.log.error(&format!("Failed to parse JSON response: {e}"));
                return Err(e.into());
            }
        };

        Ok(match resp.into_result() {
            Ok(result) => Fetched::Rows(filter_rows(result)),
            Err(err) => Fetched::RemoteError(err),
        })
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<String, LeantimeError> {
        let resp = builder.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(LeantimeError::Transport(format!("upstream status {status}")));
        }
        Ok(resp.text().await?)
    }

    fn rows_or_empty<T>(&self, fetched: Fetched<T>, what: &str) -> Vec<T> {
        match fetched {
            Fetched::Rows(rows) => rows,
            Fetched::RemoteError(err) => {
                self.log.error(&format!("API error when {what}: {err}"));
                Vec::new()
            }
        }
    }
}

#[async_trait::async_trait]
impl LeantimeApi for LeantimeClient {
    async fn fetch_open_tickets_for_user(
        &self,
        user_id: Option<i64>,
    ) -> Result<Vec<Ticket>, LeantimeError> {
        let fetched = self.fetch_open_tickets_checked(user_id).await?;
        Ok(self.rows_or_empty(fetched, "getting open tickets"))
    }

    async fn fetch_all_users(&self) -> Result<Vec<User>, LeantimeError> {
        let fetched = self.fetch_all_users_checked().await?;
        Ok(self.rows_or_empty(fetched, "getting users"))
    }
}
