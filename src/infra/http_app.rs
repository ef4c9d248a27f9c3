use std::sync::Arc;

use axum::{
    routing::{any_service, get},
    Router,
};
use rmcp::handler::server::tool::ToolRouter;

use crate::infra::runtime::mcp_transport::{
    make_streamable_http_service, LocalSessionManager, ServerHandler,
};

/// `/healthz` plus the streamable MCP endpoint at `/mcp`.
pub fn build_app<H>(factory: impl Fn() -> (H, ToolRouter<H>) + Send + Sync + Clone + 'static) -> Router
where
    H: ServerHandler,
{
    let session_mgr = Arc::new(LocalSessionManager::default());
    let mcp_service = make_streamable_http_service(factory, session_mgr);

    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route_service("/mcp", any_service(mcp_service))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::leantime::LeantimeClient;
    use crate::infra::logging::RecordingSink;
    use crate::tools::leantime::tool_router::make_factory;
    use axum::body::{to_bytes, Body};
    use hyper::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn healthz_returns_ok() {
        let sink = Arc::new(RecordingSink::new());
        let client = LeantimeClient::new("http://leantime.test", "lt_key", sink.clone()).unwrap();
        let app = build_app(make_factory(Arc::new(client), sink));

        let req = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), 16).await.unwrap();
        assert_eq!(&bytes[..], b"ok");
    }
}
