//! MCP transports (stdio + streamable HTTP) for any tool handler.

use std::sync::Arc;

use rmcp::handler::server::router::Router;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::serve_server;
use rmcp::transport::streamable_http_server::tower::{
    StreamableHttpServerConfig, StreamableHttpService,
};

pub use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
pub use rmcp::ServerHandler;

pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// Speak MCP over stdin/stdout until the peer closes the stream.
pub async fn serve_stdio<H>(factory: impl FnOnce() -> (H, ToolRouter<H>)) -> Result<(), TransportError>
where
    H: ServerHandler,
{
    let (handler, tools) = factory();
    let service = Router::new(handler).with_tools(tools);
    let running = serve_server(service, (tokio::io::stdin(), tokio::io::stdout())).await?;
    tracing::info!("stdio MCP session started");
    let reason = running.waiting().await?;
    tracing::info!(?reason, "stdio MCP session ended");
    Ok(())
}

/// Streamable HTTP service: POST carries JSON-RPC frames, responses and
/// notifications stream back as SSE. One handler is built per session.
pub fn make_streamable_http_service<H>(
    factory: impl Fn() -> (H, ToolRouter<H>) + Send + Sync + Clone + 'static,
    session_mgr: Arc<LocalSessionManager>,
) -> StreamableHttpService<Router<H>, LocalSessionManager>
where
    H: ServerHandler,
{
    let cfg = StreamableHttpServerConfig::default();
    tracing::debug!(stateful_mode = %cfg.stateful_mode, keep_alive = ?cfg.sse_keep_alive, "streamable HTTP config");
    let service_factory = move || {
        let (handler, tools) = factory();
        tracing::debug!("new MCP session handler");
        Ok(Router::new(handler).with_tools(tools))
    };
    StreamableHttpService::new(service_factory, session_mgr, cfg)
}
