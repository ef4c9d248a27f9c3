use std::sync::Arc;

use anyhow::Context;

use crate::clients::leantime::LeantimeClient;
use crate::infra::config::Config;
use crate::infra::logging::{EventSink, TracingSink};
use crate::tools::leantime::tool_router::make_factory;

/// Build the shared client from validated config.
pub fn client_from_config(
    cfg: &Config,
    log: Arc<dyn EventSink>,
) -> anyhow::Result<LeantimeClient> {
    let (url, key) = cfg.leantime()?;
    LeantimeClient::with_timeout(url, key, cfg.timeout, log)
        .context("building Leantime HTTP client")
}

pub async fn run_server(cfg: Config) -> anyhow::Result<()> {
    cfg.validate()?;
    tracing::info!(
        mode = %cfg.mode,
        host = %cfg.host,
        port = cfg.port,
        leantime_url = cfg.leantime_url.as_deref().unwrap_or_default(),
        "BOOT leantime-mcp-gateway"
    );

    let log: Arc<dyn EventSink> = Arc::new(TracingSink);
    let client = Arc::new(client_from_config(&cfg, log.clone())?);
    let factory = make_factory(client, log);

    // Stdio mode: MCP over stdin/stdout only, no HTTP listener.
    if cfg.mode == "stdio" {
        crate::infra::runtime::mcp_transport::serve_stdio(factory)
            .await
            .map_err(|e| anyhow::anyhow!(e))?;
        return Ok(());
    }

    let app = crate::infra::http_app::build_app(factory);
    let addr = format!("{}:{}", cfg.host, cfg.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(addr = %listener.local_addr()?, "listening; MCP at /mcp");
    axum::serve(listener, app).await?;
    Ok(())
}
