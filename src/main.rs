use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    leantime_mcp_gateway::infra::logging::init();
    leantime_mcp_gateway::cli::run().await
}
