use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;

use crate::infra::boot::{client_from_config, run_server};
use crate::infra::config::Config;
use crate::infra::logging::TracingSink;

#[derive(Parser)]
#[command(name = "leantime-mcp-gateway")]
#[command(about = "Leantime MCP Gateway - server and admin CLI")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the MCP server (default)
    Serve,
    /// Health check the service
    Health {
        /// Service URL to check
        #[arg(short, long, default_value = "http://localhost:9000")]
        url: String,
    },
    /// Validate configuration
    Config {
        /// Validate config without starting service
        #[arg(long)]
        validate: bool,
    },
    /// Show service status and configuration
    Status {
        /// Service URL to check
        #[arg(short, long, default_value = "http://localhost:9000")]
        url: String,
    },
    /// Test Leantime connectivity by listing users
    TestLeantime {
        /// Leantime base URL (defaults to LEANTIME_URL)
        #[arg(short, long)]
        url: Option<String>,
        /// API key (defaults to LEANTIME_KEY)
        #[arg(short, long)]
        key: Option<String>,
    },
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    run_commands(cli.command.unwrap_or(Commands::Serve)).await
}

pub async fn run_commands(command: Commands) -> ExitCode {
    match command {
        Commands::Serve => {
            let result = match Config::from_env_and_toml() {
                Ok(cfg) => run_server(cfg).await,
                Err(e) => Err(e.into()),
            };
            match result {
                Ok(_) => ExitCode::SUCCESS,
                Err(e) => {
                    tracing::error!(error = %e, "server exited");
                    eprintln!("❌ Server failed: {:#}", e);
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Health { url } => match health_check(&url).await {
            Ok(_) => {
                println!("✅ Service is healthy");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Health check failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Config { validate: _ } => match validate_config() {
            Ok(_) => {
                println!("✅ Configuration is valid");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Configuration validation failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Status { url } => match show_status(&url).await {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("❌ Status check failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::TestLeantime { url, key } => match test_leantime(url, key).await {
            Ok(_) => {
                println!("✅ Leantime connectivity test passed");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Leantime connectivity test failed: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}

async fn health_check(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/healthz", url))
        .timeout(std::time::Duration::from_millis(500))
        .send()
        .await?;

    if response.status().is_success() {
        Ok(())
    } else {
        Err(format!("HTTP {}", response.status()).into())
    }
}

fn validate_config() -> Result<(), Box<dyn std::error::Error>> {
    Config::from_env_and_toml()?.validate()?;
    Ok(())
}

async fn show_status(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();

    let health_response = client
        .get(format!("{}/healthz", url))
        .timeout(std::time::Duration::from_secs(5))
        .send()
        .await?;

    println!(
        "🏥 Health Status: {}",
        if health_response.status().is_success() {
            "✅ Healthy"
        } else {
            "❌ Unhealthy"
        }
    );

    match mcp_tool_count(&client, url).await {
        Ok(n) => println!("🔧 MCP endpoint: ✅ {} tools", n),
        Err(e) => println!("🔧 MCP endpoint: ❌ {}", e),
    }

    let cfg = Config::from_env();
    if cfg.leantime().is_ok() {
        let leantime = client_from_config(&cfg, Arc::new(TracingSink))?;
        println!(
            "🗂️  Leantime: {}",
            if leantime.health().await {
                "✅ Reachable"
            } else {
                "❌ Unreachable"
            }
        );
    }

    println!("\n📋 Configuration:");
    println!("  Mode: {}", cfg.mode);
    println!("  Listen: {}:{}", cfg.host, cfg.port);
    println!(
        "  Log Level: {}",
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into())
    );
    println!(
        "  Leantime: {}",
        cfg.leantime_url.as_deref().unwrap_or("Not configured")
    );
    println!("  API Key: {}", cfg.masked_key());

    Ok(())
}

const MCP_ACCEPT: &str = "application/json, text/event-stream";

/// Opens an MCP session on `<url>/mcp` and returns how many tools it lists.
///
/// Streamable HTTP only answers `tools/list` inside a session, so this runs the
/// `initialize` handshake first and replays the `MCP-Session-Id` it hands back.
async fn mcp_tool_count(client: &reqwest::Client, url: &str) -> Result<usize, String> {
    let endpoint = format!("{}/mcp", url);
    let timeout = std::time::Duration::from_secs(2);

    let init = client
        .post(&endpoint)
        .header("content-type", "application/json")
        .header("accept", MCP_ACCEPT)
        .json(&serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": "2025-03-26",
                "capabilities": {},
                "clientInfo": {"name": "leantime-mcp-gateway-cli", "version": env!("CARGO_PKG_VERSION")}
            }
        }))
        .timeout(timeout)
        .send()
        .await
        .map_err(|_| "Unavailable".to_string())?;
    if !init.status().is_success() {
        return Err(format!("initialize returned HTTP {}", init.status()));
    }
    let session = init
        .headers()
        .get("mcp-session-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .ok_or_else(|| "initialize returned no MCP-Session-Id".to_string())?;
    init.text().await.map_err(|e| e.to_string())?;

    let initialized = client
        .post(&endpoint)
        .header("content-type", "application/json")
        .header("accept", MCP_ACCEPT)
        .header("mcp-session-id", &session)
        .json(&serde_json::json!({"jsonrpc": "2.0", "method": "notifications/initialized", "params": {}}))
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if !initialized.status().is_success() {
        return Err(format!("notifications/initialized returned HTTP {}", initialized.status()));
    }

    let list = client
        .post(&endpoint)
        .header("content-type", "application/json")
        .header("accept", MCP_ACCEPT)
        .header("mcp-session-id", &session)
        .json(&serde_json::json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list", "params": {}}))
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if !list.status().is_success() {
        return Err(format!("tools/list returned HTTP {}", list.status()));
    }
    let body = list.text().await.map_err(|e| e.to_string())?;
    let frame = body
        .lines()
        .find_map(|l| l.strip_prefix("data:"))
        .unwrap_or(&body)
        .trim();
    let reply: serde_json::Value = serde_json::from_str(frame).map_err(|e| e.to_string())?;
    reply["result"]["tools"]
        .as_array()
        .map(Vec::len)
        .ok_or_else(|| format!("tools/list returned no tools: {}", reply))
}

async fn test_leantime(
    url: Option<String>,
    key: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut cfg = Config::from_env();
    cfg.leantime_url = url.or(cfg.leantime_url);
    cfg.leantime_key = key.or(cfg.leantime_key);
    if cfg.leantime_url.is_none() {
        return Err("No Leantime URL provided".into());
    }

    let client = client_from_config(&cfg, Arc::new(TracingSink))?;
    if !client.health().await {
        println!("⚠️  {} did not answer a plain GET", client.base_url());
    }

    let users = match client.fetch_all_users_checked().await?.into_result() {
        Ok(users) => users,
        Err(e) if e.is_remote() => {
            return Err(format!("Leantime rejected the call (check LEANTIME_KEY): {}", e).into())
        }
        Err(e) => return Err(e.into()),
    };

    println!("👥 Leantime at {} answered", client.base_url());
    println!("🔍 Found {} users", users.len());

    Ok(())
}
