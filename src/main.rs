use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tenant_portal::{app, config, is_production, AppState};

#[derive(Parser)]
#[command(name = "tenant-portal")]
#[command(about = "Multi-tenant content portal")]
#[command(version)]
struct Args {
    #[arg(long, help = "Address to bind (overrides PORTAL_HOST)")]
    host: Option<String>,

    #[arg(long, short, help = "Port to listen on (overrides PORTAL_PORT)")]
    port: Option<u16>,

    #[arg(long, help = "Directory holding the JSON documents (overrides PORTAL_DATA_DIR)")]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before the config singleton is first touched.
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "tenant_portal=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let args = Args::parse();
    let mut config = config::config().clone();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(data_dir) = args.data_dir {
        config.storage.data_dir = data_dir;
    }

    tracing::info!(
        environment = ?config.environment,
        data_dir = %config.storage.data_dir.display(),
        "starting tenant portal"
    );
    if is_production!() && !config.session.cookie_secure {
        tracing::warn!("session cookies are not marked Secure in production");
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let state = AppState::from_config(config)?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
