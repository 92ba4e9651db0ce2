use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use moveat_api::config::AppConfig;
use moveat_api::database::{DatabaseManager, MySqlStore};
use moveat_api::{app, AppState};

#[derive(Parser, Debug)]
#[command(name = "moveat-api", version, about = "MovEat nutrition API server")]
struct Args {
    /// Bind address (overrides API_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Listen port (overrides API_PORT / PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so DATABASE_URL, JWT_SECRET_KEY, etc. are picked up
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("moveat_api=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();

    let mut config: AppConfig = moveat_api::config::config().clone();
    if let Some(host) = args.host {
        config.api.host = host;
    }
    if let Some(port) = args.port {
        config.api.port = port;
    }

    if config.security.jwt_secret.is_empty() {
        bail!("JWT_SECRET_KEY must be set in {:?} mode", config.environment);
    }

    tracing::info!("Starting MovEat API in {:?} mode", config.environment);
    tracing::info!("Database: {}", DatabaseManager::redacted_url(&config.database.url));

    let pool = DatabaseManager::connect_lazy(&config.database).context("failed to configure database pool")?;
    let store = Arc::new(MySqlStore::new(pool));

    let bind_addr = format!("{}:{}", config.api.host, config.api.port);
    let state = AppState::new(store, config);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("MovEat API listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await.context("server error")?;
    Ok(())
}
