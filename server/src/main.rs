use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tonytech_server::api;
use tonytech_server::config::GatewayConfig;
use tonytech_server::state::AppState;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Tony Tech Insights chat gateway", long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// DeepSeek API key; when absent the gateway serves fallback responses
    #[arg(long, env = "DEEPSEEK_API_KEY")]
    api_key: Option<String>,

    #[arg(long, env = "DEEPSEEK_API_BASE", default_value = "https://api.deepseek.com/v1")]
    api_base: String,

    #[arg(long, env = "DEEPSEEK_MODEL", default_value = "deepseek-chat")]
    model: String,

    /// Execution ceiling imposed by the hosting platform, in milliseconds.
    /// The upstream deadline is always kept below this.
    #[arg(long, env = "PLATFORM_CEILING_MS", default_value_t = 10_000)]
    platform_ceiling_ms: u64,

    #[arg(long, env = "ENVIRONMENT", default_value = "development")]
    environment: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = GatewayConfig::new(
        args.api_key,
        args.api_base,
        args.model,
        args.platform_ceiling_ms,
        args.environment,
    )?;

    if !config.deepseek_configured() {
        tracing::warn!("no DeepSeek API key configured, all chat responses will use the fallback generator");
    }
    tracing::info!(
        "upstream budget {}ms under a {}ms platform ceiling",
        config.upstream_budget().as_millis(),
        config.platform_ceiling.as_millis()
    );

    let state = Arc::new(AppState::new(config));

    let app = api::build_routes(state)
        .layer(CorsLayer::permissive())
        .layer(axum::middleware::from_fn(api::common::request_logger));

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    tracing::info!("Tony Tech Insights gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
