//! fileshare-server — HTTP server for the end-to-end encrypted file
//! sharing service.

use clap::Parser;
use fileshare_server::{run_server, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "fileshare-server")]
#[command(about = "HTTP server for the end-to-end encrypted file sharing service")]
#[command(version)]
struct Args {
    /// Host to bind to.
    #[arg(short = 'H', long, default_value = "0.0.0.0", env = "FILESHARE_HOST")]
    host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = 8080, env = "FILESHARE_PORT")]
    port: u16,

    /// `sqlx` connection string for the relational store.
    #[arg(long, default_value = "sqlite://fileshare.db", env = "FILESHARE_DATABASE_URL")]
    database_url: String,

    /// Directory under which ciphertext blobs are written.
    #[arg(long, default_value = "./data/blobs", env = "FILESHARE_STORAGE_DIR")]
    storage_dir: String,

    /// Maximum accepted request body size, in bytes.
    #[arg(long, default_value_t = 256 * 1024 * 1024, env = "FILESHARE_MAX_BODY_SIZE")]
    max_body_size: usize,

    /// Disable permissive CORS.
    #[arg(long, env = "FILESHARE_NO_CORS")]
    no_cors: bool,

    /// Enable debug logging.
    #[arg(short, long, env = "FILESHARE_DEBUG")]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("fileshare_server={log_level},tower_http=debug").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(host = %args.host, port = args.port, "starting fileshare-server");
    tracing::info!(database_url = %args.database_url, storage_dir = %args.storage_dir, "persistence configured");

    let config = ServerConfig {
        host: args.host,
        port: args.port,
        database_url: args.database_url,
        storage_dir: args.storage_dir,
        max_body_size: args.max_body_size,
        cors_enabled: !args.no_cors,
    };

    run_server(config).await
}
