//! In-memory Friendly API server for local development.
//!
//! ```bash
//! mock-server --port 3000
//! RUST_LOG=debug mock-server
//! ```

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Friendly mock server
#[derive(Parser, Debug)]
#[command(name = "mock-server")]
#[command(about = "In-memory Friendly API server")]
struct Args {
    /// Port to listen on (127.0.0.1 only)
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Log level used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let addr = format!("127.0.0.1:{}", args.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("listening on {addr}");
    mock_server::run(listener).await
}
