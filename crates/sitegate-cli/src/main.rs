//! Sitegate - site-addressed gateway to S3-compatible storage

use clap::Parser;
use sitegate_cli::{run_server_with_shutdown, GatewayConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "sitegate")]
#[command(about = "Site-addressed gateway to S3-compatible object storage")]
#[command(version)]
struct Args {
    /// JSON configuration file
    #[arg(short, long, env = "SITEGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Host to bind to
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Discovery service URL
    #[arg(long)]
    discovery_url: Option<String>,

    /// Use in-memory storage (for testing, data will not persist)
    #[arg(long)]
    memory_store: bool,

    /// Increase logging verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    /// Command line flags take precedence over file and environment
    fn apply(self, config: &mut GatewayConfig) {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(url) = self.discovery_url {
            config.discovery_url = url;
        }
        config.memory_store |= self.memory_store;
        config.verbose = config.verbose.max(self.verbose);
        config.log_json |= self.json_logs;
    }
}

fn init_logging(config: &GatewayConfig) {
    let level = match config.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "sitegate={level},sitegate_cli={level},sitegate_core={level},sitegate_discovery={level},sitegate_storage={level},tower_http={level}"
        )
        .into()
    });

    let json = config.log_json;
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::warn!("Unable to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Parse arguments
    let args = Args::parse();

    let mut config = GatewayConfig::load(args.config.as_deref())?;
    args.apply(&mut config);

    init_logging(&config);

    tracing::info!("Starting sitegate on {}", config.bind_addr());
    tracing::debug!(?config, "Loaded configuration");

    run_server_with_shutdown(config, shutdown_signal()).await
}
