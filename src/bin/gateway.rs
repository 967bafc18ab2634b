//! Gateway binary

use clap::{Parser, Subcommand};
use filedepot::common::{Config, GatewayConfig};
use filedepot::gateway::GatewayServer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "filedepot-gateway")]
#[command(about = "filedepot upload gateway with 2PC coordination")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start gateway server
    Serve {
        /// Node ID
        #[arg(long, default_value = "gateway")]
        id: String,

        /// Bind address for HTTP
        #[arg(long, default_value = "0.0.0.0:5003")]
        bind: String,

        /// Storage participant gRPC endpoints (comma-separated)
        #[arg(long, value_delimiter = ',')]
        storage_nodes: Vec<String>,

        /// Metadata participant gRPC endpoints (comma-separated)
        #[arg(long, value_delimiter = ',')]
        metadata_nodes: Vec<String>,

        /// Metadata node HTTP API
        #[arg(long)]
        metadata_api: Option<String>,

        /// Storage node HTTP API
        #[arg(long)]
        storage_api: Option<String>,

        /// Per-call RPC deadline in seconds
        #[arg(long, default_value = "5")]
        rpc_timeout: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            id,
            bind,
            storage_nodes,
            metadata_nodes,
            metadata_api,
            storage_api,
            rpc_timeout,
        } => {
            // Load config from file/env, then override with CLI arguments
            let config = Config::load();
            let mut gateway_config = config.gateway.unwrap_or_default();

            gateway_config.bind_addr = bind.parse()?;
            gateway_config.rpc_timeout_secs = rpc_timeout;
            if !storage_nodes.is_empty() {
                gateway_config.storage_nodes = storage_nodes;
            }
            if !metadata_nodes.is_empty() {
                gateway_config.metadata_nodes = metadata_nodes;
            }
            if let Some(metadata_api) = metadata_api {
                gateway_config.metadata_api = metadata_api;
            }
            if let Some(storage_api) = storage_api {
                gateway_config.storage_api = storage_api;
            }

            let server = GatewayServer::new(gateway_config, id);
            server.serve().await?;
        }
    }

    Ok(())
}
