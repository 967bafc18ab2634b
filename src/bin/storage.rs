//! Storage node binary

use clap::{Parser, Subcommand};
use filedepot::common::Config;
use filedepot::storage::StorageServer;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "filedepot-storage")]
#[command(about = "filedepot storage node - persists file bytes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start storage node
    Serve {
        /// Node ID
        #[arg(long, default_value = "storage")]
        id: String,

        /// Bind address for HTTP
        #[arg(long, default_value = "0.0.0.0:5006")]
        bind: String,

        /// Bind address for the 2PC participant gRPC server
        #[arg(long, default_value = "0.0.0.0:6001")]
        grpc: String,

        /// Data directory
        #[arg(long, default_value = "./storage-data")]
        data: PathBuf,
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
            grpc,
            data,
        } => {
            let config = Config::load();
            let mut storage_config = config.storage.unwrap_or_default();

            storage_config.bind_addr = bind.parse()?;
            storage_config.grpc_addr = grpc.parse()?;
            storage_config.data_path = data;

            let server = StorageServer::new(storage_config, id);
            server.serve().await?;
        }
    }

    Ok(())
}
