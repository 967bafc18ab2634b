//! Metadata node binary

use clap::{Parser, Subcommand};
use filedepot::common::Config;
use filedepot::metadata::MetadataServer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "filedepot-metadata")]
#[command(about = "filedepot metadata node - file records and users")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start metadata node
    Serve {
        /// Node ID
        #[arg(long, default_value = "metadata")]
        id: String,

        /// Bind address for HTTP
        #[arg(long, default_value = "0.0.0.0:5005")]
        bind: String,

        /// Bind address for the 2PC participant gRPC server
        #[arg(long, default_value = "0.0.0.0:6002")]
        grpc: String,
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
        Commands::Serve { id, bind, grpc } => {
            let config = Config::load();
            let mut metadata_config = config.metadata.unwrap_or_default();

            metadata_config.bind_addr = bind.parse()?;
            metadata_config.grpc_addr = grpc.parse()?;

            let server = MetadataServer::new(metadata_config, id);
            server.serve().await?;
        }
    }

    Ok(())
}
