//! Storage node server: HTTP API plus the 2PC participant gRPC server

use std::sync::Arc;

use crate::common::{Result, StorageConfig};
use crate::storage::http::{create_router, StorageState};
use crate::storage::ops::{DeleteOp, UploadOp};
use crate::storage::store::FileStore;
use crate::twopc::{Participant, TwopcService};

pub struct StorageServer {
    config: StorageConfig,
    node_id: String,
}

impl StorageServer {
    pub fn new(config: StorageConfig, node_id: String) -> Self {
        Self { config, node_id }
    }

    pub async fn serve(self) -> Result<()> {
        tracing::info!("Starting storage node: {}", self.node_id);
        tracing::info!("  HTTP API: {}", self.config.bind_addr);
        tracing::info!("  gRPC API: {}", self.config.grpc_addr);
        tracing::info!("  Data path: {}", self.config.data_path.display());

        // Initialize file store
        let store = Arc::new(FileStore::open(&self.config.data_path)?);

        // 2PC participant with the storage adapters injected
        let participant = Arc::new(
            Participant::new(self.node_id.clone())
                .register(Arc::new(UploadOp::new(store.clone())))
                .register(Arc::new(DeleteOp::new(store.clone()))),
        );

        // Create HTTP server
        let http_state = StorageState {
            store,
            node_id: self.node_id.clone(),
        };
        let http_router = create_router(http_state);

        // Create gRPC server (vote + decision phases)
        let twopc = TwopcService::new(participant);
        let grpc_server = tonic::transport::Server::builder()
            .add_service(twopc.vote_server())
            .add_service(twopc.decision_server())
            .serve(self.config.grpc_addr);

        // Start servers
        let http_listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;
        let http_server = axum::serve(http_listener, http_router);

        tracing::info!("✓ Storage node ready");

        tokio::select! {
            res = http_server => {
                if let Err(e) = res {
                    tracing::error!("HTTP server error: {}", e);
                }
            }
            res = grpc_server => {
                if let Err(e) = res {
                    tracing::error!("gRPC server error: {}", e);
                }
            }
        }

        Ok(())
    }
}
