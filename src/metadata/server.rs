//! Metadata node server: HTTP API plus the 2PC participant gRPC server

use std::sync::Arc;

use crate::common::{MetadataConfig, Result};
use crate::metadata::http::{create_router, MetadataState};
use crate::metadata::ops::{DeleteOp, UploadOp};
use crate::metadata::store::MetadataStore;
use crate::twopc::{Participant, TwopcService};

pub struct MetadataServer {
    config: MetadataConfig,
    node_id: String,
}

impl MetadataServer {
    pub fn new(config: MetadataConfig, node_id: String) -> Self {
        Self { config, node_id }
    }

    pub async fn serve(self) -> Result<()> {
        tracing::info!("Starting metadata node: {}", self.node_id);
        tracing::info!("  HTTP API: {}", self.config.bind_addr);
        tracing::info!("  gRPC API: {}", self.config.grpc_addr);

        // One store, shared by the HTTP layer and the 2PC adapters
        let store = Arc::new(MetadataStore::new());

        // 2PC participant with the metadata adapters injected
        let participant = Arc::new(
            Participant::new(self.node_id.clone())
                .register(Arc::new(UploadOp::new(store.clone())))
                .register(Arc::new(DeleteOp::new(store.clone()))),
        );

        // Create HTTP server
        let http_state = MetadataState {
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

        tracing::info!("✓ Metadata node ready");

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
