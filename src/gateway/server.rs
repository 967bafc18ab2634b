//! Gateway server

use std::sync::Arc;
use std::time::Duration;

use crate::common::{Authenticator, GatewayConfig, Result};
use crate::gateway::http::{create_router, GatewayState};
use crate::twopc::{NodeRegistry, TxnCoordinator};

pub struct GatewayServer {
    config: GatewayConfig,
    node_id: String,
}

impl GatewayServer {
    pub fn new(config: GatewayConfig, node_id: String) -> Self {
        Self { config, node_id }
    }

    pub async fn serve(self) -> Result<()> {
        tracing::info!("Starting gateway: {}", self.node_id);
        tracing::info!("  HTTP API: {}", self.config.bind_addr);
        tracing::info!("  Metadata API: {}", self.config.metadata_api);
        tracing::info!("  Storage API: {}", self.config.storage_api);

        // Participant registry: environment lists take priority, read once
        // at startup
        let registry = {
            let from_env = NodeRegistry::from_env();
            if from_env.is_empty() {
                NodeRegistry::new(&self.config.storage_nodes, &self.config.metadata_nodes)
            } else {
                from_env
            }
        };
        for endpoint in registry.endpoints() {
            tracing::info!("  Participant ({}): {}", endpoint.role, endpoint.addr);
        }

        let coordinator = Arc::new(
            TxnCoordinator::new(self.node_id.clone(), registry)
                .with_rpc_timeout(Duration::from_secs(self.config.rpc_timeout_secs)),
        );

        let auth = Arc::new(Authenticator::new(self.config.jwt_secret.as_bytes()));

        let state = GatewayState {
            coordinator,
            auth,
            http: reqwest::Client::new(),
            metadata_api: self.config.metadata_api.clone(),
            storage_api: self.config.storage_api.clone(),
            node_id: self.node_id.clone(),
        };
        let router = create_router(state, self.config.max_upload_bytes);

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!("✓ Gateway ready");
        axum::serve(listener, router).await?;

        Ok(())
    }
}
