//! Node registry: the static list of 2PC participant endpoints
//!
//! Read once at coordinator start from comma-separated endpoint lists, one
//! per role (`STORAGE_NODES`, `METADATA_NODES`).

use serde::{Deserialize, Serialize};

/// Participant role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    Storage,
    Metadata,
}

impl std::fmt::Display for NodeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeRole::Storage => write!(f, "storage"),
            NodeRole::Metadata => write!(f, "metadata"),
        }
    }
}

/// One participant endpoint
#[derive(Debug, Clone)]
pub struct NodeEndpoint {
    pub role: NodeRole,
    /// Host portion of the endpoint, used as the node id in log lines
    pub node_id: String,
    /// host:port of the participant's gRPC server
    pub addr: String,
}

impl NodeEndpoint {
    pub fn new(role: NodeRole, addr: &str) -> Self {
        let node_id = addr.split(':').next().unwrap_or(addr).to_string();
        Self {
            role,
            node_id,
            addr: addr.to_string(),
        }
    }

    /// Connection URL for tonic
    pub fn url(&self) -> String {
        if self.addr.starts_with("http://") || self.addr.starts_with("https://") {
            self.addr.clone()
        } else {
            format!("http://{}", self.addr)
        }
    }
}

/// Static list of all participants, grouped by role
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    endpoints: Vec<NodeEndpoint>,
}

impl NodeRegistry {
    pub fn new(storage_nodes: &[String], metadata_nodes: &[String]) -> Self {
        let mut endpoints = Vec::new();
        for addr in storage_nodes {
            let addr = addr.trim();
            if !addr.is_empty() {
                endpoints.push(NodeEndpoint::new(NodeRole::Storage, addr));
            }
        }
        for addr in metadata_nodes {
            let addr = addr.trim();
            if !addr.is_empty() {
                endpoints.push(NodeEndpoint::new(NodeRole::Metadata, addr));
            }
        }
        Self { endpoints }
    }

    /// Build from `STORAGE_NODES` / `METADATA_NODES` environment variables.
    pub fn from_env() -> Self {
        let storage = split_list(&std::env::var("STORAGE_NODES").unwrap_or_default());
        let metadata = split_list(&std::env::var("METADATA_NODES").unwrap_or_default());
        Self::new(&storage, &metadata)
    }

    pub fn endpoints(&self) -> &[NodeEndpoint] {
        &self.endpoints
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_groups_roles() {
        let registry = NodeRegistry::new(
            &["storage-a:6001".to_string(), "storage-b:6001".to_string()],
            &["metadata:6002".to_string()],
        );
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.endpoints()[0].role, NodeRole::Storage);
        assert_eq!(registry.endpoints()[2].role, NodeRole::Metadata);
        assert_eq!(registry.endpoints()[0].node_id, "storage-a");
    }

    #[test]
    fn test_split_list_skips_blanks() {
        assert_eq!(split_list("a:1, b:2,,"), vec!["a:1", "b:2"]);
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_endpoint_url() {
        let ep = NodeEndpoint::new(NodeRole::Storage, "storage:6001");
        assert_eq!(ep.url(), "http://storage:6001");
        let ep = NodeEndpoint::new(NodeRole::Storage, "http://storage:6001");
        assert_eq!(ep.url(), "http://storage:6001");
    }
}
