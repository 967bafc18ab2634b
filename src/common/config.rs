//! Configuration for filedepot components

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Global configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Gateway-specific config
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<GatewayConfig>,

    /// Storage-specific config
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageConfig>,

    /// Metadata-specific config
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataConfig>,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Bind address for the HTTP API
    pub bind_addr: SocketAddr,

    /// Storage participant gRPC endpoints (host:port)
    #[serde(default)]
    pub storage_nodes: Vec<String>,

    /// Metadata participant gRPC endpoints (host:port)
    #[serde(default)]
    pub metadata_nodes: Vec<String>,

    /// Metadata node HTTP API, used for user records and file listings
    #[serde(default = "default_metadata_api")]
    pub metadata_api: String,

    /// Storage node HTTP API, used for downloads
    #[serde(default = "default_storage_api")]
    pub storage_api: String,

    /// JWT signing secret
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    /// Per-call RPC deadline for vote and decision rounds
    #[serde(default = "default_rpc_timeout")]
    pub rpc_timeout_secs: u64,

    /// Maximum accepted upload size in bytes
    #[serde(default = "default_max_upload")]
    pub max_upload_bytes: usize,
}

fn default_metadata_api() -> String {
    "http://metadata:5005".to_string()
}
fn default_storage_api() -> String {
    "http://storage:5006".to_string()
}
fn default_jwt_secret() -> String {
    "filedepot-default-secret-change-in-production".to_string()
}
fn default_rpc_timeout() -> u64 {
    5
}
fn default_max_upload() -> usize {
    64 * 1024 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5003".parse().unwrap(),
            storage_nodes: vec!["storage:6001".to_string()],
            metadata_nodes: vec!["metadata:6002".to_string()],
            metadata_api: default_metadata_api(),
            storage_api: default_storage_api(),
            jwt_secret: default_jwt_secret(),
            rpc_timeout_secs: default_rpc_timeout(),
            max_upload_bytes: default_max_upload(),
        }
    }
}

/// Storage node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Bind address for the HTTP API
    pub bind_addr: SocketAddr,

    /// Bind address for the 2PC participant gRPC server
    pub grpc_addr: SocketAddr,

    /// Directory for file data
    pub data_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5006".parse().unwrap(),
            grpc_addr: "0.0.0.0:6001".parse().unwrap(),
            data_path: PathBuf::from("./storage-data"),
        }
    }
}

/// Metadata node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// Bind address for the HTTP API
    pub bind_addr: SocketAddr,

    /// Bind address for the 2PC participant gRPC server
    pub grpc_addr: SocketAddr,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5005".parse().unwrap(),
            grpc_addr: "0.0.0.0:6002".parse().unwrap(),
        }
    }
}

impl Config {
    /// Load configuration from `filedepot.toml` (if present) merged with
    /// `FILEDEPOT__*` environment variables. Missing sources fall back to
    /// defaults; CLI arguments in the binaries take priority over both.
    pub fn load() -> Config {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("filedepot").required(false))
            .add_source(config::Environment::with_prefix("FILEDEPOT").separator("__"));

        match builder.build().and_then(|c| c.try_deserialize()) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config file, using defaults: {}", e);
                Config::default()
            }
        }
    }
}
