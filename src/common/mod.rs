//! Common utilities and types shared across filedepot

pub mod auth;
pub mod config;
pub mod error;
pub mod utils;

pub use auth::{AuthError, Authenticator, Claims};
pub use config::{Config, GatewayConfig, MetadataConfig, StorageConfig};
pub use error::{Error, Result};
pub use utils::{encode_filename, timestamp_now};
