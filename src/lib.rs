//! # filedepot
//!
//! A small distributed file store where an upload spans independent nodes:
//! - An upload **gateway** authenticates users and drives writes
//! - A **storage** node persists file bytes on disk
//! - A **metadata** node keeps the file records and user table
//!
//! A write touches both the storage and the metadata node, so the gateway
//! coordinates it with a two-phase commit over gRPC: every node stages the
//! operation during the vote round, then applies or discards it when the
//! decision round delivers the global outcome.
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │            Upload Gateway            │
//! │  (HTTP: auth, upload, list, delete)  │
//! │  + 2PC transaction coordinator       │
//! └───────────┬──────────────┬───────────┘
//!             │ gRPC         │ gRPC
//!   ┌─────────▼──────┐  ┌────▼────────────┐
//!   │ Storage node   │  │ Metadata node   │
//!   │ (file bytes)   │  │ (records/users) │
//!   │ 2PC participant│  │ 2PC participant │
//!   └────────────────┘  └─────────────────┘
//! ```
//!
//! ## Usage
//!
//! ### Start a metadata node
//! ```bash
//! filedepot-metadata serve --id metadata --bind 0.0.0.0:5005 --grpc 0.0.0.0:6002
//! ```
//!
//! ### Start a storage node
//! ```bash
//! filedepot-storage serve --id storage --bind 0.0.0.0:5006 --grpc 0.0.0.0:6001 \
//!   --data ./storage-data
//! ```
//!
//! ### Start the gateway
//! ```bash
//! STORAGE_NODES=storage:6001 METADATA_NODES=metadata:6002 \
//!   filedepot-gateway serve --id gateway --bind 0.0.0.0:5003
//! ```

pub mod common;
pub mod gateway;
pub mod metadata;
pub mod storage;
pub mod twopc;

// Re-export commonly used types
pub use common::{Config, Error, Result};
pub use twopc::{Participant, TxnCoordinator};

// Generated protobuf code
pub mod proto {
    tonic::include_proto!("filedepot");
}

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
