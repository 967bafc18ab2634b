//! Metadata node: in-memory file records and user table
//!
//! Serves the CRUD HTTP API and takes part in 2PC writes over gRPC.

pub mod http;
pub mod ops;
pub mod server;
pub mod store;

pub use server::MetadataServer;
pub use store::{FileRecord, MetadataStore, UserRecord};
