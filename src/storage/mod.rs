//! Storage node: persists file bytes on disk
//!
//! Serves downloads over HTTP and takes part in 2PC writes over gRPC.

pub mod http;
pub mod ops;
pub mod server;
pub mod store;

pub use server::StorageServer;
pub use store::FileStore;
