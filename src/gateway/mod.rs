//! Upload gateway: the public HTTP surface
//!
//! Authenticates users, drives transactional uploads and deletes through
//! the 2PC coordinator, and proxies reads to the metadata and storage
//! nodes.

pub mod http;
pub mod server;

pub use server::GatewayServer;
