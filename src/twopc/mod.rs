//! Two-phase commit machinery
//!
//! The coordinator drives the vote round against every registered
//! participant, computes the all-or-nothing decision, and delivers it to the
//! participants it reached. Each participant stages operations during the
//! vote phase and applies or discards them on decision, keyed by
//! transaction id.

pub mod client;
pub mod coordinator;
pub mod envelope;
pub mod grpc;
pub mod participant;
pub mod registry;

pub use client::ParticipantClient;
pub use coordinator::{TxnCoordinator, TxnOutcome};
pub use envelope::{OperationDescriptor, OperationPayload, OP_DELETE, OP_UPLOAD};
pub use grpc::TwopcService;
pub use participant::{OpHandler, Participant, StagedOp};
pub use registry::{NodeEndpoint, NodeRegistry, NodeRole};
