//! 2PC participant state machine
//!
//! Per transaction id, a participant moves Absent → Prepared (successful
//! vote) → Resolved (any decision). Prepared entries live in an in-memory
//! table guarded by a mutex; they do not survive a restart.
//!
//! Operation kinds are dispatched through registered [`OpHandler`]s, so a
//! node supports new transactional operations by registering another
//! handler; the coordinator never changes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::common::{Error, Result};
use crate::twopc::envelope::{OperationDescriptor, OperationPayload};

/// A staged operation: validated during the vote phase, applied at most
/// once from the commit branch of the decision phase.
pub trait StagedOp: Send + Sync {
    /// Apply the side effect to the underlying store.
    fn apply(&self) -> Result<()>;
}

/// Stages operations of one kind against a node's underlying store.
///
/// `stage` must validate everything checkable up front (decode the payload,
/// compute the destination, verify required fields) so that a later commit
/// cannot fail for reasons already visible now. It must not mutate the
/// store.
pub trait OpHandler: Send + Sync {
    /// The operation kind this handler recognizes.
    fn kind(&self) -> &str;

    /// Validate the payload and return the staged operation.
    fn stage(&self, payload: &OperationPayload) -> Result<Box<dyn StagedOp>>;
}

struct PendingTxn {
    kind: String,
    staged: Box<dyn StagedOp>,
}

/// Outcome of a vote request
#[derive(Debug, Clone)]
pub struct VoteOutcome {
    pub vote_commit: bool,
    pub message: String,
}

/// Outcome of a decision request
#[derive(Debug, Clone)]
pub struct DecisionOutcome {
    pub success: bool,
    pub message: String,
}

/// A 2PC participant: holds the pending-transaction table and the operation
/// handlers for one node.
pub struct Participant {
    node_id: String,
    handlers: HashMap<String, Arc<dyn OpHandler>>,
    pending: Mutex<HashMap<String, PendingTxn>>,
}

impl Participant {
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            handlers: HashMap::new(),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Register a handler for an operation kind.
    pub fn register(mut self, handler: Arc<dyn OpHandler>) -> Self {
        self.handlers.insert(handler.kind().to_string(), handler);
        self
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Number of transactions currently in Prepared state.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Vote phase: stage the operation without applying it.
    ///
    /// A duplicate vote for the same transaction id overwrites the existing
    /// Prepared entry, so retried vote calls stay idempotent.
    pub fn vote(&self, transaction_id: &str, operation: &OperationDescriptor) -> VoteOutcome {
        let handler = match self.handlers.get(&operation.kind) {
            Some(h) => h,
            None => {
                tracing::warn!(
                    "node {} rejecting vote for {}: unknown operation {}",
                    self.node_id,
                    transaction_id,
                    operation.kind
                );
                return VoteOutcome {
                    vote_commit: false,
                    message: format!("Unknown operation: {}", operation.kind),
                };
            }
        };

        let staged = match handler.stage(&operation.payload) {
            Ok(staged) => staged,
            Err(e) => {
                tracing::warn!(
                    "node {} rejecting vote for {}: {}",
                    self.node_id,
                    transaction_id,
                    e
                );
                return VoteOutcome {
                    vote_commit: false,
                    message: format!("Error: {}", e),
                };
            }
        };

        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.insert(
            transaction_id.to_string(),
            PendingTxn {
                kind: operation.kind.clone(),
                staged,
            },
        );

        tracing::info!(
            "node {} prepared transaction {} ({})",
            self.node_id,
            transaction_id,
            operation.kind
        );
        VoteOutcome {
            vote_commit: true,
            message: "Ready to commit".to_string(),
        }
    }

    /// Decision phase: apply (commit) or discard (abort) the staged
    /// operation. Either way the Prepared entry is removed, so the side
    /// effect is applied at most once per transaction id; a failed apply is
    /// not retried.
    pub fn decide(&self, transaction_id: &str, global_commit: bool) -> DecisionOutcome {
        let txn = {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            pending.remove(transaction_id)
        };

        let txn = match txn {
            Some(txn) => txn,
            None => {
                // Duplicate decision, an id that never staged, or state lost
                // to a restart.
                tracing::warn!(
                    "node {} has no pending entry for transaction {}",
                    self.node_id,
                    transaction_id
                );
                return DecisionOutcome {
                    success: false,
                    message: "Transaction not found".to_string(),
                };
            }
        };

        if !global_commit {
            tracing::info!(
                "node {} aborted transaction {}",
                self.node_id,
                transaction_id
            );
            return DecisionOutcome {
                success: true,
                message: "Transaction aborted".to_string(),
            };
        }

        // Apply runs outside the table lock; the entry is already gone.
        match txn.staged.apply() {
            Ok(()) => {
                tracing::info!(
                    "node {} committed transaction {} ({})",
                    self.node_id,
                    transaction_id,
                    txn.kind
                );
                DecisionOutcome {
                    success: true,
                    message: "Transaction committed".to_string(),
                }
            }
            Err(e) => {
                tracing::error!(
                    "node {} failed to apply transaction {}: {}",
                    self.node_id,
                    transaction_id,
                    e
                );
                DecisionOutcome {
                    success: false,
                    message: format!("Error: {}", e),
                }
            }
        }
    }
}

/// Convenience for handlers rejecting a payload with a missing field.
pub(crate) fn missing_field(field: &str) -> Error {
    Error::InvalidPayload(format!("missing required field: {}", field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingOp {
        applies: Arc<AtomicUsize>,
        fail: bool,
    }

    impl StagedOp for CountingOp {
        fn apply(&self) -> Result<()> {
            if self.fail {
                return Err(Error::Internal("disk on fire".into()));
            }
            self.applies.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct CountingHandler {
        applies: Arc<AtomicUsize>,
        fail_apply: bool,
    }

    impl OpHandler for CountingHandler {
        fn kind(&self) -> &str {
            "upload"
        }

        fn stage(&self, payload: &OperationPayload) -> Result<Box<dyn StagedOp>> {
            if payload.metadata_json.is_empty() {
                return Err(Error::InvalidPayload("empty metadata".into()));
            }
            Ok(Box::new(CountingOp {
                applies: self.applies.clone(),
                fail: self.fail_apply,
            }))
        }
    }

    fn participant(applies: &Arc<AtomicUsize>) -> Participant {
        Participant::new("test-node").register(Arc::new(CountingHandler {
            applies: applies.clone(),
            fail_apply: false,
        }))
    }

    fn upload_op() -> OperationDescriptor {
        OperationDescriptor::new(
            "upload",
            OperationPayload {
                metadata_json: "{\"filename\":\"a.txt\"}".to_string(),
                file_data: String::new(),
            },
        )
    }

    #[test]
    fn test_vote_then_commit_applies_once() {
        let applies = Arc::new(AtomicUsize::new(0));
        let p = participant(&applies);

        let vote = p.vote("tx-1", &upload_op());
        assert!(vote.vote_commit);
        assert_eq!(p.pending_count(), 1);
        // Vote alone must not mutate the store
        assert_eq!(applies.load(Ordering::SeqCst), 0);

        let decision = p.decide("tx-1", true);
        assert!(decision.success);
        assert_eq!(applies.load(Ordering::SeqCst), 1);
        assert_eq!(p.pending_count(), 0);

        // Second commit for the same id: at-most-one apply
        let dup = p.decide("tx-1", true);
        assert!(!dup.success);
        assert_eq!(dup.message, "Transaction not found");
        assert_eq!(applies.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_abort_discards_without_applying() {
        let applies = Arc::new(AtomicUsize::new(0));
        let p = participant(&applies);

        assert!(p.vote("tx-2", &upload_op()).vote_commit);
        let decision = p.decide("tx-2", false);
        assert!(decision.success);
        assert_eq!(decision.message, "Transaction aborted");
        assert_eq!(applies.load(Ordering::SeqCst), 0);
        assert_eq!(p.pending_count(), 0);
    }

    #[test]
    fn test_abort_unknown_id_not_found() {
        let applies = Arc::new(AtomicUsize::new(0));
        let p = participant(&applies);
        let decision = p.decide("no-such-tx", false);
        assert!(!decision.success);
        assert_eq!(decision.message, "Transaction not found");
    }

    #[test]
    fn test_unknown_kind_rejected_without_entry() {
        let applies = Arc::new(AtomicUsize::new(0));
        let p = participant(&applies);

        let op = OperationDescriptor::new("delete-all", OperationPayload::default());
        let vote = p.vote("tx-3", &op);
        assert!(!vote.vote_commit);
        assert!(vote.message.contains("Unknown operation"));
        assert_eq!(p.pending_count(), 0);
    }

    #[test]
    fn test_staging_error_rejected_without_entry() {
        let applies = Arc::new(AtomicUsize::new(0));
        let p = participant(&applies);

        // Empty metadata makes the handler's stage fail
        let op = OperationDescriptor::new("upload", OperationPayload::default());
        let vote = p.vote("tx-4", &op);
        assert!(!vote.vote_commit);
        assert_eq!(p.pending_count(), 0);
    }

    #[test]
    fn test_duplicate_vote_overwrites() {
        let applies = Arc::new(AtomicUsize::new(0));
        let p = participant(&applies);

        assert!(p.vote("tx-5", &upload_op()).vote_commit);
        assert!(p.vote("tx-5", &upload_op()).vote_commit);
        assert_eq!(p.pending_count(), 1);

        assert!(p.decide("tx-5", true).success);
        assert_eq!(applies.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_apply_failure_still_removes_entry() {
        let applies = Arc::new(AtomicUsize::new(0));
        let p = Participant::new("test-node").register(Arc::new(CountingHandler {
            applies: applies.clone(),
            fail_apply: true,
        }));

        assert!(p.vote("tx-6", &upload_op()).vote_commit);
        let decision = p.decide("tx-6", true);
        assert!(!decision.success);
        assert!(decision.message.contains("disk on fire"));
        // No retry: the entry is gone
        assert_eq!(p.pending_count(), 0);
        assert!(!p.decide("tx-6", true).success);
    }

    #[test]
    fn test_concurrent_votes_and_decisions() {
        let applies = Arc::new(AtomicUsize::new(0));
        let p = Arc::new(participant(&applies));

        let mut threads = Vec::new();
        for i in 0..16 {
            let p = p.clone();
            threads.push(std::thread::spawn(move || {
                let txid = format!("tx-{}", i);
                assert!(p.vote(&txid, &upload_op()).vote_commit);
                assert!(p.decide(&txid, i % 2 == 0).success);
            }));
        }
        for t in threads {
            t.join().unwrap();
        }

        assert_eq!(p.pending_count(), 0);
        assert_eq!(applies.load(Ordering::SeqCst), 8);
    }
}
