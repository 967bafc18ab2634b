//! 2PC transaction coordinator
//!
//! Drives one transaction through two rounds: a vote round fanned out to
//! every registered participant, then a decision round fanned out to the
//! participants that were reached. The decision is an all-or-nothing AND
//! over the votes; a single unreachable or dissenting participant aborts
//! the whole transaction. No quorum, no transport retries.

use std::time::Duration;

use futures_util::future::join_all;

use crate::proto::{DecisionRequest, VoteRequest};
use crate::twopc::client::ParticipantClient;
use crate::twopc::envelope::{self, OperationDescriptor};
use crate::twopc::registry::{NodeEndpoint, NodeRegistry};

/// Default per-call RPC deadline for both rounds
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(5);

/// Aggregate result of one transaction
#[derive(Debug, Clone)]
pub struct TxnOutcome {
    pub success: bool,
    pub transaction_id: String,
    pub message: String,
    /// Non-fatal problems from the decision round (delivery failures,
    /// failed applies). These can leave orphaned Prepared entries on a
    /// participant and must not be hidden from operators.
    pub warnings: Vec<String>,
}

/// How the vote round went for one endpoint
enum VoteStatus {
    /// Connection could not be established; the participant never received
    /// a Vote and holds no Prepared state.
    Unreachable(String),
    /// Connected but the vote RPC failed or timed out. The participant may
    /// have prepared, so it still receives the decision.
    RpcFailed(String),
    /// Explicit negative vote.
    Rejected(String),
    Commit,
}

struct VoteRecord {
    endpoint: NodeEndpoint,
    /// Present iff the connection was established (the reached set)
    client: Option<ParticipantClient>,
    status: VoteStatus,
}

/// Coordinates 2PC transactions across the registered participants.
/// Holds no cross-transaction state; concurrent `execute` calls each get
/// an independently generated transaction id.
pub struct TxnCoordinator {
    node_id: String,
    registry: NodeRegistry,
    rpc_timeout: Duration,
}

impl TxnCoordinator {
    pub fn new(node_id: impl Into<String>, registry: NodeRegistry) -> Self {
        Self {
            node_id: node_id.into(),
            registry,
            rpc_timeout: DEFAULT_RPC_TIMEOUT,
        }
    }

    pub fn with_rpc_timeout(mut self, timeout: Duration) -> Self {
        self.rpc_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// Run one transaction: vote round, decision computation, decision
    /// round. Returns the aggregate outcome; transport failures never
    /// escape past this boundary.
    pub async fn execute(&self, operation: OperationDescriptor) -> TxnOutcome {
        let transaction_id = envelope::new_transaction_id();
        tracing::info!(
            "coordinator {} starting 2PC transaction {} ({})",
            self.node_id,
            transaction_id,
            operation.kind
        );

        if self.registry.is_empty() {
            return TxnOutcome {
                success: false,
                transaction_id,
                message: "No participants registered".to_string(),
                warnings: Vec::new(),
            };
        }

        // Phase 1: vote round, concurrent fan-out with a join barrier
        let mut records = self.vote_round(&transaction_id, &operation).await;

        // Decision: commit iff every endpoint was reached and voted commit
        let global_commit = records
            .iter()
            .all(|r| matches!(r.status, VoteStatus::Commit));
        tracing::info!(
            "coordinator {} decided {} for transaction {}",
            self.node_id,
            if global_commit {
                "global-commit"
            } else {
                "global-abort"
            },
            transaction_id
        );

        // Phase 2: decision round, delivered only to the reached set. The
        // decision is fixed at this point; delivery failures cannot change
        // it.
        let warnings = self
            .decision_round(&transaction_id, global_commit, &mut records)
            .await;

        let message = if global_commit {
            "All nodes validated and operation applied".to_string()
        } else {
            abort_message(&records)
        };

        if global_commit {
            tracing::info!("transaction {} committed", transaction_id);
        } else {
            tracing::warn!("transaction {} aborted: {}", transaction_id, message);
        }

        TxnOutcome {
            success: global_commit,
            transaction_id,
            message,
            warnings,
        }
    }

    async fn vote_round(
        &self,
        transaction_id: &str,
        operation: &OperationDescriptor,
    ) -> Vec<VoteRecord> {
        // One VoteRequest shared across all participants
        let request = VoteRequest {
            transaction_id: transaction_id.to_string(),
            operation: operation.kind.clone(),
            metadata_json: operation.payload.metadata_json.clone(),
            file_data: operation.payload.file_data.clone(),
            node_id: self.node_id.clone(),
        };

        let futures = self.registry.endpoints().iter().map(|endpoint| {
            let endpoint = endpoint.clone();
            let request = request.clone();
            let timeout = self.rpc_timeout;
            let coordinator_id = self.node_id.clone();
            async move {
                let mut client = match ParticipantClient::connect(&endpoint.url(), timeout).await {
                    Ok(client) => client,
                    Err(e) => {
                        tracing::error!(
                            "coordinator {} failed to reach node {}: {}",
                            coordinator_id,
                            endpoint.node_id,
                            e
                        );
                        return VoteRecord {
                            endpoint,
                            client: None,
                            status: VoteStatus::Unreachable(e.to_string()),
                        };
                    }
                };

                tracing::info!(
                    "coordinator {} sending vote request to node {}",
                    coordinator_id,
                    endpoint.node_id
                );
                let status = match client.vote(request, timeout).await {
                    Ok(resp) if resp.vote_commit => {
                        tracing::info!(
                            "node {} voted commit: {}",
                            endpoint.node_id,
                            resp.message
                        );
                        VoteStatus::Commit
                    }
                    Ok(resp) => {
                        tracing::warn!(
                            "node {} voted abort: {}",
                            endpoint.node_id,
                            resp.message
                        );
                        VoteStatus::Rejected(resp.message)
                    }
                    Err(e) => {
                        tracing::error!(
                            "vote RPC to node {} failed: {}",
                            endpoint.node_id,
                            e
                        );
                        VoteStatus::RpcFailed(e.to_string())
                    }
                };

                VoteRecord {
                    endpoint,
                    client: Some(client),
                    status,
                }
            }
        });

        join_all(futures).await
    }

    async fn decision_round(
        &self,
        transaction_id: &str,
        global_commit: bool,
        records: &mut [VoteRecord],
    ) -> Vec<String> {
        let request = DecisionRequest {
            transaction_id: transaction_id.to_string(),
            global_commit,
            node_id: self.node_id.clone(),
        };

        let futures = records
            .iter_mut()
            .filter_map(|record| {
                let VoteRecord {
                    endpoint, client, ..
                } = record;
                client.as_mut().map(|client| (&*endpoint, client))
            })
            .map(|(endpoint, client)| {
                let request = request.clone();
                let timeout = self.rpc_timeout;
                let coordinator_id = self.node_id.clone();
                async move {
                    tracing::info!(
                        "coordinator {} sending decision to node {}",
                        coordinator_id,
                        endpoint.node_id
                    );
                    match client.decision(request, timeout).await {
                        Ok(resp) if resp.success => {
                            tracing::info!(
                                "node {} resolved transaction: {}",
                                endpoint.node_id,
                                resp.message
                            );
                            None
                        }
                        Ok(resp) => {
                            // "Transaction not found" on abort is expected
                            // for a node that never staged; a failed apply
                            // after a commit decision is not.
                            if global_commit {
                                tracing::warn!(
                                    "node {} failed to apply commit: {}",
                                    endpoint.node_id,
                                    resp.message
                                );
                                Some(format!(
                                    "node {} failed to apply: {}",
                                    endpoint.node_id, resp.message
                                ))
                            } else {
                                tracing::debug!(
                                    "node {} reported on abort: {}",
                                    endpoint.node_id,
                                    resp.message
                                );
                                None
                            }
                        }
                        Err(e) => {
                            // The participant may be left with an orphaned
                            // Prepared entry.
                            tracing::warn!(
                                "decision delivery to node {} failed: {}",
                                endpoint.node_id,
                                e
                            );
                            Some(format!(
                                "decision delivery to node {} failed: {}",
                                endpoint.node_id, e
                            ))
                        }
                    }
                }
            });

        join_all(futures).await.into_iter().flatten().collect()
    }
}

fn abort_message(records: &[VoteRecord]) -> String {
    let unreachable = records.iter().any(|r| {
        matches!(
            r.status,
            VoteStatus::Unreachable(_) | VoteStatus::RpcFailed(_)
        )
    });
    if unreachable {
        return "Some nodes not alive".to_string();
    }
    records
        .iter()
        .find_map(|r| match &r.status {
            VoteStatus::Rejected(msg) => Some(format!(
                "Vote rejected by node {}: {}",
                r.endpoint.node_id, msg
            )),
            _ => None,
        })
        .unwrap_or_else(|| "Transaction aborted".to_string())
}
