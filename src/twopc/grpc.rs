//! gRPC surface of a 2PC participant
//!
//! One Clone-able service wraps the participant and implements both
//! generated server traits, so a node mounts the vote and decision phases
//! on the same tonic server.

use std::sync::Arc;

use tonic::{Request, Response, Status};

use crate::proto::decision_phase_service_server::{DecisionPhaseService, DecisionPhaseServiceServer};
use crate::proto::vote_phase_service_server::{VotePhaseService, VotePhaseServiceServer};
use crate::proto::{DecisionRequest, DecisionResponse, VoteRequest, VoteResponse};
use crate::twopc::envelope::{OperationDescriptor, OperationPayload};
use crate::twopc::participant::Participant;

#[derive(Clone)]
pub struct TwopcService {
    participant: Arc<Participant>,
}

impl TwopcService {
    pub fn new(participant: Arc<Participant>) -> Self {
        Self { participant }
    }

    pub fn vote_server(&self) -> VotePhaseServiceServer<TwopcService> {
        VotePhaseServiceServer::new(self.clone())
    }

    pub fn decision_server(&self) -> DecisionPhaseServiceServer<TwopcService> {
        DecisionPhaseServiceServer::new(self.clone())
    }
}

#[tonic::async_trait]
impl VotePhaseService for TwopcService {
    async fn vote(&self, req: Request<VoteRequest>) -> Result<Response<VoteResponse>, Status> {
        let req = req.into_inner();
        tracing::info!(
            "node {} handling vote request for {} from coordinator {}",
            self.participant.node_id(),
            req.transaction_id,
            req.node_id
        );

        let operation = OperationDescriptor::new(
            req.operation,
            OperationPayload {
                metadata_json: req.metadata_json,
                file_data: req.file_data,
            },
        );
        let outcome = self.participant.vote(&req.transaction_id, &operation);

        Ok(Response::new(VoteResponse {
            vote_commit: outcome.vote_commit,
            message: outcome.message,
            node_id: self.participant.node_id().to_string(),
        }))
    }
}

#[tonic::async_trait]
impl DecisionPhaseService for TwopcService {
    async fn decision(
        &self,
        req: Request<DecisionRequest>,
    ) -> Result<Response<DecisionResponse>, Status> {
        let req = req.into_inner();
        tracing::info!(
            "node {} handling {} decision for {} from coordinator {}",
            self.participant.node_id(),
            if req.global_commit {
                "global-commit"
            } else {
                "global-abort"
            },
            req.transaction_id,
            req.node_id
        );

        let outcome = self.participant.decide(&req.transaction_id, req.global_commit);

        Ok(Response::new(DecisionResponse {
            success: outcome.success,
            message: outcome.message,
            node_id: self.participant.node_id().to_string(),
        }))
    }
}
