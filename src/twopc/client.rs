//! gRPC client for one 2PC participant

use std::time::Duration;

use tonic::transport::{Channel, Endpoint};

use crate::common::{Error, Result};
use crate::proto::decision_phase_service_client::DecisionPhaseServiceClient;
use crate::proto::vote_phase_service_client::VotePhaseServiceClient;
use crate::proto::{DecisionRequest, DecisionResponse, VoteRequest, VoteResponse};

/// Thin wrapper over the two generated clients, sharing one channel.
/// Every call carries an independent bounded deadline.
pub struct ParticipantClient {
    vote: VotePhaseServiceClient<Channel>,
    decision: DecisionPhaseServiceClient<Channel>,
}

impl ParticipantClient {
    /// Establish a connection with a bounded connect timeout.
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Endpoint::from_shared(url.to_string())
            .map_err(|e| Error::ConnectionFailed(format!("{}: {}", url, e)))?
            .connect_timeout(timeout);

        let channel = match tokio::time::timeout(timeout, endpoint.connect()).await {
            Ok(Ok(channel)) => channel,
            Ok(Err(e)) => return Err(Error::ConnectionFailed(format!("{}: {}", url, e))),
            Err(_) => return Err(Error::Timeout(format!("connect to {}", url))),
        };

        Ok(Self {
            vote: VotePhaseServiceClient::new(channel.clone()),
            decision: DecisionPhaseServiceClient::new(channel),
        })
    }

    pub async fn vote(&mut self, request: VoteRequest, timeout: Duration) -> Result<VoteResponse> {
        match tokio::time::timeout(timeout, self.vote.vote(tonic::Request::new(request))).await {
            Ok(Ok(resp)) => Ok(resp.into_inner()),
            Ok(Err(status)) => Err(Error::Grpc(status)),
            Err(_) => Err(Error::Timeout("vote request".to_string())),
        }
    }

    pub async fn decision(
        &mut self,
        request: DecisionRequest,
        timeout: Duration,
    ) -> Result<DecisionResponse> {
        match tokio::time::timeout(
            timeout,
            self.decision.decision(tonic::Request::new(request)),
        )
        .await
        {
            Ok(Ok(resp)) => Ok(resp.into_inner()),
            Ok(Err(status)) => Err(Error::Grpc(status)),
            Err(_) => Err(Error::Timeout("decision request".to_string())),
        }
    }
}
