#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::json;

use hlf_chaincode_rs::gateway::{
    ChaincodeRecord, ChannelHandle, ClientContext, ConnectionProfile, ContractHandle,
    GatewayConnector, InstallRequest, InstantiateRequest, NetworkHandle, OrderResult, PeerTarget,
    ProfileResolver, Proposal, ProposalResponse, Session, TransactionId, TransactionRequest,
};
use hlf_chaincode_rs::logging::{CaptureSink, Level, Logger};
use hlf_chaincode_rs::ChaincodeLifecycleManager;

pub const ORG: &str = "org1";
pub const ADMIN: &str = "admin";

pub fn peer(n: usize) -> PeerTarget {
    PeerTarget::new(format!("peer{n}.org1"), format!("grpcs://peer{n}.org1:7051"))
}

pub fn peers(count: usize) -> Vec<PeerTarget> {
    (0..count).map(peer).collect()
}

/// Scripted network state plus a record of every call the manager made.
#[derive(Default)]
pub struct FakeState {
    pub peers: Vec<PeerTarget>,
    pub installed: Vec<ChaincodeRecord>,
    pub instantiated: Vec<ChaincodeRecord>,
    pub install_replies: Option<Vec<ProposalResponse>>,
    pub install_error: Option<String>,
    pub installed_query_error: Option<String>,
    pub instantiated_query_error: Option<String>,
    pub proposal_replies: Option<Vec<ProposalResponse>>,
    pub order_result: Option<OrderResult>,
    pub contract_payload: Vec<u8>,
    pub contract_error: Option<String>,
    pub missing_profile: bool,

    pub connects: Vec<(String, String)>,
    pub disconnects: usize,
    pub install_requests: Vec<InstallRequest>,
    pub instantiate_requests: Vec<InstantiateRequest>,
    pub transaction_requests: Vec<TransactionRequest>,
    pub submitted: Vec<(String, Vec<String>)>,
    pub evaluated: Vec<(String, Vec<String>)>,
    pub gopath_during_install: Option<Option<String>>,
    pub minted: u64,
}

#[derive(Clone, Default)]
pub struct FakeNetwork {
    state: Arc<Mutex<FakeState>>,
}

impl FakeNetwork {
    pub fn with_peers(count: usize) -> Self {
        let network = Self::default();
        network.state().peers = peers(count);
        network
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn manager(&self) -> (ChaincodeLifecycleManager, Arc<CaptureSink>) {
        let sink = Arc::new(CaptureSink::new());
        let manager = ChaincodeLifecycleManager::new(Arc::new(self.clone()), Arc::new(self.clone()))
            .with_logger(Logger::new(sink.clone(), Level::Debug));
        (manager, sink)
    }
}

#[async_trait]
impl ProfileResolver for FakeNetwork {
    async fn connection_profile(&self, organization: &str) -> Result<ConnectionProfile> {
        if self.state().missing_profile {
            return Err(anyhow!("no connection profile for {organization}"));
        }
        Ok(ConnectionProfile {
            organization: organization.to_string(),
            document: json!({ "name": format!("{organization}-network") }),
        })
    }
}

#[async_trait]
impl GatewayConnector for FakeNetwork {
    async fn connect(
        &self,
        identity: &str,
        organization: &str,
        _profile: &ConnectionProfile,
    ) -> Result<Box<dyn Session>> {
        self.state()
            .connects
            .push((identity.to_string(), organization.to_string()));
        Ok(Box::new(FakeSession {
            network: self.clone(),
            identity: identity.to_string(),
        }))
    }
}

struct FakeSession {
    network: FakeNetwork,
    identity: String,
}

#[async_trait]
impl Session for FakeSession {
    fn client(&self) -> Arc<dyn ClientContext> {
        Arc::new(FakeClient {
            network: self.network.clone(),
            identity: self.identity.clone(),
        })
    }

    fn peers_for_org(&self, _organization: &str) -> Vec<PeerTarget> {
        self.network.state().peers.clone()
    }

    async fn network(&self, _channel: &str) -> Result<Arc<dyn NetworkHandle>> {
        Ok(Arc::new(self.network.clone()))
    }

    fn disconnect(&self) {
        self.network.state().disconnects += 1;
    }
}

struct FakeClient {
    network: FakeNetwork,
    identity: String,
}

#[async_trait]
impl ClientContext for FakeClient {
    async fn query_installed_chaincodes(&self, _peer: &PeerTarget) -> Result<Vec<ChaincodeRecord>> {
        let state = self.network.state();
        if let Some(err) = &state.installed_query_error {
            return Err(anyhow!(err.clone()));
        }
        Ok(state.installed.clone())
    }

    async fn install_chaincode(&self, request: InstallRequest) -> Result<Vec<ProposalResponse>> {
        let mut state = self.network.state();
        state.gopath_during_install = Some(std::env::var("GOPATH").ok());
        let targets = request.targets.clone();
        state.install_requests.push(request);
        if let Some(err) = &state.install_error {
            return Err(anyhow!(err.clone()));
        }
        Ok(state.install_replies.clone().unwrap_or_else(|| {
            targets
                .into_iter()
                .map(|peer| ProposalResponse::endorsed(peer, Vec::new()))
                .collect()
        }))
    }

    fn new_transaction_id(&self, admin: bool) -> TransactionId {
        let mut state = self.network.state();
        state.minted += 1;
        TransactionId::derive(&state.minted.to_be_bytes(), self.identity.as_bytes(), admin)
    }
}

impl NetworkHandle for FakeNetwork {
    fn channel(&self) -> Arc<dyn ChannelHandle> {
        Arc::new(self.clone())
    }

    fn contract(&self, _chaincode: &str) -> Arc<dyn ContractHandle> {
        Arc::new(self.clone())
    }
}

#[async_trait]
impl ChannelHandle for FakeNetwork {
    async fn send_instantiate_proposal(
        &self,
        request: InstantiateRequest,
    ) -> Result<(Vec<ProposalResponse>, Proposal)> {
        let mut state = self.state();
        let proposal = Proposal {
            tx_id: request.tx_id.to_string(),
            bytes: b"signed-proposal".to_vec(),
        };
        let replies = state.proposal_replies.clone().unwrap_or_else(|| {
            request
                .targets
                .iter()
                .cloned()
                .map(|peer| ProposalResponse::endorsed(peer, Vec::new()))
                .collect()
        });
        state.instantiate_requests.push(request);
        Ok((replies, proposal))
    }

    async fn send_transaction(&self, request: TransactionRequest) -> Result<OrderResult> {
        let mut state = self.state();
        state.transaction_requests.push(request);
        Ok(state.order_result.clone().unwrap_or_else(OrderResult::success))
    }

    async fn query_instantiated_chaincodes(
        &self,
        _peer: &PeerTarget,
    ) -> Result<Vec<ChaincodeRecord>> {
        let state = self.state();
        if let Some(err) = &state.instantiated_query_error {
            return Err(anyhow!(err.clone()));
        }
        Ok(state.instantiated.clone())
    }
}

#[async_trait]
impl ContractHandle for FakeNetwork {
    async fn submit_transaction(&self, function: &str, args: &[String]) -> Result<Vec<u8>> {
        let mut state = self.state();
        state.submitted.push((function.to_string(), args.to_vec()));
        if let Some(err) = &state.contract_error {
            return Err(anyhow!(err.clone()));
        }
        Ok(state.contract_payload.clone())
    }

    async fn evaluate_transaction(&self, function: &str, args: &[String]) -> Result<Vec<u8>> {
        let mut state = self.state();
        state.evaluated.push((function.to_string(), args.to_vec()));
        if let Some(err) = &state.contract_error {
            return Err(anyhow!(err.clone()));
        }
        Ok(state.contract_payload.clone())
    }
}
