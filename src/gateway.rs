//! Contracts of the network session handle ("gateway") this crate drives.
//!
//! Implementations live outside the crate: they own connection material,
//! identities and the wire protocol. The lifecycle manager only sequences
//! calls against these traits.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::descriptor::ChaincodeLanguage;

/// Endorsement status a peer returns for an accepted proposal.
pub const STATUS_OK: i32 = 200;

/// Opaque handle of a peer that proposals can be targeted at.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PeerTarget {
    pub name: String,
    pub endpoint: String,
}

impl PeerTarget {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
        }
    }
}

impl fmt::Display for PeerTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.endpoint)
    }
}

/// Single-use transaction identifier bound to one proposal/order cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionId {
    id: String,
    nonce: Vec<u8>,
    admin: bool,
}

impl TransactionId {
    /// Network-standard id: hex encoded SHA-256 of `nonce || creator`, where
    /// `creator` is the serialized signing identity.
    pub fn derive(nonce: &[u8], creator: &[u8], admin: bool) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(nonce);
        hasher.update(creator);
        Self {
            id: hex::encode(hasher.finalize()),
            nonce: nonce.to_vec(),
            admin,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }

    pub fn nonce(&self) -> &[u8] {
        &self.nonce
    }

    pub fn is_admin(&self) -> bool {
        self.admin
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PeerReply {
    Endorsement {
        status: i32,
        message: String,
        payload: Vec<u8>,
    },
    /// The call to the peer itself failed; no endorsement was produced.
    TransportError(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProposalResponse {
    pub peer: PeerTarget,
    pub reply: PeerReply,
}

impl ProposalResponse {
    pub fn endorsed(peer: PeerTarget, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            peer,
            reply: PeerReply::Endorsement {
                status: STATUS_OK,
                message: String::new(),
                payload: payload.into(),
            },
        }
    }

    pub fn rejected(peer: PeerTarget, status: i32, message: impl Into<String>) -> Self {
        Self {
            peer,
            reply: PeerReply::Endorsement {
                status,
                message: message.into(),
                payload: Vec::new(),
            },
        }
    }

    pub fn transport_error(peer: PeerTarget, message: impl Into<String>) -> Self {
        Self {
            peer,
            reply: PeerReply::TransportError(message.into()),
        }
    }
}

/// Signed proposal returned by the endorsement round; handed back untouched
/// to the ordering service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proposal {
    pub tx_id: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderStatus {
    Success,
    Failure,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderResult {
    pub status: OrderStatus,
    pub detail: String,
}

impl OrderResult {
    pub fn success() -> Self {
        Self {
            status: OrderStatus::Success,
            detail: String::new(),
        }
    }

    pub fn failure(detail: impl Into<String>) -> Self {
        Self {
            status: OrderStatus::Failure,
            detail: detail.into(),
        }
    }
}

/// `{name, version}` entry of an installed or instantiated registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChaincodeRecord {
    pub name: String,
    pub version: String,
}

impl ChaincodeRecord {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct InstallRequest {
    pub chaincode_id: String,
    pub chaincode_path: String,
    pub chaincode_version: String,
    pub chaincode_type: ChaincodeLanguage,
    /// Workspace the package is built from; set for golang chaincode.
    pub go_path: Option<PathBuf>,
    pub targets: Vec<PeerTarget>,
    pub tx_id: TransactionId,
}

#[derive(Clone, Debug)]
pub struct InstantiateRequest {
    pub chaincode_id: String,
    pub chaincode_version: String,
    pub function: Option<String>,
    pub args: Option<Vec<String>>,
    pub targets: Vec<PeerTarget>,
    pub tx_id: TransactionId,
}

#[derive(Clone, Debug)]
pub struct TransactionRequest {
    pub proposal: Proposal,
    pub proposal_responses: Vec<ProposalResponse>,
    pub tx_id: TransactionId,
}

/// Connection material for one organization.
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectionProfile {
    pub organization: String,
    pub document: Value,
}

impl ConnectionProfile {
    pub fn name(&self) -> Option<&str> {
        self.document.get("name").and_then(Value::as_str)
    }
}

#[async_trait]
pub trait ProfileResolver: Send + Sync {
    async fn connection_profile(&self, organization: &str) -> Result<ConnectionProfile>;
}

#[async_trait]
pub trait GatewayConnector: Send + Sync {
    async fn connect(
        &self,
        identity: &str,
        organization: &str,
        profile: &ConnectionProfile,
    ) -> Result<Box<dyn Session>>;
}

#[async_trait]
pub trait Session: Send + Sync {
    fn client(&self) -> Arc<dyn ClientContext>;

    fn peers_for_org(&self, organization: &str) -> Vec<PeerTarget>;

    async fn network(&self, channel: &str) -> Result<Arc<dyn NetworkHandle>>;

    fn disconnect(&self);
}

#[async_trait]
pub trait ClientContext: Send + Sync {
    async fn query_installed_chaincodes(&self, peer: &PeerTarget) -> Result<Vec<ChaincodeRecord>>;

    async fn install_chaincode(&self, request: InstallRequest) -> Result<Vec<ProposalResponse>>;

    fn new_transaction_id(&self, admin: bool) -> TransactionId;
}

pub trait NetworkHandle: Send + Sync {
    fn channel(&self) -> Arc<dyn ChannelHandle>;

    fn contract(&self, chaincode: &str) -> Arc<dyn ContractHandle>;
}

#[async_trait]
pub trait ChannelHandle: Send + Sync {
    async fn send_instantiate_proposal(
        &self,
        request: InstantiateRequest,
    ) -> Result<(Vec<ProposalResponse>, Proposal)>;

    async fn send_transaction(&self, request: TransactionRequest) -> Result<OrderResult>;

    async fn query_instantiated_chaincodes(
        &self,
        peer: &PeerTarget,
    ) -> Result<Vec<ChaincodeRecord>>;
}

#[async_trait]
pub trait ContractHandle: Send + Sync {
    async fn submit_transaction(&self, function: &str, args: &[String]) -> Result<Vec<u8>>;

    async fn evaluate_transaction(&self, function: &str, args: &[String]) -> Result<Vec<u8>>;
}
