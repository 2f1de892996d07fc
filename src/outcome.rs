use std::fmt;

use anyhow::{anyhow, Result};

use crate::aggregate::PeerFailure;
use crate::gateway::OrderResult;

/// Protocol phases of install and instantiate.
///
/// ```text
/// Validated -> PeersResolved -> AlreadyPresent | NotInstalled | EndorsementFailed
///                            -> Endorsed -> Ordered | OrderingFailed
/// ```
///
/// Install stops at `Endorsed`; instantiate must pass through ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecyclePhase {
    Validated,
    PeersResolved,
    AlreadyPresent,
    NotInstalled,
    Endorsed,
    EndorsementFailed,
    Ordered,
    OrderingFailed,
}

impl LifecyclePhase {
    pub fn allows(self, next: LifecyclePhase) -> bool {
        use LifecyclePhase::*;
        matches!(
            (self, next),
            (Validated, PeersResolved)
                | (PeersResolved, AlreadyPresent)
                | (PeersResolved, NotInstalled)
                | (PeersResolved, Endorsed)
                | (PeersResolved, EndorsementFailed)
                | (Endorsed, Ordered)
                | (Endorsed, OrderingFailed)
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PhaseTrail {
    phases: Vec<LifecyclePhase>,
}

impl PhaseTrail {
    pub(crate) fn validated() -> Self {
        Self {
            phases: vec![LifecyclePhase::Validated],
        }
    }

    pub(crate) fn current(&self) -> LifecyclePhase {
        self.phases
            .last()
            .copied()
            .unwrap_or(LifecyclePhase::Validated)
    }

    pub(crate) fn advance(&mut self, next: LifecyclePhase) -> Result<()> {
        let current = self.current();
        if !current.allows(next) {
            return Err(anyhow!(
                "invalid lifecycle transition {current:?} -> {next:?}"
            ));
        }
        self.phases.push(next);
        Ok(())
    }

    pub(crate) fn into_phases(self) -> Vec<LifecyclePhase> {
        self.phases
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Install,
    Instantiate,
    Invoke,
    Query,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Instantiate => "instantiate",
            Self::Invoke => "invoke",
            Self::Query => "query",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutcomeStatus {
    Succeeded,
    AlreadyInstalled,
    /// Instantiate precondition: the chaincode is missing on the peer.
    NotInstalled,
    EndorsementFailed,
    OrderingFailed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChaincodeResponse {
    Empty,
    Text(String),
}

impl ChaincodeResponse {
    pub fn from_payload(payload: &[u8]) -> Self {
        let text = String::from_utf8_lossy(payload);
        if text.is_empty() {
            Self::Empty
        } else {
            Self::Text(text.into_owned())
        }
    }
}

/// Completed result of a lifecycle operation. Fatal setup failures are
/// returned as errors instead; everything past validation ends up here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub operation: Operation,
    pub chaincode: String,
    pub status: OutcomeStatus,
    pub phases: Vec<LifecyclePhase>,
    pub failures: Vec<PeerFailure>,
    pub ordering: Option<OrderResult>,
    pub already_instantiated: bool,
    pub response: Option<ChaincodeResponse>,
    pub tx_id: Option<String>,
}

impl Outcome {
    pub(crate) fn new(operation: Operation, chaincode: &str, status: OutcomeStatus) -> Self {
        Self {
            operation,
            chaincode: chaincode.to_string(),
            status,
            phases: Vec::new(),
            failures: Vec::new(),
            ordering: None,
            already_instantiated: false,
            response: None,
            tx_id: None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self.status,
            OutcomeStatus::Succeeded | OutcomeStatus::AlreadyInstalled
        )
    }

    pub fn summary(&self) -> String {
        match (self.operation, self.status) {
            (Operation::Install, OutcomeStatus::Succeeded) => {
                "Chaincode install successful.".to_string()
            }
            (Operation::Install, OutcomeStatus::AlreadyInstalled) => {
                "Chaincode with this name and version already installed.".to_string()
            }
            (Operation::Install, _) => "Install failed.".to_string(),
            (Operation::Instantiate, OutcomeStatus::Succeeded) => {
                "Instantiation successful.".to_string()
            }
            (Operation::Instantiate, OutcomeStatus::NotInstalled) => {
                "Chaincode should be installed.".to_string()
            }
            (Operation::Instantiate, OutcomeStatus::EndorsementFailed) => {
                "Sending instantiate proposal failed.".to_string()
            }
            (Operation::Instantiate, _) => "Instantiation failed.".to_string(),
            (Operation::Invoke | Operation::Query, _) => match &self.response {
                Some(ChaincodeResponse::Text(text)) => {
                    format!("response from chaincode: {text}")
                }
                _ => "Got empty response.".to_string(),
            },
        }
    }
}
