use thiserror::Error;

use crate::gateway::{
    OrderResult, OrderStatus, PeerReply, PeerTarget, ProposalResponse, STATUS_OK,
};

/// A per-peer failure collected during an endorsement round. Collected
/// failures never abort the operation on their own; they flip the verdict.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PeerFailure {
    #[error("transport error from peer {peer}: {message}")]
    Transport { peer: PeerTarget, message: String },

    #[error("peer {peer} rejected the proposal with status {status}: {message}")]
    Endorsement {
        peer: PeerTarget,
        status: i32,
        message: String,
        payload: Vec<u8>,
    },
}

impl PeerFailure {
    pub fn peer(&self) -> &PeerTarget {
        match self {
            Self::Transport { peer, .. } | Self::Endorsement { peer, .. } => peer,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EndorsementVerdict {
    pub failures: Vec<PeerFailure>,
    pub responded: usize,
}

impl EndorsementVerdict {
    /// All-or-nothing: one failing peer fails the whole round. An empty
    /// round has no failing peer; `responded` tells it apart.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

pub fn aggregate_responses(responses: &[ProposalResponse]) -> EndorsementVerdict {
    let failures = responses.iter().filter_map(classify).collect();
    EndorsementVerdict {
        failures,
        responded: responses.len(),
    }
}

pub fn order_succeeded(result: &OrderResult) -> bool {
    result.status == OrderStatus::Success
}

fn classify(response: &ProposalResponse) -> Option<PeerFailure> {
    match &response.reply {
        PeerReply::TransportError(message) => Some(PeerFailure::Transport {
            peer: response.peer.clone(),
            message: message.clone(),
        }),
        PeerReply::Endorsement {
            status,
            message,
            payload,
        } if *status != STATUS_OK => Some(PeerFailure::Endorsement {
            peer: response.peer.clone(),
            status: *status,
            message: message.clone(),
            payload: payload.clone(),
        }),
        PeerReply::Endorsement { .. } => None,
    }
}
