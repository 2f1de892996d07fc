use thiserror::Error;

/// Fatal failures that abort a lifecycle operation before it can report an
/// outcome. Protocol-level rejections (bad endorsements, ordering failures)
/// are not errors; they are carried by [`crate::outcome::Outcome`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("invalid chaincode path `{path}`: {reason}")]
    PathValidation { path: String, reason: String },

    #[error("no peers found in connection profile for organization `{organization}`")]
    NoPeers { organization: String },

    #[error("failed to query {registry} chaincodes on peer `{peer}`: {reason}")]
    Query {
        registry: QueryRegistry,
        peer: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryRegistry {
    Installed,
    Instantiated,
}

impl std::fmt::Display for QueryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Installed => write!(f, "installed"),
            Self::Instantiated => write!(f, "instantiated"),
        }
    }
}

impl LifecycleError {
    pub(crate) fn path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PathValidation {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
