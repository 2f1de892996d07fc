pub mod aggregate;
pub mod cli;
pub mod config;
pub mod descriptor;
pub mod env;
pub mod error;
pub mod gateway;
pub mod idempotency;
pub mod lifecycle;
pub mod logging;
pub mod outcome;
pub mod path;
pub mod profile;

pub use aggregate::{aggregate_responses, EndorsementVerdict, PeerFailure};
pub use config::{GoPathMode, ToolConfig};
pub use descriptor::{ChaincodeDescriptor, ChaincodeId, ChaincodeLanguage};
pub use error::LifecycleError;
pub use lifecycle::{ChaincodeCall, ChaincodeLifecycleManager, InstantiateParams};
pub use outcome::{ChaincodeResponse, LifecyclePhase, Operation, Outcome, OutcomeStatus};
pub use profile::FileProfileStore;
