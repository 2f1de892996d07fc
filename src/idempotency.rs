use anyhow::Result;

use crate::descriptor::ChaincodeId;
use crate::error::{LifecycleError, QueryRegistry};
use crate::gateway::{ChaincodeRecord, ChannelHandle, ClientContext, PeerTarget};

/// True iff the peer reports an installed chaincode with the same
/// `(name, version)`. Query failures are fatal: the guard is meaningless
/// without an answer.
pub async fn is_installed(
    id: &ChaincodeId,
    client: &dyn ClientContext,
    peer: &PeerTarget,
) -> Result<bool> {
    let records = client
        .query_installed_chaincodes(peer)
        .await
        .map_err(|err| query_error(QueryRegistry::Installed, peer, &err))?;
    Ok(contains_identity(&records, id))
}

/// Same rule as [`is_installed`], over the channel's instantiated registry as
/// seen by `peer`.
pub async fn is_instantiated(
    id: &ChaincodeId,
    channel: &dyn ChannelHandle,
    peer: &PeerTarget,
) -> Result<bool> {
    let records = channel
        .query_instantiated_chaincodes(peer)
        .await
        .map_err(|err| query_error(QueryRegistry::Instantiated, peer, &err))?;
    Ok(contains_identity(&records, id))
}

pub fn contains_identity(records: &[ChaincodeRecord], id: &ChaincodeId) -> bool {
    records
        .iter()
        .any(|record| id.matches(&record.name, &record.version))
}

fn query_error(registry: QueryRegistry, peer: &PeerTarget, err: &anyhow::Error) -> anyhow::Error {
    LifecycleError::Query {
        registry,
        peer: peer.name.clone(),
        reason: format!("{err:#}"),
    }
    .into()
}
