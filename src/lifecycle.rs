use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::{json, Value};

use crate::aggregate::{aggregate_responses, order_succeeded, EndorsementVerdict, PeerFailure};
use crate::config::{GoPathMode, ToolConfig};
use crate::descriptor::{ChaincodeDescriptor, ChaincodeId};
use crate::env::{ScopedEnvVar, GOPATH_VAR};
use crate::error::LifecycleError;
use crate::gateway::{
    GatewayConnector, InstallRequest, InstantiateRequest, PeerTarget, ProfileResolver, Session,
    TransactionRequest,
};
use crate::idempotency::{is_installed, is_instantiated};
use crate::logging::{render_payload, LogSink, Logger};
use crate::outcome::{
    ChaincodeResponse, LifecyclePhase, Operation, Outcome, OutcomeStatus, PhaseTrail,
};
use crate::path::resolve_chaincode_path;

/// Parameters of an instantiate proposal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstantiateParams {
    pub channel: String,
    pub name: String,
    pub version: String,
    pub function: Option<String>,
    pub args: Option<Vec<String>>,
}

/// A single chaincode function call on a channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChaincodeCall {
    pub channel: String,
    pub chaincode: String,
    pub function: String,
    pub args: Vec<String>,
}

/// Disconnects the session exactly once, whichever way the operation exits.
struct SessionGuard {
    session: Box<dyn Session>,
    logger: Logger,
}

impl SessionGuard {
    fn session(&self) -> &dyn Session {
        self.session.as_ref()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.session.disconnect();
        self.logger.debug("Gateway disconnected.", None);
    }
}

pub struct ChaincodeLifecycleManager {
    profiles: Arc<dyn ProfileResolver>,
    connector: Arc<dyn GatewayConnector>,
    logger: Logger,
    gopath_mode: GoPathMode,
}

impl ChaincodeLifecycleManager {
    pub fn new(profiles: Arc<dyn ProfileResolver>, connector: Arc<dyn GatewayConnector>) -> Self {
        Self {
            profiles,
            connector,
            logger: Logger::default(),
            gopath_mode: GoPathMode::default(),
        }
    }

    pub fn from_config(
        config: &ToolConfig,
        profiles: Arc<dyn ProfileResolver>,
        connector: Arc<dyn GatewayConnector>,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        Self::new(profiles, connector)
            .with_logger(Logger::new(sink, config.log_level))
            .with_gopath_mode(config.gopath_mode)
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_gopath_mode(mut self, mode: GoPathMode) -> Self {
        self.gopath_mode = mode;
        self
    }

    async fn open_session(
        &self,
        identity: &str,
        organization: &str,
        logger: &Logger,
    ) -> Result<SessionGuard> {
        let profile = self
            .profiles
            .connection_profile(organization)
            .await
            .with_context(|| format!("unable to resolve connection profile for `{organization}`"))?;
        let session = self
            .connector
            .connect(identity, organization, &profile)
            .await
            .with_context(|| format!("unable to connect as `{identity}` for `{organization}`"))?;
        Ok(SessionGuard {
            session,
            logger: logger.clone(),
        })
    }

    fn resolve_peers(session: &dyn Session, organization: &str) -> Result<Vec<PeerTarget>> {
        let peers = session.peers_for_org(organization);
        if peers.is_empty() {
            return Err(LifecycleError::NoPeers {
                organization: organization.to_string(),
            }
            .into());
        }
        Ok(peers)
    }

    pub async fn install(
        &self,
        descriptor: &ChaincodeDescriptor,
        organization: &str,
        admin: &str,
    ) -> Result<Outcome> {
        let logger = self.logger.scoped(json!({
            "operation": Operation::Install.as_str(),
            "chaincode": descriptor.to_string(),
            "organization": organization,
        }));
        let resolved = resolve_chaincode_path(&descriptor.path, descriptor.language)?;
        let mut trail = PhaseTrail::validated();

        // Declared before the session so it is restored after disconnect.
        let _gopath = match (&resolved.workspace_root, self.gopath_mode) {
            (Some(root), GoPathMode::Environment) => {
                logger.debug(
                    "Exporting GOPATH for chaincode packaging.",
                    Some(json!({ "gopath": root.display().to_string() })),
                );
                Some(ScopedEnvVar::set(GOPATH_VAR, root).await)
            }
            _ => None,
        };

        let guard = self.open_session(admin, organization, &logger).await?;
        let client = guard.session().client();
        let peers = Self::resolve_peers(guard.session(), organization)?;
        trail.advance(LifecyclePhase::PeersResolved)?;

        logger.info("Checking that chaincode is not installed yet...", None);
        if is_installed(&descriptor.id(), client.as_ref(), &peers[0]).await? {
            trail.advance(LifecyclePhase::AlreadyPresent)?;
            let mut outcome = Outcome::new(
                Operation::Install,
                &descriptor.name,
                OutcomeStatus::AlreadyInstalled,
            );
            outcome.phases = trail.into_phases();
            logger.info(&outcome.summary(), None);
            return Ok(outcome);
        }

        let tx_id = client.new_transaction_id(true);
        let request = InstallRequest {
            chaincode_id: descriptor.name.clone(),
            chaincode_path: resolved.chaincode_path,
            chaincode_version: descriptor.version.clone(),
            chaincode_type: descriptor.language,
            go_path: resolved.workspace_root,
            targets: peers,
            tx_id: tx_id.clone(),
        };

        logger.info(
            "Sending request for chaincode installation...",
            Some(json!({ "targets": request.targets.len(), "txId": tx_id.as_str() })),
        );
        let responses = client
            .install_chaincode(request)
            .await
            .context("install request failed")?;
        let verdict = aggregate_responses(&responses);
        log_verdict(&logger, &verdict);

        let status = if verdict.is_success() {
            trail.advance(LifecyclePhase::Endorsed)?;
            OutcomeStatus::Succeeded
        } else {
            trail.advance(LifecyclePhase::EndorsementFailed)?;
            OutcomeStatus::EndorsementFailed
        };

        let mut outcome = Outcome::new(Operation::Install, &descriptor.name, status);
        outcome.phases = trail.into_phases();
        outcome.failures = verdict.failures;
        outcome.tx_id = Some(tx_id.to_string());
        report(&logger, &outcome);
        Ok(outcome)
    }

    pub async fn instantiate(
        &self,
        params: &InstantiateParams,
        organization: &str,
        admin: &str,
    ) -> Result<Outcome> {
        let id = ChaincodeId::new(&params.name, &params.version);
        let logger = self.logger.scoped(json!({
            "operation": Operation::Instantiate.as_str(),
            "chaincode": id.to_string(),
            "organization": organization,
            "channel": params.channel,
        }));
        let mut trail = PhaseTrail::validated();

        let guard = self.open_session(admin, organization, &logger).await?;
        let client = guard.session().client();
        let peers = Self::resolve_peers(guard.session(), organization)?;
        trail.advance(LifecyclePhase::PeersResolved)?;
        let peer = peers[0].clone();

        logger.info("Checking that chaincode is installed...", None);
        if !is_installed(&id, client.as_ref(), &peer).await? {
            trail.advance(LifecyclePhase::NotInstalled)?;
            let mut outcome = Outcome::new(
                Operation::Instantiate,
                &id.name,
                OutcomeStatus::NotInstalled,
            );
            outcome.phases = trail.into_phases();
            logger.error(
                &outcome.summary(),
                Some(json!({ "peer": peer.name })),
            );
            return Ok(outcome);
        }

        let network = guard
            .session()
            .network(&params.channel)
            .await
            .with_context(|| format!("unable to open channel `{}`", params.channel))?;
        let channel = network.channel();

        logger.info("Checking that chaincode is not instantiated...", None);
        // Detection does not stop the flow; the proposal is still sent.
        let already_instantiated = is_instantiated(&id, channel.as_ref(), &peer).await?;
        if already_instantiated {
            logger.warn(
                &format!("Chaincode {} is already instantiated.", id.name),
                None,
            );
        }

        let tx_id = client.new_transaction_id(true);
        let request = InstantiateRequest {
            chaincode_id: id.name.clone(),
            chaincode_version: id.version.clone(),
            function: params.function.clone(),
            args: params.args.clone(),
            targets: vec![peer],
            tx_id: tx_id.clone(),
        };

        logger.info(
            "Sending instantiate proposal request...",
            Some(json!({ "txId": tx_id.as_str() })),
        );
        let (responses, proposal) = channel
            .send_instantiate_proposal(request)
            .await
            .context("instantiate proposal failed")?;
        let verdict = aggregate_responses(&responses);
        log_verdict(&logger, &verdict);

        let mut outcome = Outcome::new(
            Operation::Instantiate,
            &id.name,
            OutcomeStatus::EndorsementFailed,
        );
        outcome.already_instantiated = already_instantiated;
        outcome.tx_id = Some(tx_id.to_string());

        if !verdict.is_success() {
            trail.advance(LifecyclePhase::EndorsementFailed)?;
            outcome.phases = trail.into_phases();
            outcome.failures = verdict.failures;
            report(&logger, &outcome);
            return Ok(outcome);
        }
        trail.advance(LifecyclePhase::Endorsed)?;

        let order_request = TransactionRequest {
            proposal,
            proposal_responses: responses,
            tx_id,
        };
        logger.info("Sending instantiation transaction to be ordered...", None);
        let order = channel
            .send_transaction(order_request)
            .await
            .context("ordering submission failed")?;

        if order_succeeded(&order) {
            trail.advance(LifecyclePhase::Ordered)?;
            outcome.status = OutcomeStatus::Succeeded;
        } else {
            trail.advance(LifecyclePhase::OrderingFailed)?;
            outcome.status = OutcomeStatus::OrderingFailed;
            logger.error(
                "Ordering service rejected the transaction.",
                Some(json!({ "status": format!("{:?}", order.status), "detail": order.detail })),
            );
        }
        outcome.phases = trail.into_phases();
        outcome.ordering = Some(order);
        report(&logger, &outcome);
        Ok(outcome)
    }

    pub async fn invoke(
        &self,
        call: &ChaincodeCall,
        client_identity: &str,
        organization: &str,
    ) -> Result<Outcome> {
        self.call_contract(Operation::Invoke, call, client_identity, organization)
            .await
    }

    pub async fn query(
        &self,
        call: &ChaincodeCall,
        client_identity: &str,
        organization: &str,
    ) -> Result<Outcome> {
        self.call_contract(Operation::Query, call, client_identity, organization)
            .await
    }

    async fn call_contract(
        &self,
        operation: Operation,
        call: &ChaincodeCall,
        client_identity: &str,
        organization: &str,
    ) -> Result<Outcome> {
        let logger = self.logger.scoped(json!({
            "operation": operation.as_str(),
            "chaincode": call.chaincode,
            "organization": organization,
            "channel": call.channel,
        }));

        let guard = self
            .open_session(client_identity, organization, &logger)
            .await?;
        let network = guard
            .session()
            .network(&call.channel)
            .await
            .with_context(|| format!("unable to open channel `{}`", call.channel))?;
        let contract = network.contract(&call.chaincode);

        let payload = match operation {
            Operation::Query => contract.evaluate_transaction(&call.function, &call.args).await,
            _ => contract.submit_transaction(&call.function, &call.args).await,
        }
        .with_context(|| {
            format!(
                "{operation} of `{}` on chaincode `{}` failed",
                call.function, call.chaincode
            )
        })?;

        let verb = match operation {
            Operation::Query => "queried",
            _ => "invoked",
        };
        logger.info(
            &format!(
                "Chaincode {} successfully {verb} on channel {}.",
                call.chaincode, call.channel
            ),
            None,
        );

        let mut outcome = Outcome::new(operation, &call.chaincode, OutcomeStatus::Succeeded);
        outcome.response = Some(ChaincodeResponse::from_payload(&payload));
        logger.info(&outcome.summary(), None);
        Ok(outcome)
    }
}

fn log_verdict(logger: &Logger, verdict: &EndorsementVerdict) {
    if verdict.responded == 0 {
        logger.warn("No endorsement responses received.", None);
    }
    for failure in &verdict.failures {
        logger.error(&failure.to_string(), Some(failure_data(failure)));
    }
}

fn failure_data(failure: &PeerFailure) -> Value {
    match failure {
        PeerFailure::Transport { peer, message } => json!({
            "peer": peer.name,
            "endpoint": peer.endpoint,
            "error": message,
        }),
        PeerFailure::Endorsement {
            peer,
            status,
            message,
            payload,
        } => json!({
            "peer": peer.name,
            "endpoint": peer.endpoint,
            "status": status,
            "message": message,
            "payload": render_payload(payload),
        }),
    }
}

fn report(logger: &Logger, outcome: &Outcome) {
    if outcome.is_success() {
        logger.info(&outcome.summary(), None);
    } else {
        logger.error(
            &outcome.summary(),
            Some(json!({ "failedPeers": outcome.failures.len() })),
        );
    }
}
