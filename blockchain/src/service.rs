use std::sync::Arc;

use anyhow::{ensure, Result};
use dispatcher::{Dispatcher, Responder};
use execution_engine::{ExecutionEngine, PayloadBuilder};
use helpers::misc::kzg_commitment_to_versioned_hash;
use log::{info, warn};
use state_transition::{
    all_validator_updates, genesis::initialize_premined_beacon_state_from_eth1,
    ProcessingContext,
};
use storage::StorageBackend;
use types::{
    config::Config,
    containers::{BeaconBlock, BlobSidecars},
    genesis::Genesis,
    nonstandard::{
        BlockProposal, ConsensusBlock, FinalizedBlock, SidecarsProposal, ValidatorUpdates,
    },
    primitives::VersionedHash,
};

use crate::{error::Error, execution, kzg::KzgVerifier, sidecars, verification};

/// Bundle of the responders the chain service consumes. Taken from the
/// dispatcher once, during wiring.
pub struct ChainResponders {
    pub genesis: Responder<Genesis, ValidatorUpdates>,
    pub verify_block: Responder<BlockProposal, ()>,
    pub verify_sidecars: Responder<SidecarsProposal, ()>,
    pub process_sidecars: Responder<BlobSidecars, ()>,
    pub finalize: Responder<ConsensusBlock, ValidatorUpdates>,
}

/// Serves genesis processing, proposal verification, sidecar handling,
/// and block finalization.
pub struct ChainService<E, K> {
    config: Arc<Config>,
    backend: Arc<StorageBackend>,
    payload_builder: Arc<PayloadBuilder<E>>,
    dispatcher: Arc<Dispatcher>,
    kzg: K,
    optimistic: bool,
}

impl<E: ExecutionEngine, K: KzgVerifier> ChainService<E, K> {
    #[must_use]
    pub fn new(
        config: Arc<Config>,
        backend: Arc<StorageBackend>,
        payload_builder: Arc<PayloadBuilder<E>>,
        dispatcher: Arc<Dispatcher>,
        kzg: K,
        optimistic: bool,
    ) -> Self {
        Self {
            config,
            backend,
            payload_builder,
            dispatcher,
            kzg,
            optimistic,
        }
    }

    /// Drains all five topics from one task. The middleware issues the
    /// requests strictly in phase order, so serving them sequentially
    /// preserves the verify-before-persist and persist-before-finalize
    /// guarantees.
    pub async fn run(self, mut responders: ChainResponders) {
        loop {
            tokio::select! {
                request = responders.genesis.next() => {
                    let Some(request) = request else { break };
                    let Some(request) = request.reject_if_cancelled() else { continue };
                    let result = self.on_genesis(&request.payload).await;
                    request.respond(result);
                }
                request = responders.verify_block.next() => {
                    let Some(request) = request else { break };
                    let Some(request) = request.reject_if_cancelled() else { continue };
                    let result = self.on_verify_block(&request.payload).await;
                    request.respond(result);
                }
                request = responders.verify_sidecars.next() => {
                    let Some(request) = request else { break };
                    let Some(request) = request.reject_if_cancelled() else { continue };
                    let result = self.on_verify_sidecars(&request.payload);
                    request.respond(result);
                }
                request = responders.process_sidecars.next() => {
                    let Some(request) = request else { break };
                    let Some(request) = request.reject_if_cancelled() else { continue };
                    let result = self.on_process_sidecars(&request.payload);
                    request.respond(result);
                }
                request = responders.finalize.next() => {
                    let Some(request) = request else { break };
                    let Some(request) = request.reject_if_cancelled() else { continue };
                    let result = self.on_finalize(&request.payload).await;
                    request.respond(result);
                }
            }
        }

        info!("chain service stopping: the dispatcher closed");
    }

    pub async fn on_genesis(&self, genesis: &Genesis) -> Result<ValidatorUpdates> {
        let state = initialize_premined_beacon_state_from_eth1(
            &self.config,
            &genesis.deposits,
            &genesis.execution_payload_header,
            genesis.fork_version,
        )?;

        // The queue mirrors the chain: genesis deposits are both applied
        // to the state and enqueued for later range reads.
        self.backend
            .deposit_store()
            .enqueue_deposits(&genesis.deposits)?;

        let updates = all_validator_updates(&state);
        self.backend.state_store().commit(state);

        Ok(updates)
    }

    pub async fn on_verify_block(&self, proposal: &BlockProposal) -> Result<()> {
        let state = self.backend.state_store().state_from_context()?;

        let context = ProcessingContext {
            optimistic_engine: self.optimistic,
            ..ProcessingContext::default()
        };

        verification::verify_beacon_block(&self.config, context, &state, proposal)?;

        self.notify_engine(&proposal.block).await
    }

    pub fn on_verify_sidecars(&self, proposal: &SidecarsProposal) -> Result<()> {
        sidecars::verify_sidecars(proposal, &self.kzg)
    }

    pub fn on_process_sidecars(&self, sidecars: &BlobSidecars) -> Result<()> {
        self.backend.availability_store().persist(sidecars)
    }

    pub async fn on_finalize(&self, consensus_block: &ConsensusBlock) -> Result<ValidatorUpdates> {
        let block = &consensus_block.block;
        let mut state = self.backend.state_store().state_from_context()?;

        // The engine sees the payload before the state commits to it.
        match self.notify_engine(block).await {
            Ok(()) => {}
            Err(error) if !errors::is_fatal(&error) => {
                warn!("continuing with an unvalidated payload: {error:#}");
            }
            Err(error) => return Err(error),
        }

        let context = ProcessingContext {
            optimistic_engine: self.optimistic,
            ..ProcessingContext::default()
        };

        let updates =
            state_transition::state_transition(&self.config, context, &mut state, block)?;

        ensure!(
            self.backend
                .availability_store()
                .is_data_available(block.slot, &block.body)?,
            Error::DataNotAvailable { slot: block.slot },
        );

        self.backend.block_store().set(block)?;
        self.backend.state_store().commit(state.clone());

        self.dispatcher
            .topics()
            .finalized_block
            .publish(FinalizedBlock { slot: block.slot })
            .await;

        execution::send_post_block_fcu(&self.payload_builder, &state, consensus_block).await;

        Ok(updates)
    }

    async fn notify_engine(&self, block: &BeaconBlock) -> Result<()> {
        let versioned_hashes = block
            .body
            .blob_kzg_commitments
            .iter()
            .map(|commitment| kzg_commitment_to_versioned_hash(*commitment))
            .collect::<Vec<VersionedHash>>();

        self.payload_builder
            .notify_new_payload(
                block.slot,
                &block.body.execution_payload,
                versioned_hashes,
                block.parent_root,
                self.optimistic,
            )
            .await
    }
}
