use std::sync::Arc;

use anyhow::{ensure, Result};
use dispatcher::Responder;
use execution_engine::{ExecutionEngine, GetPayloadResponse, PayloadBuilder};
use helpers::{
    accessors::{get_block_root_at_slot, validator_index_by_pubkey},
    misc::compute_epoch_at_slot,
    signing::{randao_signing_root, LocalSigner},
};
use log::{info, warn};
use ssz_types::VariableList;
use state_transition::{slot_processing::process_slots, ProcessingContext};
use storage::StorageBackend;
use tree_hash::TreeHash as _;
use types::{
    beacon_state::BeaconState,
    config::Config,
    consts::MAX_DEPOSITS,
    containers::{BeaconBlock, BeaconBlockBody, BlobSidecar, BlobSidecars, Eth1Data},
    merkle::kzg_commitment_inclusion_proof,
    nonstandard::{BeaconBlockBundle, SlotData},
    primitives::{Slot, B256},
};

use crate::{error::Error, misc::graffiti_from_moniker};

/// Serves `BuildBeaconBlockAndSidecars`: assembles, signs, and roots the
/// proposal for a slot this node proposes in.
pub struct ValidatorService<E> {
    config: Arc<Config>,
    backend: Arc<StorageBackend>,
    payload_builder: Arc<PayloadBuilder<E>>,
    signer: LocalSigner,
    moniker: String,
}

impl<E: ExecutionEngine> ValidatorService<E> {
    #[must_use]
    pub fn new(
        config: Arc<Config>,
        backend: Arc<StorageBackend>,
        payload_builder: Arc<PayloadBuilder<E>>,
        signer: LocalSigner,
        moniker: String,
    ) -> Self {
        Self {
            config,
            backend,
            payload_builder,
            signer,
            moniker,
        }
    }

    pub async fn run(self, mut responder: Responder<SlotData, BeaconBlockBundle>) {
        while let Some(request) = responder.next().await {
            let Some(request) = request.reject_if_cancelled() else {
                continue;
            };

            let result = self.build_block_and_sidecars(&request.payload).await;
            request.respond(result);
        }

        info!("validator service stopping: the dispatcher closed");
    }

    async fn build_block_and_sidecars(&self, slot_data: &SlotData) -> Result<BeaconBlockBundle> {
        let slot = slot_data.slot;

        let mut state = self.backend.state_store().state_from_context()?;
        prepare_state_for_building(&mut state, slot)?;

        let mut block = self.get_empty_beacon_block(&state, slot)?;

        if block.body.is_graffiti_empty() {
            warn!("graffiti is empty, filling it with the moniker");
            block.body.graffiti = graffiti_from_moniker(&self.moniker);
        }

        // The payload build was requested when the previous block was
        // finalized. Without a handle there is nothing to propose with.
        let parent_payload_hash = state.latest_execution_payload_header.block_hash;

        let GetPayloadResponse {
            execution_payload,
            blobs_bundle,
            ..
        } = self
            .payload_builder
            .retrieve_payload(slot, parent_payload_hash)
            .await?
            .ok_or(Error::NilPayload)?;

        // Deposits the queue holds beyond the state's applied index, up to
        // the per-block maximum.
        let start = state.eth1_deposit_index;
        let count = MAX_DEPOSITS.min(
            self.backend
                .deposit_store()
                .next_index()
                .saturating_sub(start),
        );
        let deposits = self
            .backend
            .deposit_store()
            .get_deposits_by_index(start, count)?;

        block.body.deposits =
            VariableList::new(deposits).map_err(|_| Error::BundleOverflow)?;
        block.body.eth1_data = Eth1Data {
            deposit_root: state.eth1_data.deposit_root,
            deposit_count: start + count,
            block_hash: state.eth1_data.block_hash,
        };

        block.body.attestations = VariableList::new(slot_data.attestations.clone())
            .map_err(|_| Error::BundleOverflow)?;
        block.body.slashings = VariableList::new(slot_data.slashings.clone())
            .map_err(|_| Error::BundleOverflow)?;

        block.body.blob_kzg_commitments =
            VariableList::new(blobs_bundle.commitments.clone())
                .map_err(|_| Error::BundleOverflow)?;
        block.body.execution_payload = execution_payload;

        let epoch = compute_epoch_at_slot(slot);
        block.body.randao_reveal = self.signer.sign(randao_signing_root(&state, epoch));

        // The state root comes from a transition on a scratch copy; the
        // canonical state is only advanced at finalization.
        let mut speculative = state.clone();
        state_transition::state_transition(
            &self.config,
            ProcessingContext::speculative(),
            &mut speculative,
            &block,
        )?;
        block.state_root = speculative.tree_hash_root();

        let sidecars = build_sidecars(&block, &blobs_bundle)?;

        Ok(BeaconBlockBundle { block, sidecars })
    }

    fn get_empty_beacon_block(&self, state: &BeaconState, slot: Slot) -> Result<BeaconBlock> {
        let parent_root = get_block_root_at_slot(state, slot.saturating_sub(1))?;

        let proposer_index = validator_index_by_pubkey(state, self.signer.public_key())
            .ok_or(Error::NotProposer)?;

        Ok(BeaconBlock {
            slot,
            proposer_index,
            parent_root,
            state_root: B256::ZERO,
            body: BeaconBlockBody::default(),
        })
    }
}

/// Brings the state to exactly the requested slot: one slot behind is
/// advanced, anything else is refused.
fn prepare_state_for_building(state: &mut BeaconState, requested_slot: Slot) -> Result<()> {
    let state_slot = state.slot;

    if requested_slot <= state_slot {
        return Err(Error::RequestedSlotInPast {
            requested: requested_slot,
            state_slot,
        }
        .into());
    }

    if requested_slot - state_slot > 1 {
        return Err(Error::RequestedSlotTooFarAhead {
            requested: requested_slot,
            state_slot,
        }
        .into());
    }

    process_slots(state, requested_slot)?;

    ensure!(
        state.slot == requested_slot,
        Error::StatePreparationIncomplete {
            requested: requested_slot,
            state_slot: state.slot,
        },
    );

    Ok(())
}

fn build_sidecars(
    block: &BeaconBlock,
    bundle: &execution_engine::BlobsBundle,
) -> Result<BlobSidecars> {
    let header = block.to_header();
    let mut sidecars = Vec::with_capacity(bundle.blobs.len());

    for (index, blob) in bundle.blobs.iter().enumerate() {
        let inclusion_proof = kzg_commitment_inclusion_proof(&block.body, index as u64)
            .ok_or(Error::BundleOverflow)?;

        sidecars.push(BlobSidecar {
            index: index as u64,
            blob: blob.clone(),
            kzg_commitment: *bundle
                .commitments
                .get(index)
                .ok_or(Error::BundleOverflow)?,
            kzg_proof: *bundle.proofs.get(index).ok_or(Error::BundleOverflow)?,
            beacon_block_header: header,
            inclusion_proof,
        });
    }

    BlobSidecars::new(sidecars).map_err(|_| Error::BundleOverflow.into())
}
