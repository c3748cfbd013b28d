use std::{sync::Mutex, time::Instant};

use anyhow::Result;
use dispatcher::{Context, Dispatcher, Requester};
use errors::is_fatal;
use log::{error, warn};
use types::{
    containers::{BeaconBlock, BlobSidecars},
    genesis::Genesis,
    nonstandard::{
        BeaconBlockBundle, BlockProposal, ConsensusBlock, SidecarsProposal, SlotData,
        ValidatorUpdates,
    },
};

use crate::{
    encoding::{
        extract_beacon_block, extract_blob_sidecars, BEACON_BLOCK_TX_INDEX,
        BLOB_SIDECARS_TX_INDEX,
    },
    errors::Error,
    gossip::Gossiper,
    telemetry::TelemetrySink,
    types::{
        FinalizeBlockRequest, FinalizeBlockResponse, PrepareProposalRequest,
        PrepareProposalResponse, ProcessProposalRequest, ProcessProposalResponse,
    },
};

/// Adapts the consensus engine's four phases onto the dispatcher topics.
///
/// Holds no chain state of its own; the only mutable slot is the request
/// stashed between `pre_block` and `finalize_block`.
pub struct AbciMiddleware<BG, SG, T> {
    process_genesis_data: Requester<Genesis, ValidatorUpdates>,
    build_beacon_block_and_sidecars: Requester<SlotData, BeaconBlockBundle>,
    verify_beacon_block: Requester<BlockProposal, ()>,
    verify_sidecars: Requester<SidecarsProposal, ()>,
    process_sidecars: Requester<BlobSidecars, ()>,
    finalize_beacon_block: Requester<ConsensusBlock, ValidatorUpdates>,
    block_gossiper: BG,
    sidecar_gossiper: SG,
    telemetry: T,
    stashed: Mutex<Option<FinalizeBlockRequest>>,
}

impl<BG, SG, T> AbciMiddleware<BG, SG, T>
where
    BG: Gossiper<BeaconBlock>,
    SG: Gossiper<BlobSidecars>,
    T: TelemetrySink,
{
    #[must_use]
    pub fn new(
        dispatcher: &Dispatcher,
        block_gossiper: BG,
        sidecar_gossiper: SG,
        telemetry: T,
    ) -> Self {
        let topics = dispatcher.topics();

        Self {
            process_genesis_data: topics.process_genesis_data.requester(),
            build_beacon_block_and_sidecars: topics.build_beacon_block_and_sidecars.requester(),
            verify_beacon_block: topics.verify_beacon_block.requester(),
            verify_sidecars: topics.verify_sidecars.requester(),
            process_sidecars: topics.process_sidecars.requester(),
            finalize_beacon_block: topics.finalize_beacon_block.requester(),
            block_gossiper,
            sidecar_gossiper,
            telemetry,
            stashed: Mutex::new(None),
        }
    }

    /// Decodes the genesis document and seeds the chain. Failure is
    /// fatal: a node that cannot start from genesis cannot run.
    pub async fn init_genesis(
        &self,
        context: Context,
        app_state_bytes: &[u8],
    ) -> Result<ValidatorUpdates> {
        let genesis = serde_json::from_slice::<Genesis>(app_state_bytes).map_err(|error| {
            error!("failed to decode the genesis document: {error}");
            error
        })?;

        self.process_genesis_data.request(context, genesis).await
    }

    /// Builds and gossips this node's proposal. A failed build yields an
    /// empty proposal, never a partial one and never a crash.
    pub async fn prepare_proposal(
        &self,
        context: Context,
        request: &PrepareProposalRequest,
    ) -> PrepareProposalResponse {
        let start = Instant::now();

        let slot_data = SlotData {
            slot: request.height,
            consensus_time: request.time,
            attestations: request.local_last_commit.clone(),
            slashings: request.misbehavior.clone(),
        };

        let outcome = self.build_and_gossip(context, slot_data).await;
        self.telemetry.measure_since("prepare_proposal", start);

        match outcome {
            Ok(txs) => PrepareProposalResponse { txs },
            Err(error) => {
                warn!("proposing an empty block: {error:#}");
                PrepareProposalResponse { txs: vec![] }
            }
        }
    }

    async fn build_and_gossip(
        &self,
        context: Context,
        slot_data: SlotData,
    ) -> Result<Vec<Vec<u8>>> {
        let bundle = self
            .build_beacon_block_and_sidecars
            .request(context, slot_data)
            .await?;

        let block_bytes = self.block_gossiper.publish(&bundle.block).await?;
        let sidecar_bytes = self.sidecar_gossiper.publish(&bundle.sidecars).await?;

        Ok(vec![block_bytes, sidecar_bytes])
    }

    /// Verifies an incoming proposal: the block strictly before its
    /// sidecars. Non-fatal trouble accepts with a warning; anything
    /// fatal rejects.
    pub async fn process_proposal(
        &self,
        context: Context,
        request: &ProcessProposalRequest,
    ) -> ProcessProposalResponse {
        let start = Instant::now();
        let outcome = self.verify_proposal(context, request).await;
        self.telemetry.measure_since("process_proposal", start);

        match outcome {
            Ok(()) => ProcessProposalResponse::accept(),
            Err(error) if !is_fatal(&error) => {
                warn!("accepting a proposal despite: {error:#}");
                ProcessProposalResponse::accept()
            }
            Err(error) => {
                error!("rejecting a proposal: {error:#}");
                ProcessProposalResponse::reject()
            }
        }
    }

    async fn verify_proposal(
        &self,
        context: Context,
        request: &ProcessProposalRequest,
    ) -> Result<()> {
        let block = extract_beacon_block(&request.txs, BEACON_BLOCK_TX_INDEX)?;
        let encoded = request.txs[BEACON_BLOCK_TX_INDEX].clone();

        self.verify_beacon_block
            .request(
                context.clone(),
                BlockProposal {
                    block: block.clone(),
                    encoded,
                },
            )
            .await?;

        let sidecars = extract_blob_sidecars(&request.txs, BLOB_SIDECARS_TX_INDEX)?;

        let proposal = SidecarsProposal {
            sidecars,
            expected_header: block.to_header(),
            expected_commitments: block.body.blob_kzg_commitments.iter().copied().collect(),
        };

        self.verify_sidecars.request(context, proposal).await
    }

    /// Stashes the decided block until `finalize_block` consumes it.
    pub fn pre_block(&self, request: FinalizeBlockRequest) {
        *self.stashed.lock().expect("middleware mutex is poisoned") = Some(request);
    }

    /// Persists the sidecars, then applies the block. Either failure is
    /// fatal and must halt the consensus engine.
    pub async fn finalize_block(&self, context: Context) -> Result<FinalizeBlockResponse> {
        let start = Instant::now();

        let request = self
            .stashed
            .lock()
            .expect("middleware mutex is poisoned")
            .take()
            .ok_or(Error::NilRequest)?;

        // A request without a block finalizes nothing. The engine can
        // decide empty blocks; those change no state here.
        let Ok(block) = extract_beacon_block(&request.txs, BEACON_BLOCK_TX_INDEX) else {
            self.telemetry.measure_since("finalize_block", start);
            return Ok(FinalizeBlockResponse::default());
        };

        let sidecars =
            extract_blob_sidecars(&request.txs, BLOB_SIDECARS_TX_INDEX).unwrap_or_default();

        self.process_sidecars
            .request(context.clone(), sidecars)
            .await?;

        let validator_updates = self
            .finalize_beacon_block
            .request(
                context,
                ConsensusBlock {
                    block,
                    consensus_time: request.time,
                },
            )
            .await?;

        self.telemetry.measure_since("finalize_block", start);

        Ok(FinalizeBlockResponse { validator_updates })
    }
}
