use core::future::Future;
use std::{collections::HashMap, sync::Mutex};

use anyhow::Result;
use ssz_types::VariableList;
use tree_hash::TreeHash as _;
use types::{
    config::Phase,
    containers::{Blob, ExecutionPayload},
    primitives::{ExecutionBlockHash, KzgCommitment, KzgProof, VersionedHash, B256, U256},
};

use crate::{
    error::Error,
    types::{
        BlobsBundle, ForkchoiceStateV1, ForkchoiceUpdatedResponse, GetPayloadResponse,
        PayloadAttributes, PayloadId, PayloadStatusV1, PayloadValidationStatus,
    },
};

/// The Engine API subset this node drives. The JSON-RPC transport behind
/// it is out of scope; implementations adapt a real client, a mock, or
/// nothing at all. `phase` selects the method version (V2 before Deneb,
/// V3 from it).
pub trait ExecutionEngine: Send + Sync + 'static {
    /// `engine_newPayloadVN`
    fn notify_new_payload(
        &self,
        payload: ExecutionPayload,
        versioned_hashes: Vec<VersionedHash>,
        parent_beacon_block_root: B256,
        phase: Phase,
    ) -> impl Future<Output = Result<PayloadStatusV1>> + Send;

    /// `engine_forkchoiceUpdatedVN`
    fn notify_forkchoice_updated(
        &self,
        forkchoice_state: ForkchoiceStateV1,
        payload_attributes: Option<PayloadAttributes>,
        phase: Phase,
    ) -> impl Future<Output = Result<ForkchoiceUpdatedResponse>> + Send;

    /// `engine_getPayloadVN`
    fn get_payload(
        &self,
        payload_id: PayloadId,
        phase: Phase,
    ) -> impl Future<Output = Result<GetPayloadResponse>> + Send;
}

/// An engine that is never there. Reports `SYNCING` for everything and
/// starts no builds.
#[derive(Clone, Copy, Default)]
pub struct NullExecutionEngine;

impl ExecutionEngine for NullExecutionEngine {
    async fn notify_new_payload(
        &self,
        _payload: ExecutionPayload,
        _versioned_hashes: Vec<VersionedHash>,
        _parent_beacon_block_root: B256,
        _phase: Phase,
    ) -> Result<PayloadStatusV1> {
        Ok(syncing_status())
    }

    async fn notify_forkchoice_updated(
        &self,
        _forkchoice_state: ForkchoiceStateV1,
        _payload_attributes: Option<PayloadAttributes>,
        _phase: Phase,
    ) -> Result<ForkchoiceUpdatedResponse> {
        Ok(ForkchoiceUpdatedResponse {
            payload_status: syncing_status(),
            payload_id: None,
        })
    }

    async fn get_payload(
        &self,
        payload_id: PayloadId,
        _phase: Phase,
    ) -> Result<GetPayloadResponse> {
        Err(Error::UnknownPayload { id: payload_id }.into())
    }
}

fn syncing_status() -> PayloadStatusV1 {
    PayloadStatusV1 {
        status: PayloadValidationStatus::Syncing,
        latest_valid_hash: None,
        validation_error: None,
    }
}

struct PendingBuild {
    parent_hash: ExecutionBlockHash,
    block_number: u64,
    attributes: PayloadAttributes,
}

#[derive(Default)]
struct MockState {
    next_payload_id: u64,
    next_block_number: u64,
    builds: HashMap<PayloadId, PendingBuild>,
    forkchoice_history: Vec<ForkchoiceStateV1>,
    notified_payloads: Vec<ExecutionBlockHash>,
}

/// A deterministic in-process execution client for tests.
///
/// Forkchoice updates with attributes start a "build"; `get_payload`
/// assembles a payload whose fields follow the attributes, so blocks
/// built against it verify end to end.
pub struct MockExecutionEngine {
    state: Mutex<MockState>,
    new_payload_status: PayloadValidationStatus,
    blobs_per_payload: usize,
}

impl Default for MockExecutionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExecutionEngine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::default(),
            new_payload_status: PayloadValidationStatus::Valid,
            blobs_per_payload: 0,
        }
    }

    #[must_use]
    pub fn with_new_payload_status(mut self, status: PayloadValidationStatus) -> Self {
        self.new_payload_status = status;
        self
    }

    #[must_use]
    pub fn with_blobs(mut self, count: usize) -> Self {
        self.blobs_per_payload = count;
        self
    }

    #[must_use]
    pub fn forkchoice_history(&self) -> Vec<ForkchoiceStateV1> {
        self.lock().forkchoice_history.clone()
    }

    #[must_use]
    pub fn notified_payloads(&self) -> Vec<ExecutionBlockHash> {
        self.lock().notified_payloads.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().expect("mock engine mutex is poisoned")
    }
}

impl ExecutionEngine for MockExecutionEngine {
    async fn notify_new_payload(
        &self,
        payload: ExecutionPayload,
        _versioned_hashes: Vec<VersionedHash>,
        _parent_beacon_block_root: B256,
        _phase: Phase,
    ) -> Result<PayloadStatusV1> {
        let mut state = self.lock();
        state.notified_payloads.push(payload.block_hash);

        Ok(PayloadStatusV1 {
            status: self.new_payload_status,
            latest_valid_hash: self
                .new_payload_status
                .is_valid()
                .then_some(payload.block_hash),
            validation_error: None,
        })
    }

    async fn notify_forkchoice_updated(
        &self,
        forkchoice_state: ForkchoiceStateV1,
        payload_attributes: Option<PayloadAttributes>,
        _phase: Phase,
    ) -> Result<ForkchoiceUpdatedResponse> {
        let mut state = self.lock();
        state.forkchoice_history.push(forkchoice_state);

        let payload_id = payload_attributes.map(|attributes| {
            state.next_payload_id += 1;
            state.next_block_number += 1;

            let id = PayloadId(state.next_payload_id.to_be_bytes());
            let block_number = state.next_block_number;

            state.builds.insert(
                id,
                PendingBuild {
                    parent_hash: forkchoice_state.head_block_hash,
                    block_number,
                    attributes,
                },
            );

            id
        });

        Ok(ForkchoiceUpdatedResponse {
            payload_status: PayloadStatusV1 {
                status: PayloadValidationStatus::Valid,
                latest_valid_hash: Some(forkchoice_state.head_block_hash),
                validation_error: None,
            },
            payload_id,
        })
    }

    async fn get_payload(
        &self,
        payload_id: PayloadId,
        _phase: Phase,
    ) -> Result<GetPayloadResponse> {
        let state = self.lock();

        let build = state
            .builds
            .get(&payload_id)
            .ok_or(Error::UnknownPayload { id: payload_id })?;

        let bundle = deterministic_blobs_bundle(self.blobs_per_payload, build.block_number);

        let mut payload = ExecutionPayload {
            parent_hash: build.parent_hash,
            fee_recipient: build.attributes.suggested_fee_recipient,
            prev_randao: build.attributes.prev_randao,
            block_number: build.block_number,
            timestamp: build.attributes.timestamp,
            withdrawals: VariableList::new(build.attributes.withdrawals.clone())
                .map_err(|_| Error::PayloadBuildRefused)?,
            blob_gas_used: 0,
            excess_blob_gas: 0,
            ..ExecutionPayload::default()
        };

        payload.block_hash = ExecutionBlockHash::from(payload.tree_hash_root().0);

        Ok(GetPayloadResponse {
            execution_payload: payload,
            block_value: U256::from(1),
            blobs_bundle: bundle,
        })
    }
}

fn deterministic_blobs_bundle(count: usize, block_number: u64) -> BlobsBundle {
    let mut bundle = BlobsBundle::default();

    for index in 0..count {
        let tag = block_number as u8 ^ index as u8;

        bundle
            .blobs
            .push(Blob::new(vec![tag; 131_072]).expect("the blob length is exact"));
        bundle.commitments.push(KzgCommitment::from([tag | 0x40; 48]));
        bundle.proofs.push(KzgProof::from([tag | 0x80; 48]));
    }

    bundle
}
