use core::time::Duration;
use std::{collections::HashMap, sync::{Arc, Mutex}};

use anyhow::{anyhow, Result};
use errors::wrap_non_fatal;
use helpers::accessors::get_randao_mix;
use log::{debug, warn};
use state_transition::block_processing::get_expected_withdrawals;
use types::{
    beacon_state::BeaconState,
    config::Config,
    containers::ExecutionPayload,
    primitives::{
        Address, ExecutionBlockHash, Slot, UnixSeconds, VersionedHash, B256,
    },
};

use crate::{
    engine::ExecutionEngine,
    error::Error,
    types::{
        ForkchoiceStateV1, GetPayloadResponse, PayloadAttributes, PayloadId,
        PayloadValidationStatus,
    },
};

pub const FORKCHOICE_UPDATED_TIMEOUT: Duration = Duration::from_secs(5);
pub const GET_PAYLOAD_TIMEOUT: Duration = Duration::from_secs(2);

const GET_PAYLOAD_RETRY_BACKOFF: Duration = Duration::from_millis(100);

/// The timestamp the next payload must carry: strictly after both the
/// parent payload and the consensus timestamp.
#[must_use]
pub const fn next_payload_timestamp(
    parent_payload_time: UnixSeconds,
    consensus_time: UnixSeconds,
) -> UnixSeconds {
    let base = if parent_payload_time > consensus_time {
        parent_payload_time
    } else {
        consensus_time
    };

    base + 1
}

/// Owns the execution client's forkchoice view and the payload-build
/// handles. At most one `PayloadId` lives per `(slot, parent hash)` key; a
/// newer build overwrites the handle and the old build is orphaned.
pub struct PayloadBuilder<E> {
    config: Arc<Config>,
    engine: Arc<E>,
    suggested_fee_recipient: Address,
    enabled: bool,
    payload_ids: Mutex<HashMap<(Slot, ExecutionBlockHash), PayloadId>>,
}

impl<E: ExecutionEngine> PayloadBuilder<E> {
    #[must_use]
    pub fn new(
        config: Arc<Config>,
        engine: Arc<E>,
        suggested_fee_recipient: Address,
        enabled: bool,
    ) -> Self {
        Self {
            config,
            engine,
            suggested_fee_recipient,
            enabled,
            payload_ids: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn payload_id(&self, slot: Slot, parent_hash: ExecutionBlockHash) -> Option<PayloadId> {
        self.payload_ids
            .lock()
            .expect("payload id mutex is poisoned")
            .get(&(slot, parent_hash))
            .copied()
    }

    /// Asks the execution client to start building the payload for `slot`
    /// on top of `head_payload_hash`. `state` must already be advanced to
    /// `slot`. The returned handle is remembered under
    /// `(slot, head_payload_hash)`.
    pub async fn request_payload_async(
        &self,
        state: &BeaconState,
        slot: Slot,
        timestamp: UnixSeconds,
        parent_beacon_block_root: B256,
        head_payload_hash: ExecutionBlockHash,
        finalized_payload_hash: ExecutionBlockHash,
    ) -> Result<Option<PayloadId>> {
        let epoch = helpers::misc::compute_epoch_at_slot(slot);

        let attributes = PayloadAttributes {
            timestamp,
            prev_randao: get_randao_mix(state, epoch),
            suggested_fee_recipient: self.suggested_fee_recipient,
            withdrawals: get_expected_withdrawals(state)?,
            parent_beacon_block_root,
        };

        let forkchoice_state = ForkchoiceStateV1 {
            head_block_hash: head_payload_hash,
            safe_block_hash: finalized_payload_hash,
            finalized_block_hash: finalized_payload_hash,
        };

        let response = tokio::time::timeout(
            FORKCHOICE_UPDATED_TIMEOUT,
            self.engine.notify_forkchoice_updated(
                forkchoice_state,
                Some(attributes),
                self.config.phase_at_slot(slot),
            ),
        )
        .await
        .map_err(|_| {
            wrap_non_fatal(Error::EngineTimeout {
                call: "engine_forkchoiceUpdated",
            })
        })??;

        if response.payload_status.status.is_invalid() {
            return Err(anyhow!(Error::EngineInvalid));
        }

        if let Some(id) = response.payload_id {
            let replaced = self
                .payload_ids
                .lock()
                .expect("payload id mutex is poisoned")
                .insert((slot, head_payload_hash), id);

            if let Some(old) = replaced {
                debug!("payload build {old:?} for slot {slot} superseded by {id:?}");
            }
        }

        Ok(response.payload_id)
    }

    /// The payload previously requested for `(slot, parent_block_hash)`,
    /// if a build was ever started for that key.
    pub async fn retrieve_payload(
        &self,
        slot: Slot,
        parent_block_hash: ExecutionBlockHash,
    ) -> Result<Option<GetPayloadResponse>> {
        let Some(id) = self.payload_id(slot, parent_block_hash) else {
            return Ok(None);
        };

        self.get_payload(id, slot).await.map(Some)
    }

    /// `engine_getPayload` with one retry: the read is idempotent, so a
    /// transport hiccup gets a second chance before propagating.
    pub async fn get_payload(&self, id: PayloadId, slot: Slot) -> Result<GetPayloadResponse> {
        let phase = self.config.phase_at_slot(slot);

        let first_attempt =
            tokio::time::timeout(GET_PAYLOAD_TIMEOUT, self.engine.get_payload(id, phase)).await;

        match first_attempt {
            Ok(Ok(response)) => return Ok(response),
            Ok(Err(error)) => {
                warn!("engine_getPayload failed, retrying once: {error:#}");
            }
            Err(_) => {
                warn!("engine_getPayload timed out, retrying once");
            }
        }

        tokio::time::sleep(GET_PAYLOAD_RETRY_BACKOFF).await;

        tokio::time::timeout(GET_PAYLOAD_TIMEOUT, self.engine.get_payload(id, phase))
            .await
            .map_err(|_| {
                wrap_non_fatal(Error::EngineTimeout {
                    call: "engine_getPayload",
                })
            })?
    }

    /// Post-finalization forkchoice update: adopt the latest payload as
    /// head and its parent as both safe and finalized.
    pub async fn notify_forkchoice_without_attributes(
        &self,
        slot: Slot,
        head_block_hash: ExecutionBlockHash,
        parent_block_hash: ExecutionBlockHash,
    ) -> Result<()> {
        let response = tokio::time::timeout(
            FORKCHOICE_UPDATED_TIMEOUT,
            self.engine.notify_forkchoice_updated(
                ForkchoiceStateV1 {
                    head_block_hash,
                    safe_block_hash: parent_block_hash,
                    finalized_block_hash: parent_block_hash,
                },
                None,
                self.config.phase_at_slot(slot),
            ),
        )
        .await
        .map_err(|_| {
            wrap_non_fatal(Error::EngineTimeout {
                call: "engine_forkchoiceUpdated",
            })
        })??;

        if response.payload_status.status.is_invalid() {
            return Err(anyhow!(Error::EngineInvalid));
        }

        Ok(())
    }

    /// `engine_newPayload`. `INVALID` is always fatal; `SYNCING` and
    /// `ACCEPTED` are non-fatal only while the engine is allowed to be
    /// optimistic.
    pub async fn notify_new_payload(
        &self,
        slot: Slot,
        payload: &ExecutionPayload,
        versioned_hashes: Vec<VersionedHash>,
        parent_beacon_block_root: B256,
        optimistic: bool,
    ) -> Result<()> {
        let outcome = tokio::time::timeout(
            FORKCHOICE_UPDATED_TIMEOUT,
            self.engine.notify_new_payload(
                payload.clone(),
                versioned_hashes,
                parent_beacon_block_root,
                self.config.phase_at_slot(slot),
            ),
        )
        .await;

        let status = match outcome {
            Ok(result) => result?,
            Err(_) => {
                let error = Error::EngineTimeout {
                    call: "engine_newPayload",
                };

                return if optimistic {
                    Err(wrap_non_fatal(error))
                } else {
                    Err(anyhow!(error))
                };
            }
        };

        match status.status {
            PayloadValidationStatus::Valid => Ok(()),
            PayloadValidationStatus::Invalid | PayloadValidationStatus::InvalidBlockHash => {
                Err(anyhow!(Error::EngineInvalid))
            }
            PayloadValidationStatus::Syncing | PayloadValidationStatus::Accepted => {
                let error = Error::EngineNotSynced {
                    status: status.status,
                };

                if optimistic {
                    Err(wrap_non_fatal(error))
                } else {
                    Err(anyhow!(error))
                }
            }
        }
    }
}
