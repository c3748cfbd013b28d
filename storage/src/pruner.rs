use std::sync::Arc;

use dispatcher::EventSubscription;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use types::{nonstandard::FinalizedBlock, primitives::Slot};

use crate::backend::StorageBackend;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetentionConfig {
    pub blocks: u64,
    pub sidecars: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            blocks: 8192,
            sidecars: 8192,
        }
    }
}

/// Removes entries that have fallen out of the retention window.
///
/// Driven by the finalized-block event. A failed sweep is logged and
/// retried on the next event; it never blocks the hot path.
pub struct Pruner {
    backend: Arc<StorageBackend>,
    retention: RetentionConfig,
    events: EventSubscription<FinalizedBlock>,
}

impl Pruner {
    #[must_use]
    pub fn new(
        backend: Arc<StorageBackend>,
        retention: RetentionConfig,
        events: EventSubscription<FinalizedBlock>,
    ) -> Self {
        Self {
            backend,
            retention,
            events,
        }
    }

    pub async fn run(mut self) {
        while let Some(finalized) = self.events.next().await {
            self.prune_below(finalized.slot);
        }

        debug!("pruner stopping: the finalized block feed closed");
    }

    fn prune_below(&self, finalized_slot: Slot) {
        let block_cutoff = finalized_slot.saturating_sub(self.retention.blocks);
        let sidecar_cutoff = finalized_slot.saturating_sub(self.retention.sidecars);

        if let Err(error) = self.backend.block_store().prune(0, block_cutoff) {
            warn!("failed to prune blocks below {block_cutoff}: {error:#}");
        }

        if let Err(error) = self
            .backend
            .availability_store()
            .prune(0, sidecar_cutoff)
        {
            warn!("failed to prune sidecars below {sidecar_cutoff}: {error:#}");
        }

        // Applied deposits are final; everything below the state's applied
        // index is dead weight.
        match self.backend.state_store().state_from_context() {
            Ok(state) => {
                if let Err(error) = self
                    .backend
                    .deposit_store()
                    .prune(0, state.eth1_deposit_index)
                {
                    warn!(
                        "failed to prune deposits below {}: {error:#}",
                        state.eth1_deposit_index,
                    );
                }
            }
            Err(error) => warn!("pruner could not read the beacon state: {error:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use dispatcher::EventTopic;
    use types::{beacon_state::BeaconState, containers::BeaconBlock};

    use super::*;

    #[tokio::test]
    async fn finalization_triggers_pruning() {
        let backend = Arc::new(StorageBackend::in_memory());

        let mut old_block = BeaconBlock::default();
        old_block.slot = 1;
        let mut new_block = BeaconBlock::default();
        new_block.slot = 90;

        backend.block_store().set(&old_block).unwrap();
        backend.block_store().set(&new_block).unwrap();
        backend.state_store().commit(BeaconState::default());

        let topic = EventTopic::new();

        let retention = RetentionConfig {
            blocks: 10,
            sidecars: 10,
        };

        let pruner = Pruner::new(backend.clone(), retention, topic.subscribe(8));
        let handle = tokio::spawn(pruner.run());

        topic.publish(FinalizedBlock { slot: 100 }).await;
        drop(topic);

        handle.await.unwrap();

        assert_eq!(backend.block_store().get(1).unwrap(), None);
        assert!(backend.block_store().get(90).unwrap().is_some());
    }
}
