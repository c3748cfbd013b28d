use execution_engine::{next_payload_timestamp, ExecutionEngine, PayloadBuilder};
use log::error;
use state_transition::slot_processing::process_slots;
use tree_hash::TreeHash as _;
use types::{beacon_state::BeaconState, nonstandard::ConsensusBlock};

/// Sends the post-finalization forkchoice update.
///
/// With a local builder, the update carries payload attributes for the
/// next slot so the build starts immediately; otherwise only the head
/// moves. Failures are logged, never surfaced: forkchoice catches up on
/// the next block either way.
pub async fn send_post_block_fcu<E: ExecutionEngine>(
    payload_builder: &PayloadBuilder<E>,
    state: &BeaconState,
    consensus_block: &ConsensusBlock,
) {
    let block = &consensus_block.block;
    let latest_header = &state.latest_execution_payload_header;

    if payload_builder.enabled() {
        let mut next_state = state.clone();

        if let Err(error) = process_slots(&mut next_state, block.slot + 1) {
            error!("failed to advance the state for payload attributes: {error:#}");
            return;
        }

        let timestamp =
            next_payload_timestamp(latest_header.timestamp, consensus_block.consensus_time);

        if let Err(error) = payload_builder
            .request_payload_async(
                &next_state,
                block.slot + 1,
                timestamp,
                block.tree_hash_root(),
                latest_header.block_hash,
                latest_header.parent_hash,
            )
            .await
        {
            error!("failed to send forkchoice update with attributes: {error:#}");
        }
    } else if let Err(error) = payload_builder
        .notify_forkchoice_without_attributes(
            block.slot,
            latest_header.block_hash,
            latest_header.parent_hash,
        )
        .await
    {
        error!("failed to send forkchoice update without attributes: {error:#}");
    }
}
