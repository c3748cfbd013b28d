use anyhow::{ensure, Result};
use ssz::Encode as _;
use state_transition::ProcessingContext;
use types::{beacon_state::BeaconState, config::Config, nonstandard::BlockProposal};

use crate::error::Error;

/// Full verification of an incoming proposal against the local pre-state.
///
/// The wire bytes must round-trip, the fork must be the active one, and a
/// speculative transition on a state copy enforces everything else:
/// parent root, expected proposer, RANDAO, payload expectations,
/// withdrawals, and finally the state root.
pub fn verify_beacon_block(
    config: &Config,
    context: ProcessingContext,
    state: &BeaconState,
    proposal: &BlockProposal,
) -> Result<()> {
    let block = &proposal.block;

    ensure!(
        block.as_ssz_bytes() == proposal.encoded,
        Error::EncodingNotCanonical,
    );

    let for_slot = config.active_fork_version_for_slot(block.slot);

    ensure!(
        state.fork.current_version == for_slot,
        Error::ForkVersionMismatch {
            in_state: state.fork.current_version,
            for_slot,
        },
    );

    let mut speculative = state.clone();
    state_transition::state_transition(config, context, &mut speculative, block)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use helpers::{
        accessors::{get_randao_mix, latest_block_root},
        signing::{deposit_signing_root, randao_signing_root, LocalSigner},
    };
    use state_transition::{genesis::initialize_premined_beacon_state_from_eth1, slot_processing};
    use tree_hash::TreeHash as _;
    use types::{
        consts::MAX_EFFECTIVE_BALANCE,
        containers::{
            BeaconBlock, BeaconBlockBody, Deposit, DepositMessage, ExecutionPayload,
            ExecutionPayloadHeader,
        },
        primitives::{ExecutionBlockHash, SignatureBytes, B256},
    };

    use super::*;

    fn signer() -> LocalSigner {
        LocalSigner::from_ikm(&[3; 32]).expect("key generation from a fixed seed succeeds")
    }

    fn genesis_state(config: &Config) -> BeaconState {
        let signer = signer();

        let message = DepositMessage {
            pubkey: signer.public_key(),
            withdrawal_credentials: B256::repeat_byte(5),
            amount: MAX_EFFECTIVE_BALANCE,
        };

        let deposit = Deposit {
            pubkey: message.pubkey,
            withdrawal_credentials: message.withdrawal_credentials,
            amount: message.amount,
            signature: signer.sign(deposit_signing_root(config, &message)),
            index: 0,
        };

        initialize_premined_beacon_state_from_eth1(
            config,
            &[deposit],
            &ExecutionPayloadHeader {
                block_hash: ExecutionBlockHash::repeat_byte(0xaa),
                ..ExecutionPayloadHeader::default()
            },
            config.deneb_fork_version,
        )
        .expect("the genesis deposit is valid")
    }

    fn valid_proposal(config: &Config, state: &BeaconState) -> BlockProposal {
        let mut advanced = state.clone();
        slot_processing::process_slots(&mut advanced, 1).unwrap();

        let payload = ExecutionPayload {
            parent_hash: advanced.latest_execution_payload_header.block_hash,
            prev_randao: get_randao_mix(&advanced, 0),
            timestamp: advanced.latest_execution_payload_header.timestamp + 12,
            block_hash: ExecutionBlockHash::repeat_byte(0xbb),
            block_number: 1,
            ..ExecutionPayload::default()
        };

        let mut block = BeaconBlock {
            slot: 1,
            proposer_index: 0,
            parent_root: latest_block_root(&advanced),
            state_root: B256::ZERO,
            body: BeaconBlockBody {
                randao_reveal: signer().sign(randao_signing_root(&advanced, 0)),
                eth1_data: advanced.eth1_data,
                execution_payload: payload,
                ..BeaconBlockBody::default()
            },
        };

        let mut speculative = state.clone();
        state_transition::state_transition(
            config,
            ProcessingContext::speculative(),
            &mut speculative,
            &block,
        )
        .unwrap();
        block.state_root = speculative.tree_hash_root();

        BlockProposal {
            encoded: block.as_ssz_bytes(),
            block,
        }
    }

    #[test]
    fn a_valid_proposal_verifies() {
        let config = Config::default();
        let state = genesis_state(&config);
        let proposal = valid_proposal(&config, &state);

        verify_beacon_block(
            &config,
            ProcessingContext::default(),
            &state,
            &proposal,
        )
        .unwrap();

        // Verification worked on a copy.
        assert_eq!(state.slot, 0);
    }

    #[test]
    fn a_zeroed_randao_reveal_is_fatal() {
        let config = Config::default();
        let state = genesis_state(&config);

        let mut proposal = valid_proposal(&config, &state);
        proposal.block.body.randao_reveal = SignatureBytes::default();
        proposal.encoded = proposal.block.as_ssz_bytes();

        let error = verify_beacon_block(
            &config,
            ProcessingContext::default(),
            &state,
            &proposal,
        )
        .unwrap_err();

        assert!(errors::is_fatal(&error));
        assert_eq!(
            error.downcast::<state_transition::Error>().unwrap(),
            state_transition::Error::RandaoInvalid,
        );
    }

    #[test]
    fn tampered_bytes_fail_the_round_trip() {
        let config = Config::default();
        let state = genesis_state(&config);

        let mut proposal = valid_proposal(&config, &state);
        proposal.encoded.push(0);

        let error = verify_beacon_block(
            &config,
            ProcessingContext::default(),
            &state,
            &proposal,
        )
        .unwrap_err()
        .downcast::<Error>()
        .unwrap();

        assert_eq!(error, Error::EncodingNotCanonical);
    }

    #[test]
    fn a_wrong_parent_root_is_fatal() {
        let config = Config::default();
        let state = genesis_state(&config);

        let mut proposal = valid_proposal(&config, &state);
        proposal.block.parent_root = B256::repeat_byte(1);
        proposal.encoded = proposal.block.as_ssz_bytes();

        let error = verify_beacon_block(
            &config,
            ProcessingContext::default(),
            &state,
            &proposal,
        )
        .unwrap_err()
        .downcast::<state_transition::Error>()
        .unwrap();

        assert!(matches!(
            error,
            state_transition::Error::ParentRootMismatch { .. },
        ));
    }
}
