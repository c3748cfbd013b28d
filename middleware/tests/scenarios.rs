use std::sync::Arc;

use blockchain::NoopKzgVerifier;
use dispatcher::Context;
use execution_engine::{MockExecutionEngine, PayloadValidationStatus};
use helpers::{
    accessors::get_beacon_proposer_index,
    signing::{deposit_signing_root, LocalSigner},
};
use middleware::{
    build_node, FinalizeBlockRequest, NodeConfig, NodeHandle, PrepareProposalRequest,
    ProcessProposalRequest, ProposalStatus,
};
use ssz::{Decode as _, Encode as _};
use state_transition::{
    genesis::initialize_premined_beacon_state_from_eth1, slot_processing::process_slots,
};
use tree_hash::TreeHash as _;
use types::{
    beacon_state::BeaconState,
    config::Config,
    consts::MAX_EFFECTIVE_BALANCE,
    containers::{BeaconBlock, BlobSidecars, Deposit, DepositMessage, ExecutionPayloadHeader},
    genesis::Genesis,
    primitives::{ExecutionBlockHash, SignatureBytes, B256},
};

fn signer(seed: u8) -> LocalSigner {
    LocalSigner::from_ikm(&[seed; 32]).expect("key generation from a fixed seed succeeds")
}

fn signed_deposit(config: &Config, seed: u8, index: u64) -> Deposit {
    let signer = signer(seed);

    let message = DepositMessage {
        pubkey: signer.public_key(),
        withdrawal_credentials: B256::repeat_byte(seed),
        amount: MAX_EFFECTIVE_BALANCE,
    };

    Deposit {
        pubkey: message.pubkey,
        withdrawal_credentials: message.withdrawal_credentials,
        amount: message.amount,
        signature: signer.sign(deposit_signing_root(config, &message)),
        index,
    }
}

fn genesis_document(config: &Config, validators: u8) -> Genesis {
    Genesis {
        fork_version: config.deneb_fork_version,
        deposits: (0..validators)
            .map(|index| signed_deposit(config, index + 1, u64::from(index)))
            .collect(),
        execution_payload_header: ExecutionPayloadHeader {
            block_hash: ExecutionBlockHash::repeat_byte(0xaa),
            ..ExecutionPayloadHeader::default()
        },
    }
}

fn offline_genesis_state(config: &Config, genesis: &Genesis) -> BeaconState {
    initialize_premined_beacon_state_from_eth1(
        config,
        &genesis.deposits,
        &genesis.execution_payload_header,
        genesis.fork_version,
    )
    .expect("the genesis deposits are valid")
}

/// The signer seed whose validator proposes at slot 1.
fn proposer_seed(config: &Config, genesis: &Genesis) -> u8 {
    let mut state = offline_genesis_state(config, genesis);
    process_slots(&mut state, 1).expect("one empty slot advances");

    let proposer = get_beacon_proposer_index(&state, 1).expect("validators are active");
    proposer as u8 + 1
}

async fn start_node(
    config: &Arc<Config>,
    genesis: &Genesis,
    node_config: &NodeConfig,
    seed: u8,
    engine: Arc<MockExecutionEngine>,
) -> NodeHandle<MockExecutionEngine> {
    let node = build_node(
        config.clone(),
        node_config,
        engine,
        NoopKzgVerifier,
        signer(seed),
    );

    let genesis_bytes = serde_json::to_vec(genesis).expect("the genesis document serializes");

    node.middleware
        .init_genesis(Context::new(), &genesis_bytes)
        .await
        .expect("genesis initialization succeeds");

    node
}

/// Starts the payload build the proposer retrieves in `prepare_proposal`.
async fn start_build(node: &NodeHandle<MockExecutionEngine>, slot: u64, timestamp: u64) {
    let mut state = node
        .backend
        .state_store()
        .state_from_context()
        .expect("genesis has been processed");
    process_slots(&mut state, slot).expect("one empty slot advances");

    let head = state.latest_execution_payload_header.block_hash;

    node.payload_builder
        .request_payload_async(&state, slot, timestamp, B256::ZERO, head, head)
        .await
        .expect("the mock engine starts a build");
}

fn prepare_request(height: u64, time: u64) -> PrepareProposalRequest {
    PrepareProposalRequest {
        height,
        time,
        max_tx_bytes: 1 << 22,
        local_last_commit: vec![],
        misbehavior: vec![],
    }
}

fn process_request(height: u64, txs: Vec<Vec<u8>>) -> ProcessProposalRequest {
    ProcessProposalRequest {
        height,
        hash: B256::ZERO,
        proposer_address: vec![],
        txs,
    }
}

fn finalize_request(height: u64, time: u64, txs: Vec<Vec<u8>>) -> FinalizeBlockRequest {
    FinalizeBlockRequest {
        height,
        time,
        txs,
        decided_last_commit: vec![],
        misbehavior: vec![],
    }
}

#[tokio::test]
async fn genesis_seeds_the_chain_and_reports_every_validator() {
    let config = Arc::new(Config::default());
    let genesis = genesis_document(&config, 64);

    let node = build_node(
        config.clone(),
        &NodeConfig::default(),
        Arc::new(MockExecutionEngine::new()),
        NoopKzgVerifier,
        signer(1),
    );

    let genesis_bytes = serde_json::to_vec(&genesis).unwrap();

    let updates = node
        .middleware
        .init_genesis(Context::new(), &genesis_bytes)
        .await
        .unwrap();

    assert_eq!(updates.len(), 64);
    assert!(updates
        .iter()
        .all(|update| update.effective_balance == MAX_EFFECTIVE_BALANCE));

    let state = node.backend.state_store().state_from_context().unwrap();
    assert_eq!(state.slot, 0);
    assert_eq!(state.eth1_deposit_index, 64);
}

#[tokio::test]
async fn a_proposal_is_accepted_and_finalized_identically_on_both_nodes() {
    let config = Arc::new(Config::default());
    let genesis = genesis_document(&config, 4);
    let node_config = NodeConfig {
        moniker: "node-a".to_owned(),
        ..NodeConfig::default()
    };

    let proposer = proposer_seed(&config, &genesis);

    let node_a = start_node(
        &config,
        &genesis,
        &node_config,
        proposer,
        Arc::new(MockExecutionEngine::new().with_blobs(1)),
    )
    .await;

    let node_b = start_node(
        &config,
        &genesis,
        &NodeConfig::default(),
        200,
        Arc::new(MockExecutionEngine::new()),
    )
    .await;

    start_build(&node_a, 1, 41).await;

    let proposal = node_a
        .middleware
        .prepare_proposal(Context::new(), &prepare_request(1, 40))
        .await;

    assert_eq!(proposal.txs.len(), 2);

    let block = BeaconBlock::from_ssz_bytes(&proposal.txs[0]).unwrap();
    assert_eq!(block.slot, 1);
    assert_eq!(block.body.blob_kzg_commitments.len(), 1);

    let verdict = node_b
        .middleware
        .process_proposal(Context::new(), &process_request(1, proposal.txs.clone()))
        .await;

    assert_eq!(verdict.status, ProposalStatus::Accept);

    for node in [&node_a, &node_b] {
        node.middleware
            .pre_block(finalize_request(1, 40, proposal.txs.clone()));

        let response = node
            .middleware
            .finalize_block(Context::new())
            .await
            .unwrap();

        assert!(response.validator_updates.is_empty());
    }

    let state_a = node_a.backend.state_store().state_from_context().unwrap();
    let state_b = node_b.backend.state_store().state_from_context().unwrap();

    assert_eq!(state_a.slot, 1);
    assert_eq!(state_a.tree_hash_root(), state_b.tree_hash_root());
    assert_eq!(state_a.tree_hash_root(), block.state_root);

    assert!(node_a.backend.block_store().get(1).unwrap().is_some());
    assert_eq!(node_b.backend.blob_sidecars_at_slot(1).unwrap().len(), 1);
}

#[tokio::test]
async fn a_zeroed_randao_reveal_is_rejected() {
    let config = Arc::new(Config::default());
    let genesis = genesis_document(&config, 4);

    let proposer = proposer_seed(&config, &genesis);

    let node_a = start_node(
        &config,
        &genesis,
        &NodeConfig::default(),
        proposer,
        Arc::new(MockExecutionEngine::new()),
    )
    .await;

    let node_b = start_node(
        &config,
        &genesis,
        &NodeConfig::default(),
        200,
        Arc::new(MockExecutionEngine::new()),
    )
    .await;

    start_build(&node_a, 1, 41).await;

    let proposal = node_a
        .middleware
        .prepare_proposal(Context::new(), &prepare_request(1, 40))
        .await;

    let mut block = BeaconBlock::from_ssz_bytes(&proposal.txs[0]).unwrap();
    block.body.randao_reveal = SignatureBytes::default();

    let mut txs = proposal.txs.clone();
    txs[0] = block.as_ssz_bytes();

    let verdict = node_b
        .middleware
        .process_proposal(Context::new(), &process_request(1, txs))
        .await;

    assert_eq!(verdict.status, ProposalStatus::Reject);
}

#[tokio::test]
async fn missing_sidecars_are_rejected() {
    let config = Arc::new(Config::default());
    let genesis = genesis_document(&config, 4);

    let proposer = proposer_seed(&config, &genesis);

    let node_a = start_node(
        &config,
        &genesis,
        &NodeConfig::default(),
        proposer,
        Arc::new(MockExecutionEngine::new().with_blobs(2)),
    )
    .await;

    let node_b = start_node(
        &config,
        &genesis,
        &NodeConfig::default(),
        200,
        Arc::new(MockExecutionEngine::new()),
    )
    .await;

    start_build(&node_a, 1, 41).await;

    let proposal = node_a
        .middleware
        .prepare_proposal(Context::new(), &prepare_request(1, 40))
        .await;

    let sidecars = BlobSidecars::from_ssz_bytes(&proposal.txs[1]).unwrap();
    assert_eq!(sidecars.len(), 2);

    let mut reduced = sidecars.to_vec();
    reduced.pop();

    let mut txs = proposal.txs.clone();
    txs[1] = BlobSidecars::new(reduced).unwrap().as_ssz_bytes();

    let verdict = node_b
        .middleware
        .process_proposal(Context::new(), &process_request(1, txs))
        .await;

    assert_eq!(verdict.status, ProposalStatus::Reject);
}

#[tokio::test]
async fn a_missing_payload_yields_an_empty_proposal() {
    let config = Arc::new(Config::default());
    let genesis = genesis_document(&config, 4);

    let proposer = proposer_seed(&config, &genesis);

    let node = start_node(
        &config,
        &genesis,
        &NodeConfig::default(),
        proposer,
        Arc::new(MockExecutionEngine::new()),
    )
    .await;

    // No payload build was ever requested for slot 1.
    let proposal = node
        .middleware
        .prepare_proposal(Context::new(), &prepare_request(1, 40))
        .await;

    assert!(proposal.txs.is_empty());

    // The consensus engine proceeds with the empty proposal; finalizing
    // it is a no-op.
    node.middleware
        .pre_block(finalize_request(1, 40, proposal.txs));

    let response = node
        .middleware
        .finalize_block(Context::new())
        .await
        .unwrap();

    assert!(response.validator_updates.is_empty());
    assert_eq!(
        node.backend
            .state_store()
            .state_from_context()
            .unwrap()
            .slot,
        0,
    );
}

#[tokio::test]
async fn an_unsynced_engine_rejects_unless_optimistic() {
    let config = Arc::new(Config::default());
    let genesis = genesis_document(&config, 4);

    let proposer = proposer_seed(&config, &genesis);

    let node_a = start_node(
        &config,
        &genesis,
        &NodeConfig::default(),
        proposer,
        Arc::new(MockExecutionEngine::new()),
    )
    .await;

    start_build(&node_a, 1, 41).await;

    let proposal = node_a
        .middleware
        .prepare_proposal(Context::new(), &prepare_request(1, 40))
        .await;

    let syncing_engine = || {
        Arc::new(
            MockExecutionEngine::new()
                .with_new_payload_status(PayloadValidationStatus::Syncing),
        )
    };

    let strict = start_node(&config, &genesis, &NodeConfig::default(), 201, syncing_engine())
        .await;

    let verdict = strict
        .middleware
        .process_proposal(Context::new(), &process_request(1, proposal.txs.clone()))
        .await;

    assert_eq!(verdict.status, ProposalStatus::Reject);

    let optimistic_config = NodeConfig {
        optimistic_engine: true,
        ..NodeConfig::default()
    };

    let optimistic = start_node(&config, &genesis, &optimistic_config, 202, syncing_engine())
        .await;

    let verdict = optimistic
        .middleware
        .process_proposal(Context::new(), &process_request(1, proposal.txs))
        .await;

    assert_eq!(verdict.status, ProposalStatus::Accept);
}
