use std::sync::Arc;

use blockchain::{ChainResponders, ChainService, KzgVerifier};
use block_producer::ValidatorService;
use dispatcher::Dispatcher;
use execution_engine::{ExecutionEngine, PayloadBuilder};
use helpers::signing::LocalSigner;
use serde::{Deserialize, Serialize};
use storage::{Pruner, RetentionConfig, StorageBackend};
use tokio::task::JoinHandle;
use types::{config::Config, primitives::Address};

use crate::{
    abci::AbciMiddleware,
    gossip::NoopGossiper,
    telemetry::LogTelemetrySink,
};

#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodeConfig {
    pub moniker: String,
    pub suggested_fee_recipient: Address,
    pub optimistic_engine: bool,
    pub local_builder_enabled: bool,
    pub retention: RetentionConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            moniker: "beacon-node".to_owned(),
            suggested_fee_recipient: Address::ZERO,
            optimistic_engine: false,
            local_builder_enabled: true,
            retention: RetentionConfig::default(),
        }
    }
}

/// Everything a running node hands back to its host process.
pub struct NodeHandle<E> {
    pub middleware: AbciMiddleware<NoopGossiper, NoopGossiper, LogTelemetrySink>,
    pub backend: Arc<StorageBackend>,
    pub payload_builder: Arc<PayloadBuilder<E>>,
    pub tasks: Vec<JoinHandle<()>>,
}

/// One-shot wiring: builds the dispatcher, registers every topic's
/// responder with its service, and spawns the service tasks. After this
/// the topology is immutable until shutdown.
pub fn build_node<E, K>(
    config: Arc<Config>,
    node_config: &NodeConfig,
    engine: Arc<E>,
    kzg: K,
    signer: LocalSigner,
) -> NodeHandle<E>
where
    E: ExecutionEngine,
    K: KzgVerifier,
{
    let dispatcher = Arc::new(Dispatcher::new());
    let backend = Arc::new(StorageBackend::in_memory());

    let payload_builder = Arc::new(PayloadBuilder::new(
        config.clone(),
        engine,
        node_config.suggested_fee_recipient,
        node_config.local_builder_enabled,
    ));

    let topics = dispatcher.topics();

    let chain_responders = ChainResponders {
        genesis: topics.process_genesis_data.take_responder(),
        verify_block: topics.verify_beacon_block.take_responder(),
        verify_sidecars: topics.verify_sidecars.take_responder(),
        process_sidecars: topics.process_sidecars.take_responder(),
        finalize: topics.finalize_beacon_block.take_responder(),
    };

    let build_responder = topics.build_beacon_block_and_sidecars.take_responder();

    let chain_service = ChainService::new(
        config.clone(),
        backend.clone(),
        payload_builder.clone(),
        dispatcher.clone(),
        kzg,
        node_config.optimistic_engine,
    );

    let validator_service = ValidatorService::new(
        config,
        backend.clone(),
        payload_builder.clone(),
        signer,
        node_config.moniker.clone(),
    );

    let pruner = Pruner::new(
        backend.clone(),
        node_config.retention,
        topics.finalized_block.subscribe(16),
    );

    let middleware = AbciMiddleware::new(
        &dispatcher,
        NoopGossiper,
        NoopGossiper,
        LogTelemetrySink,
    );

    let tasks = vec![
        tokio::spawn(chain_service.run(chain_responders)),
        tokio::spawn(validator_service.run(build_responder)),
        tokio::spawn(pruner.run()),
    ];

    NodeHandle {
        middleware,
        backend,
        payload_builder,
        tasks,
    }
}
