//! The in-process bus between the ABCI middleware and the services.
//!
//! Topics form a compile-time registry: one struct field per topic, each
//! with a fixed request/response pair. The dispatcher is built once at
//! startup, responders are taken during wiring, and the handle is shared
//! from then on.

mod context;
mod error;
mod event;
mod topic;

use std::sync::Mutex;

use types::{
    containers::BlobSidecars,
    genesis::Genesis,
    nonstandard::{
        BeaconBlockBundle, BlockProposal, ConsensusBlock, FinalizedBlock, SidecarsProposal,
        SlotData, ValidatorUpdates,
    },
};

pub use crate::{
    context::Context,
    error::Error,
    event::{EventSubscription, EventTopic},
    topic::{Request, Requester, Responder},
};

pub struct Topic<Req, Res> {
    requester: Requester<Req, Res>,
    responder: Mutex<Option<Responder<Req, Res>>>,
}

impl<Req, Res> Topic<Req, Res> {
    fn new(name: &'static str) -> Self {
        let (requester, responder) = topic::channel(name);

        Self {
            requester,
            responder: Mutex::new(Some(responder)),
        }
    }

    #[must_use]
    pub fn requester(&self) -> Requester<Req, Res> {
        self.requester.clone()
    }

    /// Claims the unique responder. Claiming a topic twice is a wiring
    /// bug, not a runtime condition, so it panics.
    #[must_use]
    pub fn take_responder(&self) -> Responder<Req, Res> {
        self.responder
            .lock()
            .expect("topic mutex is poisoned")
            .take()
            .expect("a topic responder can only be taken once")
    }
}

#[derive(Default)]
pub struct Dispatcher {
    topics: Topics,
}

pub struct Topics {
    pub process_genesis_data: Topic<Genesis, ValidatorUpdates>,
    pub build_beacon_block_and_sidecars: Topic<SlotData, BeaconBlockBundle>,
    pub verify_beacon_block: Topic<BlockProposal, ()>,
    pub verify_sidecars: Topic<SidecarsProposal, ()>,
    pub process_sidecars: Topic<BlobSidecars, ()>,
    pub finalize_beacon_block: Topic<ConsensusBlock, ValidatorUpdates>,
    pub finalized_block: EventTopic<FinalizedBlock>,
}

impl Default for Topics {
    fn default() -> Self {
        Self {
            process_genesis_data: Topic::new("ProcessGenesisData"),
            build_beacon_block_and_sidecars: Topic::new("BuildBeaconBlockAndSidecars"),
            verify_beacon_block: Topic::new("VerifyBeaconBlock"),
            verify_sidecars: Topic::new("VerifySidecars"),
            process_sidecars: Topic::new("ProcessSidecars"),
            finalize_beacon_block: Topic::new("FinalizeBeaconBlock"),
            finalized_block: EventTopic::new(),
        }
    }
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn topics(&self) -> &Topics {
        &self.topics
    }
}
