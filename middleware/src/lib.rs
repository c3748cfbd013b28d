pub use crate::{
    abci::AbciMiddleware,
    encoding::{
        extract_beacon_block, extract_blob_sidecars, BEACON_BLOCK_TX_INDEX,
        BLOB_SIDECARS_TX_INDEX,
    },
    errors::Error,
    gossip::{Gossiper, NoopGossiper},
    node::{build_node, NodeConfig, NodeHandle},
    telemetry::{LogTelemetrySink, NoopTelemetrySink, TelemetrySink},
    types::{
        FinalizeBlockRequest, FinalizeBlockResponse, PrepareProposalRequest,
        PrepareProposalResponse, ProcessProposalRequest, ProcessProposalResponse,
        ProposalStatus,
    },
};

mod abci;
mod encoding;
mod errors;
mod gossip;
mod node;
mod telemetry;
mod types;
