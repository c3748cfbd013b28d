use types::{
    containers::{AttestationData, SlashingInfo},
    nonstandard::ValidatorUpdates,
    primitives::{UnixSeconds, B256},
};

/// The four consensus-engine phases, wire-shaped after the ABCI protocol.
/// Only the fields the middleware consumes are modeled.

#[derive(Clone, PartialEq, Default, Debug)]
pub struct PrepareProposalRequest {
    pub height: u64,
    pub time: UnixSeconds,
    pub max_tx_bytes: u64,
    pub local_last_commit: Vec<AttestationData>,
    pub misbehavior: Vec<SlashingInfo>,
}

#[derive(Clone, PartialEq, Default, Debug)]
pub struct PrepareProposalResponse {
    pub txs: Vec<Vec<u8>>,
}

#[derive(Clone, PartialEq, Default, Debug)]
pub struct ProcessProposalRequest {
    pub height: u64,
    pub hash: B256,
    pub proposer_address: Vec<u8>,
    pub txs: Vec<Vec<u8>>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ProposalStatus {
    Accept,
    Reject,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ProcessProposalResponse {
    pub status: ProposalStatus,
}

impl ProcessProposalResponse {
    #[must_use]
    pub const fn accept() -> Self {
        Self {
            status: ProposalStatus::Accept,
        }
    }

    #[must_use]
    pub const fn reject() -> Self {
        Self {
            status: ProposalStatus::Reject,
        }
    }
}

#[derive(Clone, PartialEq, Default, Debug)]
pub struct FinalizeBlockRequest {
    pub height: u64,
    pub time: UnixSeconds,
    pub txs: Vec<Vec<u8>>,
    pub decided_last_commit: Vec<AttestationData>,
    pub misbehavior: Vec<SlashingInfo>,
}

#[derive(Clone, PartialEq, Default, Debug)]
pub struct FinalizeBlockResponse {
    pub validator_updates: ValidatorUpdates,
}
