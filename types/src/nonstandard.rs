use crate::{
    containers::{AttestationData, BeaconBlock, BeaconBlockHeader, BlobSidecars, SlashingInfo},
    primitives::{Gwei, KzgCommitment, PublicKeyBytes, Slot, UnixSeconds},
};

/// Per-validator stake delta reported back to the consensus engine after
/// genesis and after every finalized block.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ValidatorUpdate {
    pub pubkey: PublicKeyBytes,
    pub effective_balance: Gwei,
}

pub type ValidatorUpdates = Vec<ValidatorUpdate>;

/// Everything the consensus engine hands the proposer for one slot.
#[derive(Clone, PartialEq, Debug)]
pub struct SlotData {
    pub slot: Slot,
    pub consensus_time: UnixSeconds,
    pub attestations: Vec<AttestationData>,
    pub slashings: Vec<SlashingInfo>,
}

/// A built proposal: the block and the sidecars derived from its payload.
#[derive(Clone, PartialEq, Debug)]
pub struct BeaconBlockBundle {
    pub block: BeaconBlock,
    pub sidecars: BlobSidecars,
}

/// An incoming block paired with its wire encoding, kept for the
/// re-serialization check.
#[derive(Clone, PartialEq, Debug)]
pub struct BlockProposal {
    pub block: BeaconBlock,
    pub encoded: Vec<u8>,
}

/// Sidecars of a proposal together with the already-verified block facts
/// they must be consistent with.
#[derive(Clone, PartialEq, Debug)]
pub struct SidecarsProposal {
    pub sidecars: BlobSidecars,
    pub expected_header: BeaconBlockHeader,
    pub expected_commitments: Vec<KzgCommitment>,
}

/// A decided block as delivered by the consensus engine for finalization.
#[derive(Clone, PartialEq, Debug)]
pub struct ConsensusBlock {
    pub block: BeaconBlock,
    pub consensus_time: UnixSeconds,
}

/// Published after a block is fully applied; drives the pruner.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct FinalizedBlock {
    pub slot: Slot,
}
