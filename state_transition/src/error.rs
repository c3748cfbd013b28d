use thiserror::Error;
use types::primitives::{
    DepositIndex, Epoch, ExecutionBlockHash, Gwei, Slot, UnixSeconds, ValidatorIndex, B256,
};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error("slots cannot be rewound: state is at {state_slot}, target is {target}")]
    SlotsCannotRewind { state_slot: Slot, target: Slot },
    #[error("block slot {block_slot} does not match state slot {state_slot}")]
    SlotMismatch { state_slot: Slot, block_slot: Slot },
    #[error("block at slot {block_slot} is not newer than the latest header at {header_slot}")]
    BlockIsNotNewer { header_slot: Slot, block_slot: Slot },
    #[error("proposer {in_block} does not match the expected proposer {computed}")]
    ProposerMismatch {
        computed: ValidatorIndex,
        in_block: ValidatorIndex,
    },
    #[error("proposer {index} is slashed")]
    ProposerSlashed { index: ValidatorIndex },
    #[error("parent root {in_block} does not match the latest block header {computed}")]
    ParentRootMismatch { computed: B256, in_block: B256 },
    #[error("state root {in_block} does not match the post-transition state {computed}")]
    StateRootMismatch { computed: B256, in_block: B256 },
    #[error("RANDAO reveal does not verify")]
    RandaoInvalid,
    #[error("eth1 deposit count {in_block} is behind the applied deposit index {applied}")]
    Eth1DepositCountRegressed {
        applied: DepositIndex,
        in_block: u64,
    },
    #[error("block carries {in_block} deposits, expected {expected}")]
    DepositCountMismatch { expected: u64, in_block: u64 },
    #[error("deposit index {actual} leaves a gap behind the queue at {expected}")]
    DepositIndexGap {
        expected: DepositIndex,
        actual: DepositIndex,
    },
    #[error("attestation for slot {attestation_slot} is not before state slot {state_slot}")]
    AttestationFromFuture {
        attestation_slot: Slot,
        state_slot: Slot,
    },
    #[error("validator {index} is not slashable at epoch {epoch}")]
    ValidatorNotSlashable { index: ValidatorIndex, epoch: Epoch },
    #[error("payload parent hash {in_block} does not extend the latest payload {computed}")]
    PayloadParentHashMismatch {
        computed: ExecutionBlockHash,
        in_block: ExecutionBlockHash,
    },
    #[error("payload prev_randao {in_block} does not match the epoch mix {computed}")]
    PayloadPrevRandaoMismatch { computed: B256, in_block: B256 },
    #[error("payload timestamp {in_block} does not advance past {parent}")]
    PayloadTimestampNotIncreasing {
        parent: UnixSeconds,
        in_block: UnixSeconds,
    },
    #[error("payload carries {in_block} withdrawals, expected {computed}")]
    WithdrawalCountMismatch { computed: usize, in_block: usize },
    #[error("withdrawal at position {position} does not match the expected sweep")]
    WithdrawalMismatch { position: usize },
    #[error("withdrawal index overflowed")]
    WithdrawalIndexOverflow,
    #[error("blob commitments are not allowed before deneb")]
    CommitmentsBeforeDeneb,
    #[error("block carries {in_block} blob commitments, the maximum is {maximum}")]
    TooManyCommitments { maximum: u64, in_block: u64 },
    #[error("validator registry is full")]
    RegistryFull,
    #[error("historical roots are full")]
    HistoricalRootsFull,
    #[error("genesis requires at least one deposit with {required} gwei effective balance")]
    NoGenesisValidators { required: Gwei },
}
