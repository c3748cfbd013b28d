use ssz_types::typenum::{
    U1048576, U1073741824, U128, U131072, U16, U16777216, U256, U32, U4096, U6, U65536, U8192,
};

use crate::primitives::{DomainType, Epoch, Gwei, Slot};

pub const GENESIS_SLOT: Slot = 0;
pub const GENESIS_EPOCH: Epoch = 0;
pub const FAR_FUTURE_EPOCH: Epoch = u64::MAX;

pub const SLOTS_PER_EPOCH: u64 = 32;
pub const SLOTS_PER_HISTORICAL_ROOT: u64 = 8192;
pub const EPOCHS_PER_HISTORICAL_VECTOR: u64 = 65536;
pub const EPOCHS_PER_SLASHINGS_VECTOR: u64 = 8192;

pub const MAX_DEPOSITS: u64 = 16;
pub const MAX_WITHDRAWALS_PER_PAYLOAD: usize = 16;
pub const MAX_VALIDATORS_PER_WITHDRAWALS_SWEEP: u64 = 16384;
pub const MAX_BLOBS_PER_BLOCK: u64 = 6;

pub const MAX_EFFECTIVE_BALANCE: Gwei = 32_000_000_000;
pub const EFFECTIVE_BALANCE_INCREMENT: Gwei = 1_000_000_000;
pub const EJECTION_BALANCE: Gwei = 16_000_000_000;

pub const HYSTERESIS_QUOTIENT: u64 = 4;
pub const HYSTERESIS_DOWNWARD_MULTIPLIER: u64 = 1;
pub const HYSTERESIS_UPWARD_MULTIPLIER: u64 = 5;

pub const MIN_PER_EPOCH_CHURN_LIMIT: u64 = 4;
pub const CHURN_LIMIT_QUOTIENT: u64 = 65536;
pub const MAX_SEED_LOOKAHEAD: u64 = 4;
pub const MIN_VALIDATOR_WITHDRAWABILITY_DELAY: u64 = 256;

pub const MIN_SLASHING_PENALTY_QUOTIENT: u64 = 32;
pub const PROPORTIONAL_SLASHING_MULTIPLIER: u64 = 3;

pub const BLS_WITHDRAWAL_PREFIX: u8 = 0x00;
pub const ETH1_ADDRESS_WITHDRAWAL_PREFIX: u8 = 0x01;

pub const DOMAIN_BEACON_PROPOSER: DomainType = DomainType::new([0, 0, 0, 0]);
pub const DOMAIN_RANDAO: DomainType = DomainType::new([2, 0, 0, 0]);
pub const DOMAIN_DEPOSIT: DomainType = DomainType::new([3, 0, 0, 0]);

pub const VERSIONED_HASH_VERSION_KZG: u8 = 0x01;

// Typenum bounds for the SSZ collections. The u64 constants above mirror
// the ones the hot paths do arithmetic with.
pub type SlotsPerHistoricalRoot = U8192;
pub type EpochsPerHistoricalVector = U65536;
pub type EpochsPerSlashingsVector = U8192;
pub type HistoricalRootsLimit = U16777216;
pub type ValidatorRegistryLimit = U1048576;
pub type MaxAttestations = U128;
pub type MaxSlashingInfos = U16;
pub type MaxDepositsPerBlock = U16;
pub type MaxWithdrawalsPerPayload = U16;
pub type MaxBlobCommitmentsPerBlock = U4096;
pub type MaxBlobsPerBlock = U6;
pub type BytesPerBlob = U131072;
pub type BytesPerLogsBloom = U256;
pub type MaxExtraDataBytes = U32;
pub type MaxBytesPerTransaction = U1073741824;
pub type MaxTransactionsPerPayload = U1048576;
pub type KzgInclusionProofDepth = U16;
