use ethereum_hashing::hash_fixed;
use tree_hash::TreeHash;
use types::{
    consts::{MAX_SEED_LOOKAHEAD, SLOTS_PER_EPOCH, VERSIONED_HASH_VERSION_KZG},
    containers::{ForkData, SigningData},
    primitives::{
        Domain, DomainType, Epoch, KzgCommitment, Slot, Version, VersionedHash, B256,
    },
};

#[must_use]
pub const fn compute_epoch_at_slot(slot: Slot) -> Epoch {
    slot / SLOTS_PER_EPOCH
}

#[must_use]
pub const fn compute_start_slot_at_epoch(epoch: Epoch) -> Slot {
    epoch * SLOTS_PER_EPOCH
}

#[must_use]
pub const fn is_epoch_start(slot: Slot) -> bool {
    slot % SLOTS_PER_EPOCH == 0
}

#[must_use]
pub const fn compute_activation_exit_epoch(epoch: Epoch) -> Epoch {
    epoch + 1 + MAX_SEED_LOOKAHEAD
}

#[must_use]
pub fn compute_fork_data_root(current_version: Version, genesis_validators_root: B256) -> B256 {
    ForkData {
        current_version,
        genesis_validators_root,
    }
    .tree_hash_root()
}

#[must_use]
pub fn compute_domain(
    domain_type: DomainType,
    fork_version: Version,
    genesis_validators_root: B256,
) -> Domain {
    let fork_data_root = compute_fork_data_root(fork_version, genesis_validators_root);

    let mut domain = Domain::ZERO;
    domain[..4].copy_from_slice(domain_type.as_slice());
    domain[4..].copy_from_slice(&fork_data_root[..28]);
    domain
}

#[must_use]
pub fn compute_signing_root<T: TreeHash>(object: &T, domain: Domain) -> B256 {
    SigningData {
        object_root: object.tree_hash_root(),
        domain,
    }
    .tree_hash_root()
}

#[must_use]
pub fn kzg_commitment_to_versioned_hash(commitment: KzgCommitment) -> VersionedHash {
    let mut hash = hash_fixed(commitment.as_bytes());
    hash[0] = VERSIONED_HASH_VERSION_KZG;
    VersionedHash::from(hash)
}
