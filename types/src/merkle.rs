use ethereum_hashing::hash32_concat;
use ssz_types::FixedVector;
use tree_hash::TreeHash as _;

use crate::{
    consts::KzgInclusionProofDepth,
    containers::{BeaconBlockBody, BlobSidecar},
    primitives::{BlobIndex, B256},
};

/// Position of `blob_kzg_commitments` among the body's eight fields.
pub const BLOB_KZG_COMMITMENTS_FIELD_INDEX: u64 = 7;

const BODY_TREE_DEPTH: usize = 3;
const COMMITMENT_LIST_DEPTH: usize = 12;

/// Depth of a commitment inclusion branch: the commitment list subtree,
/// its length mix-in, and the body's field tree.
pub const KZG_INCLUSION_PROOF_DEPTH: usize = COMMITMENT_LIST_DEPTH + 1 + BODY_TREE_DEPTH;

#[must_use]
pub fn hash_pair(left: B256, right: B256) -> B256 {
    B256::from(hash32_concat(left.as_slice(), right.as_slice()))
}

fn zero_hashes(depth: usize) -> Vec<B256> {
    let mut hashes = Vec::with_capacity(depth);
    let mut node = B256::ZERO;

    for _ in 0..depth {
        hashes.push(node);
        node = hash_pair(node, node);
    }

    hashes
}

fn length_chunk(length: usize) -> B256 {
    let mut chunk = B256::ZERO;
    chunk[..8].copy_from_slice(&(length as u64).to_le_bytes());
    chunk
}

/// Merkleizes `chunks` into a tree of exactly `depth` levels, virtually
/// padding with zero subtrees on the right.
#[must_use]
pub fn merkleize_chunks(chunks: &[B256], depth: usize) -> B256 {
    let zeroes = zero_hashes(depth + 1);
    let mut layer = chunks.to_vec();

    for zero in zeroes.iter().take(depth) {
        if layer.is_empty() {
            return zeroes[depth];
        }

        if layer.len() % 2 == 1 {
            layer.push(*zero);
        }

        layer = layer
            .chunks_exact(2)
            .map(|pair| hash_pair(pair[0], pair[1]))
            .collect();
    }

    layer.first().copied().unwrap_or(zeroes[depth])
}

#[must_use]
pub fn mix_in_length(root: B256, length: usize) -> B256 {
    hash_pair(root, length_chunk(length))
}

/// The sibling path for `chunks[index]` in a `depth`-level tree.
fn merkle_branch(chunks: &[B256], index: usize, depth: usize) -> Vec<B256> {
    let zeroes = zero_hashes(depth + 1);
    let mut branch = Vec::with_capacity(depth);
    let mut layer = chunks.to_vec();
    let mut position = index;

    for zero in zeroes.iter().take(depth) {
        if layer.len() % 2 == 1 {
            layer.push(*zero);
        }

        branch.push(layer.get(position ^ 1).copied().unwrap_or(*zero));

        layer = layer
            .chunks_exact(2)
            .map(|pair| hash_pair(pair[0], pair[1]))
            .collect();

        position >>= 1;
    }

    branch
}

#[must_use]
pub fn is_valid_merkle_branch(
    leaf: B256,
    branch: &[B256],
    depth: usize,
    index: u64,
    root: B256,
) -> bool {
    if branch.len() != depth {
        return false;
    }

    let mut node = leaf;

    for (height, sibling) in branch.iter().enumerate() {
        node = if index >> height & 1 == 1 {
            hash_pair(*sibling, node)
        } else {
            hash_pair(node, *sibling)
        };
    }

    node == root
}

fn body_field_roots(body: &BeaconBlockBody) -> [B256; 8] {
    [
        body.randao_reveal.tree_hash_root(),
        body.eth1_data.tree_hash_root(),
        body.graffiti.tree_hash_root(),
        body.attestations.tree_hash_root(),
        body.slashings.tree_hash_root(),
        body.deposits.tree_hash_root(),
        body.execution_payload.tree_hash_root(),
        body.blob_kzg_commitments.tree_hash_root(),
    ]
}

/// Generalized index of commitment `index` under the body root.
fn inclusion_proof_index(index: BlobIndex) -> u64 {
    index + (BLOB_KZG_COMMITMENTS_FIELD_INDEX << (COMMITMENT_LIST_DEPTH as u64 + 1))
}

/// Builds the branch proving `body.blob_kzg_commitments[index]` against the
/// body root. Returns `None` when no commitment exists at `index`.
#[must_use]
pub fn kzg_commitment_inclusion_proof(
    body: &BeaconBlockBody,
    index: BlobIndex,
) -> Option<FixedVector<B256, KzgInclusionProofDepth>> {
    let commitments = &body.blob_kzg_commitments;

    if index >= commitments.len() as u64 {
        return None;
    }

    let commitment_roots = commitments
        .iter()
        .map(|commitment| commitment.tree_hash_root())
        .collect::<Vec<_>>();

    let mut branch = merkle_branch(&commitment_roots, index as usize, COMMITMENT_LIST_DEPTH);
    branch.push(length_chunk(commitments.len()));
    branch.extend(merkle_branch(
        &body_field_roots(body),
        BLOB_KZG_COMMITMENTS_FIELD_INDEX as usize,
        BODY_TREE_DEPTH,
    ));

    let proof = FixedVector::new(branch)
        .expect("branch length equals KZG_INCLUSION_PROOF_DEPTH");

    Some(proof)
}

#[must_use]
pub fn verify_kzg_commitment_inclusion_proof(sidecar: &BlobSidecar) -> bool {
    is_valid_merkle_branch(
        sidecar.kzg_commitment.tree_hash_root(),
        &sidecar.inclusion_proof,
        KZG_INCLUSION_PROOF_DEPTH,
        inclusion_proof_index(sidecar.index),
        sidecar.beacon_block_header.body_root,
    )
}

#[cfg(test)]
mod tests {
    use ssz_types::VariableList;

    use crate::{
        containers::{BeaconBlockHeader, Blob},
        primitives::{KzgCommitment, KzgProof},
    };

    use super::*;

    fn body_with_commitments(count: usize) -> BeaconBlockBody {
        let commitments = (0..count)
            .map(|index| KzgCommitment::from([index as u8 + 1; 48]))
            .collect::<Vec<_>>();

        BeaconBlockBody {
            blob_kzg_commitments: VariableList::new(commitments)
                .expect("commitment count is below the limit"),
            ..BeaconBlockBody::default()
        }
    }

    fn sidecar_for(body: &BeaconBlockBody, index: u64) -> BlobSidecar {
        BlobSidecar {
            index,
            blob: Blob::default(),
            kzg_commitment: body.blob_kzg_commitments[index as usize],
            kzg_proof: KzgProof::default(),
            beacon_block_header: BeaconBlockHeader {
                body_root: body.tree_hash_root(),
                ..BeaconBlockHeader::default()
            },
            inclusion_proof: kzg_commitment_inclusion_proof(body, index)
                .expect("the body holds a commitment at this index"),
        }
    }

    #[test]
    fn commitment_list_merkleization_matches_tree_hash() {
        let body = body_with_commitments(3);

        let roots = body
            .blob_kzg_commitments
            .iter()
            .map(|commitment| commitment.tree_hash_root())
            .collect::<Vec<_>>();

        let computed = mix_in_length(
            merkleize_chunks(&roots, COMMITMENT_LIST_DEPTH),
            roots.len(),
        );

        assert_eq!(computed, body.blob_kzg_commitments.tree_hash_root());
    }

    #[test]
    fn body_field_merkleization_matches_tree_hash() {
        let body = body_with_commitments(2);
        let root = merkleize_chunks(&body_field_roots(&body), BODY_TREE_DEPTH);

        assert_eq!(root, body.tree_hash_root());
    }

    #[test]
    fn inclusion_proofs_verify_for_every_commitment() {
        let body = body_with_commitments(4);

        for index in 0..4 {
            let sidecar = sidecar_for(&body, index);
            assert!(verify_kzg_commitment_inclusion_proof(&sidecar));
        }
    }

    #[test]
    fn proof_fails_against_a_different_body() {
        let body = body_with_commitments(2);
        let mut sidecar = sidecar_for(&body, 1);

        sidecar.beacon_block_header.body_root = body_with_commitments(3).tree_hash_root();

        assert!(!verify_kzg_commitment_inclusion_proof(&sidecar));
    }

    #[test]
    fn proof_fails_for_a_swapped_commitment() {
        let body = body_with_commitments(2);
        let mut sidecar = sidecar_for(&body, 0);

        sidecar.kzg_commitment = body.blob_kzg_commitments[1];

        assert!(!verify_kzg_commitment_inclusion_proof(&sidecar));
    }

    #[test]
    fn no_proof_beyond_the_commitment_count() {
        let body = body_with_commitments(1);
        assert!(kzg_commitment_inclusion_proof(&body, 1).is_none());
    }
}
