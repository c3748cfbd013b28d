use anyhow::{Context as _, ensure, Result};
use types::{merkle::verify_kzg_commitment_inclusion_proof, nonstandard::SidecarsProposal};

use crate::{error::Error, kzg::KzgVerifier};

/// Checks a proposal's sidecars against the already-verified block facts.
///
/// Every sidecar must sit at its position, embed the block's header,
/// carry the block's commitment for that position, prove inclusion
/// against the body root, and pass the KZG proof check.
pub fn verify_sidecars(proposal: &SidecarsProposal, kzg: &impl KzgVerifier) -> Result<()> {
    let SidecarsProposal {
        sidecars,
        expected_header,
        expected_commitments,
    } = proposal;

    ensure!(
        sidecars.len() == expected_commitments.len(),
        Error::SidecarCountMismatch {
            expected: expected_commitments.len(),
            actual: sidecars.len(),
        },
    );

    for (position, sidecar) in sidecars.iter().enumerate() {
        let index = sidecar.index;

        ensure!(
            index == position as u64,
            Error::SidecarIndexMismatch { position, index },
        );

        ensure!(
            sidecar.beacon_block_header == *expected_header,
            Error::SidecarHeaderMismatch { index },
        );

        ensure!(
            sidecar.kzg_commitment == expected_commitments[position],
            Error::SidecarCommitmentMismatch { index },
        );

        ensure!(
            verify_kzg_commitment_inclusion_proof(sidecar),
            Error::SidecarInclusionProofInvalid { index },
        );

        kzg.verify_blob_proof(&sidecar.blob, sidecar.kzg_commitment, sidecar.kzg_proof)
            .with_context(|| Error::SidecarKzgProofInvalid { index })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use ssz_types::VariableList;
    use tree_hash::TreeHash as _;
    use types::{
        containers::{BeaconBlock, BeaconBlockBody, Blob, BlobSidecar, BlobSidecars},
        merkle::kzg_commitment_inclusion_proof,
        primitives::{KzgCommitment, KzgProof},
    };

    use crate::kzg::{NoopKzgVerifier, RejectingKzgVerifier};

    use super::*;

    fn block_with_commitments(count: usize) -> BeaconBlock {
        let commitments = (0..count)
            .map(|index| KzgCommitment::from([index as u8 + 1; 48]))
            .collect::<Vec<_>>();

        BeaconBlock {
            slot: 4,
            body: BeaconBlockBody {
                blob_kzg_commitments: VariableList::new(commitments)
                    .expect("commitment count is below the limit"),
                ..BeaconBlockBody::default()
            },
            ..BeaconBlock::default()
        }
    }

    fn proposal_for(block: &BeaconBlock) -> SidecarsProposal {
        let header = block.to_header();

        let sidecars = block
            .body
            .blob_kzg_commitments
            .iter()
            .enumerate()
            .map(|(index, commitment)| BlobSidecar {
                index: index as u64,
                blob: Blob::default(),
                kzg_commitment: *commitment,
                kzg_proof: KzgProof::default(),
                beacon_block_header: header,
                inclusion_proof: kzg_commitment_inclusion_proof(&block.body, index as u64)
                    .expect("the body holds a commitment at this index"),
            })
            .collect::<Vec<_>>();

        SidecarsProposal {
            sidecars: BlobSidecars::new(sidecars).expect("the sidecars fit the blob limit"),
            expected_header: header,
            expected_commitments: block.body.blob_kzg_commitments.iter().copied().collect(),
        }
    }

    #[test]
    fn consistent_sidecars_verify() {
        let block = block_with_commitments(2);
        verify_sidecars(&proposal_for(&block), &NoopKzgVerifier).unwrap();
    }

    #[test]
    fn a_missing_sidecar_is_fatal() {
        let block = block_with_commitments(2);
        let mut proposal = proposal_for(&block);

        let mut reduced = proposal.sidecars.to_vec();
        reduced.pop();
        proposal.sidecars = BlobSidecars::new(reduced).unwrap();

        let error = verify_sidecars(&proposal, &NoopKzgVerifier)
            .unwrap_err()
            .downcast::<Error>()
            .unwrap();

        assert_eq!(
            error,
            Error::SidecarCountMismatch {
                expected: 2,
                actual: 1,
            },
        );
    }

    #[test]
    fn a_swapped_commitment_is_fatal() {
        let block = block_with_commitments(2);
        let mut proposal = proposal_for(&block);

        let mut sidecars = proposal.sidecars.to_vec();
        sidecars[0].kzg_commitment = sidecars[1].kzg_commitment;
        proposal.sidecars = BlobSidecars::new(sidecars).unwrap();

        let error = verify_sidecars(&proposal, &NoopKzgVerifier)
            .unwrap_err()
            .downcast::<Error>()
            .unwrap();

        assert_eq!(error, Error::SidecarCommitmentMismatch { index: 0 });
    }

    #[test]
    fn a_header_for_another_block_is_fatal() {
        let block = block_with_commitments(1);
        let mut proposal = proposal_for(&block);

        let mut sidecars = proposal.sidecars.to_vec();
        sidecars[0].beacon_block_header.slot += 1;
        proposal.sidecars = BlobSidecars::new(sidecars).unwrap();

        let error = verify_sidecars(&proposal, &NoopKzgVerifier)
            .unwrap_err()
            .downcast::<Error>()
            .unwrap();

        assert_eq!(error, Error::SidecarHeaderMismatch { index: 0 });
    }

    #[test]
    fn a_broken_inclusion_proof_is_fatal() {
        let other_body_root = block_with_commitments(3).body.tree_hash_root();

        let block = block_with_commitments(1);
        let mut proposal = proposal_for(&block);

        proposal.expected_header.body_root = other_body_root;

        let mut sidecars = proposal.sidecars.to_vec();
        sidecars[0].beacon_block_header.body_root = other_body_root;
        proposal.sidecars = BlobSidecars::new(sidecars).unwrap();

        let error = verify_sidecars(&proposal, &NoopKzgVerifier)
            .unwrap_err()
            .downcast::<Error>()
            .unwrap();

        assert_eq!(error, Error::SidecarInclusionProofInvalid { index: 0 });
    }

    #[test]
    fn the_kzg_verdict_is_respected() {
        let block = block_with_commitments(1);
        let mut proposal = proposal_for(&block);

        // The rejecting verifier accepts only the zero proof.
        verify_sidecars(&proposal, &RejectingKzgVerifier).unwrap();

        let mut sidecars = proposal.sidecars.to_vec();
        sidecars[0].kzg_proof = KzgProof::from([9; 48]);
        proposal.sidecars = BlobSidecars::new(sidecars).unwrap();

        verify_sidecars(&proposal, &RejectingKzgVerifier).unwrap_err();
    }
}
