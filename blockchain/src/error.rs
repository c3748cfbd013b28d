use thiserror::Error;
use types::primitives::{BlobIndex, Slot, Version};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error("block bytes are not the canonical encoding of the decoded block")]
    EncodingNotCanonical,
    #[error("state fork {in_state} does not serve blocks of version {for_slot}")]
    ForkVersionMismatch { in_state: Version, for_slot: Version },
    #[error("{actual} sidecars do not cover {expected} commitments")]
    SidecarCountMismatch { expected: usize, actual: usize },
    #[error("sidecar at position {position} carries index {index}")]
    SidecarIndexMismatch { position: usize, index: BlobIndex },
    #[error("sidecar {index} embeds a header for a different block")]
    SidecarHeaderMismatch { index: BlobIndex },
    #[error("sidecar {index} does not match the block's commitment")]
    SidecarCommitmentMismatch { index: BlobIndex },
    #[error("sidecar {index} has an invalid inclusion proof")]
    SidecarInclusionProofInvalid { index: BlobIndex },
    #[error("sidecar {index} has an invalid KZG proof")]
    SidecarKzgProofInvalid { index: BlobIndex },
    #[error("blob data for slot {slot} is not available")]
    DataNotAvailable { slot: Slot },
}
