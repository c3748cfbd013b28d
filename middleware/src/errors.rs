use thiserror::Error;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error("finalize was called without a stashed request")]
    NilRequest,
    #[error("the request carries no beacon block")]
    NoBlockInRequest,
    #[error("tx index {index} is out of bounds for {len} txs")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("the beacon block bytes do not decode")]
    InvalidBlockBytes,
    #[error("the blob sidecar bytes do not decode")]
    InvalidSidecarBytes,
}
