use thiserror::Error;
use types::primitives::DepositIndex;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error("deposit index {actual} leaves a gap behind the queue at {expected}")]
    DepositIndexGap {
        expected: DepositIndex,
        actual: DepositIndex,
    },
    #[error("deposit {index} is not in the store")]
    MissingDeposit { index: DepositIndex },
    #[error("the beacon state has not been initialized")]
    StateNotInitialized,
    #[error("stored {what} bytes failed to decode")]
    CorruptValue { what: &'static str },
}
