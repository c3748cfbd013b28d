use thiserror::Error;

use crate::types::{PayloadId, PayloadValidationStatus};

#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error("execution engine reported the payload invalid")]
    EngineInvalid,
    #[error("execution engine call {call} timed out")]
    EngineTimeout { call: &'static str },
    #[error("execution engine has not validated the payload: {status:?}")]
    EngineNotSynced { status: PayloadValidationStatus },
    #[error("execution engine does not know payload {id:?}")]
    UnknownPayload { id: PayloadId },
    #[error("execution engine refused to start a payload build")]
    PayloadBuildRefused,
}
