pub use crate::{
    engine::{ExecutionEngine, MockExecutionEngine, NullExecutionEngine},
    error::Error,
    payload_builder::{
        next_payload_timestamp, PayloadBuilder, FORKCHOICE_UPDATED_TIMEOUT, GET_PAYLOAD_TIMEOUT,
    },
    types::{
        BlobsBundle, ForkchoiceStateV1, ForkchoiceUpdatedResponse, GetPayloadResponse,
        PayloadAttributes, PayloadId, PayloadStatusV1, PayloadValidationStatus,
    },
};

mod engine;
mod error;
mod payload_builder;
mod types;
