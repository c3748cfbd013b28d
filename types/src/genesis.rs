use serde::{Deserialize, Serialize};

use crate::{
    containers::{Deposit, ExecutionPayloadHeader},
    primitives::Version,
};

/// The decoded `app_state` document the consensus engine delivers at
/// `InitGenesis`.
#[derive(Clone, PartialEq, Default, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Genesis {
    pub fork_version: Version,
    pub deposits: Vec<Deposit>,
    pub execution_payload_header: ExecutionPayloadHeader,
}
