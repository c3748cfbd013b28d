pub mod availability_store;
pub mod backend;
pub mod block_store;
pub mod db;
pub mod deposit_store;
pub mod error;
pub mod pruner;
pub mod state_store;

pub use crate::{
    availability_store::AvailabilityStore,
    backend::{BlockRewards, StorageBackend},
    block_store::BlockStore,
    db::Database,
    deposit_store::DepositStore,
    error::Error,
    pruner::{Pruner, RetentionConfig},
    state_store::StateStore,
};
