pub use crate::{
    error::Error,
    kzg::{KzgVerifier, NoopKzgVerifier, RejectingKzgVerifier},
    service::{ChainResponders, ChainService},
    sidecars::verify_sidecars,
    verification::verify_beacon_block,
};

mod error;
mod execution;
mod kzg;
mod service;
mod sidecars;
mod verification;
