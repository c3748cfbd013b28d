use core::future::Future;

use anyhow::Result;
use ssz::Encode as _;
use types::containers::{BeaconBlock, BlobSidecars};

/// Publishes a built artifact to the network and returns the bytes that
/// went out. The P2P transport itself lives in the consensus engine;
/// implementations adapt whatever hook it exposes.
pub trait Gossiper<T>: Send + Sync {
    fn publish(&self, payload: &T) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Encodes without broadcasting. The consensus engine already carries the
/// proposal txs to every peer, so a separate broadcast is optional.
#[derive(Clone, Copy, Default)]
pub struct NoopGossiper;

impl Gossiper<BeaconBlock> for NoopGossiper {
    async fn publish(&self, payload: &BeaconBlock) -> Result<Vec<u8>> {
        Ok(payload.as_ssz_bytes())
    }
}

impl Gossiper<BlobSidecars> for NoopGossiper {
    async fn publish(&self, payload: &BlobSidecars) -> Result<Vec<u8>> {
        Ok(payload.as_ssz_bytes())
    }
}
