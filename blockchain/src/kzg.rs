use anyhow::{ensure, Result};
use thiserror::Error;
use types::{
    containers::Blob,
    primitives::{KzgCommitment, KzgProof},
};

/// The KZG proof check behind sidecar verification.
///
/// The cryptographic backend is plugged in through this trait; everything
/// in this crate only needs a verdict.
pub trait KzgVerifier: Send + Sync + 'static {
    fn verify_blob_proof(
        &self,
        blob: &Blob,
        commitment: KzgCommitment,
        proof: KzgProof,
    ) -> Result<()>;
}

#[derive(Debug, Error)]
#[error("blob proof does not verify against the commitment")]
pub struct BlobProofError;

/// Trusts every proof. Stands in wherever a real backend is injected,
/// and in tests that exercise everything around the pairing check.
#[derive(Clone, Copy, Default)]
pub struct NoopKzgVerifier;

impl KzgVerifier for NoopKzgVerifier {
    fn verify_blob_proof(
        &self,
        _blob: &Blob,
        _commitment: KzgCommitment,
        _proof: KzgProof,
    ) -> Result<()> {
        Ok(())
    }
}

/// Rejects every proof that is not the zero proof. For failure-path tests.
#[derive(Clone, Copy, Default)]
pub struct RejectingKzgVerifier;

impl KzgVerifier for RejectingKzgVerifier {
    fn verify_blob_proof(
        &self,
        _blob: &Blob,
        _commitment: KzgCommitment,
        proof: KzgProof,
    ) -> Result<()> {
        ensure!(proof.is_zero(), BlobProofError);
        Ok(())
    }
}
