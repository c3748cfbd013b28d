use core::fmt;

use blst::{
    min_pk::{PublicKey, SecretKey, Signature},
    BLST_ERROR,
};
use types::{
    beacon_state::BeaconState,
    config::Config,
    consts::{DOMAIN_DEPOSIT, DOMAIN_RANDAO, GENESIS_SLOT},
    containers::DepositMessage,
    primitives::{Epoch, PublicKeyBytes, SignatureBytes, B256},
};

use crate::{
    error::Error,
    misc::{compute_domain, compute_signing_root},
};

const DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SignatureKind {
    Randao,
    Deposit,
}

impl fmt::Display for SignatureKind {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Randao => formatter.write_str("RANDAO reveal"),
            Self::Deposit => formatter.write_str("deposit"),
        }
    }
}

/// The node's proposer keypair.
pub struct LocalSigner {
    secret_key: SecretKey,
    public_key: PublicKeyBytes,
}

impl LocalSigner {
    pub fn from_ikm(ikm: &[u8; 32]) -> Result<Self, Error> {
        let secret_key = SecretKey::key_gen(ikm, &[]).map_err(|_| Error::InvalidSecretKey)?;

        let public_key = PublicKeyBytes::from(secret_key.sk_to_pk().compress());

        Ok(Self {
            secret_key,
            public_key,
        })
    }

    #[must_use]
    pub const fn public_key(&self) -> PublicKeyBytes {
        self.public_key
    }

    #[must_use]
    pub fn sign(&self, signing_root: B256) -> SignatureBytes {
        SignatureBytes::from(
            self.secret_key
                .sign(signing_root.as_slice(), DST, &[])
                .compress(),
        )
    }
}

pub fn verify_signature(
    pubkey: PublicKeyBytes,
    signing_root: B256,
    signature: SignatureBytes,
    kind: SignatureKind,
) -> Result<(), Error> {
    let public_key = PublicKey::key_validate(pubkey.as_bytes())
        .map_err(|_| Error::InvalidPublicKey { kind })?;

    let signature = Signature::from_bytes(signature.as_bytes())
        .map_err(|_| Error::MalformedSignature { kind })?;

    let result = signature.verify(true, signing_root.as_slice(), DST, &[], &public_key, false);

    if result == BLST_ERROR::BLST_SUCCESS {
        Ok(())
    } else {
        Err(Error::SignatureInvalid { kind })
    }
}

/// Signing root of the RANDAO reveal for `epoch`.
#[must_use]
pub fn randao_signing_root(state: &BeaconState, epoch: Epoch) -> B256 {
    let domain = compute_domain(
        DOMAIN_RANDAO,
        state.fork.current_version,
        state.genesis_validators_root,
    );

    compute_signing_root(&epoch, domain)
}

/// Deposit signatures commit to the genesis fork version and an empty
/// validators root, so they stay valid across forks.
#[must_use]
pub fn deposit_signing_root(config: &Config, message: &DepositMessage) -> B256 {
    let domain = compute_domain(
        DOMAIN_DEPOSIT,
        config.active_fork_version_for_slot(GENESIS_SLOT),
        B256::ZERO,
    );

    compute_signing_root(message, domain)
}
