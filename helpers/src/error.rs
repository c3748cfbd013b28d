use thiserror::Error;
use types::primitives::{Slot, ValidatorIndex};

use crate::signing::SignatureKind;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error("validator index out of bounds: {index}")]
    ValidatorIndexOutOfBounds { index: ValidatorIndex },
    #[error("balance overflowed while being increased")]
    BalanceOverflow,
    #[error("epoch overflowed")]
    EpochOverflow,
    #[error("slot {slot} is not in the recent history of a state at slot {state_slot}")]
    SlotOutOfRange { slot: Slot, state_slot: Slot },
    #[error("no active validators")]
    NoActiveValidators,
    #[error("proposer sampling did not terminate")]
    UnableToSelectProposer,
    #[error("secret key material is unusable")]
    InvalidSecretKey,
    #[error("{kind} public key is not a valid point")]
    InvalidPublicKey { kind: SignatureKind },
    #[error("{kind} signature is malformed")]
    MalformedSignature { kind: SignatureKind },
    #[error("{kind} signature does not verify")]
    SignatureInvalid { kind: SignatureKind },
}
