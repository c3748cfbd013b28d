use thiserror::Error;
use types::primitives::Slot;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error("this node's key is not in the validator registry")]
    NotProposer,
    #[error("no payload has been built for the requested slot")]
    NilPayload,
    #[error("requested slot {requested} is in the past, state is at {state_slot}")]
    RequestedSlotInPast { requested: Slot, state_slot: Slot },
    #[error("requested slot {requested} is too far ahead, state is at {state_slot}")]
    RequestedSlotTooFarAhead { requested: Slot, state_slot: Slot },
    #[error("state ended at slot {state_slot} instead of the requested {requested}")]
    StatePreparationIncomplete { requested: Slot, state_slot: Slot },
    #[error("the built block does not fit its body bounds")]
    BundleOverflow,
}
