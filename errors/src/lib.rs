use core::fmt::Display;

use thiserror::Error;

/// Marker for errors the consensus engine may tolerate.
///
/// Every error is fatal unless it is wrapped in this type somewhere in its
/// chain. Fatal errors reject proposals and halt finalization; non-fatal
/// ones are logged and the proposal is accepted.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct NonFatal(#[source] anyhow::Error);

impl NonFatal {
    #[must_use]
    pub fn new(error: anyhow::Error) -> Self {
        Self(error)
    }

    #[must_use]
    pub fn into_inner(self) -> anyhow::Error {
        self.0
    }
}

pub fn wrap_non_fatal(error: impl Into<anyhow::Error>) -> anyhow::Error {
    anyhow::Error::new(NonFatal(error.into()))
}

pub fn non_fatal(message: impl Display) -> anyhow::Error {
    anyhow::Error::new(NonFatal(anyhow::Error::msg(message.to_string())))
}

#[must_use]
pub fn is_fatal(error: &anyhow::Error) -> bool {
    !error.chain().any(|cause| cause.is::<NonFatal>())
}
