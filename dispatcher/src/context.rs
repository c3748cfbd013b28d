use tokio_util::sync::CancellationToken;

/// Cancellation scope of a single request.
///
/// Cancelling abandons the reply slot: the caller observes
/// [`Error::ContextCancelled`](crate::Error::ContextCancelled) and a late
/// response is dropped on the floor.
#[derive(Clone, Default, Debug)]
pub struct Context {
    token: CancellationToken,
}

impl Context {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// A scope that is cancelled with its parent but can also be
    /// cancelled on its own.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }
}
