/// Flags that let callers bypass individual checks while syncing or doing
/// speculative work. The default context sets none of them.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct ProcessingContext {
    pub skip_payload_verification: bool,
    pub skip_validate_randao: bool,
    pub skip_validate_result: bool,
    pub optimistic_engine: bool,
}

impl ProcessingContext {
    /// The context a proposer uses to compute its own state root: the
    /// root is about to be filled in, so it cannot be validated yet.
    #[must_use]
    pub fn speculative() -> Self {
        Self {
            skip_validate_result: true,
            ..Self::default()
        }
    }
}
