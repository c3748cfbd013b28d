pub use crate::{block_producer::ValidatorService, error::Error, misc::graffiti_from_moniker};

mod block_producer;
mod error;
mod misc;
