use thiserror::Error;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error("no responder is serving the {topic} topic")]
    NoResponder { topic: &'static str },
    #[error("the request context was cancelled")]
    ContextCancelled,
}
