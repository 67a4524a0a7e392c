//! Error taxonomy of the attack core.

/// Everything that can go wrong between parsing inputs and printing a key.
///
/// `NoKeyFound` is an informational outcome, not a bug: the candidate table
/// was too small (or the observations too few) for the true key's prefix to
/// survive pruning. The remedy is a larger `-t` or more nonces.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no key found; retry with a larger candidate table or more observations")]
    NoKeyFound,

    #[error("resource exhausted: {0}")]
    Resource(String),
}

impl Error {
    pub(crate) fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    pub(crate) fn resource(msg: impl Into<String>) -> Self {
        Error::Resource(msg.into())
    }
}
