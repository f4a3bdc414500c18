use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The store failed; the current pass or flush was abandoned.
    #[error(transparent)]
    Store(#[from] herald_store::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
