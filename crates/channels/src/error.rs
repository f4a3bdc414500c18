use std::error::Error as StdError;

/// Crate-wide result type for transport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed transport errors shared across the capability traits.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The channel is private, unknown, or could not be looked up.
    #[error("channel not resolvable: {handle}")]
    NotFound { handle: String },

    /// The remote side did not answer in time.
    #[error("transport timed out: {context}")]
    Timeout { context: String },

    /// The remote side answered with something other than success.
    #[error("transport rejected request: {message}")]
    Rejected { message: String },

    /// Wrapped source error from an external dependency.
    #[error("transport failed: {context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn not_found(handle: impl Into<String>) -> Self {
        Self::NotFound {
            handle: handle.into(),
        }
    }

    #[must_use]
    pub fn timeout(context: impl Into<String>) -> Self {
        Self::Timeout {
            context: context.into(),
        }
    }

    #[must_use]
    pub fn rejected(message: impl std::fmt::Display) -> Self {
        Self::Rejected {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }
}
