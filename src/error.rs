/// Errors raised while building, running or training a text classifier
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// An invalid size or parameter supplied at setup time
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An invariant the pipeline relies on was violated
    #[error("internal error: {0}")]
    Internal(String),

    /// A non-finite value showed up during training
    #[error("non-finite {quantity} ({value}) at epoch {epoch}, batch {batch}")]
    Numeric {
        /// The epoch in progress, starting at 1
        epoch: usize,

        /// The index of the offending batch within the epoch
        batch: usize,

        /// What went non-finite (e.g. "loss")
        quantity: &'static str,

        /// The offending value
        value: f64,
    },
}

impl Error {
    /// Shorthand for a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Shorthand for an internal invariant violation
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

/// Result alias for fallible pipeline operations
pub type Result<T> = std::result::Result<T, Error>;
