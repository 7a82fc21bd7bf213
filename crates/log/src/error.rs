/// Result alias for logger setup.
pub type LogResult<T> = Result<T, LogError>;

/// Errors raised while configuring or starting the logger.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogError {
    /// The filter directive string does not parse.
    #[error("invalid filter '{filter}': {reason}")]
    Filter {
        /// Directive string as given.
        filter: String,
        /// Parser message.
        reason: String,
    },

    /// A configuration value is out of range.
    #[error("configuration error: {0}")]
    Config(String),

    /// A global subscriber is already installed.
    #[error("logger already initialized: {0}")]
    AlreadyInitialized(String),
}

impl LogError {
    pub(crate) fn filter(filter: impl Into<String>, reason: impl ToString) -> Self {
        Self::Filter {
            filter: filter.into(),
            reason: reason.to_string(),
        }
    }
}
