//! Registry error types.

/// Errors from registry and route-table mutations.
///
/// Dispatch itself never returns these: every path through
/// `execute_action` resolves to an `ActionResult`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// No controller is registered for the page.
    #[error("page not found: {page_id}")]
    PageNotFound {
        /// The page id that was looked up.
        page_id: String,
    },

    /// A route pattern could not be parsed.
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidRoute {
        /// The offending pattern.
        pattern: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}
