//! Error types for DOM access.

use thiserror::Error;

/// Failures raised by a [`crate::dom::Dom`] implementation.
///
/// None of these escape the filter: classification treats them as "no match"
/// and the Reels heuristics skip the strategy that hit one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    /// The selector could not be parsed or is not supported by the host.
    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// The node handle does not refer to a node of this document.
    #[error("node does not belong to this document")]
    NoSuchNode,
}
