#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Errors surfaced by tree parsing and the red-black repair solver.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The wire representation of a tree could not be interpreted.
    #[error("Tree could not be parsed from JSON: {0}")]
    InvalidFormat(String),
    /// A repair task was requested on a tree that satisfies every red-black
    /// property.
    #[error(
        "No red-black property violation found; the provided tree is already valid and does not \
         need to be repaired."
    )]
    NoViolationFound,
}

impl TreeError {
    /// Convenience constructor for [`TreeError::InvalidFormat`].
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidFormat(message.into())
    }
}
