//! Failure kinds of a sync pass that are not plain I/O errors.

use sync_core::LogicalId;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Materializing an entity required materializing itself first.
    #[error("Circular reference: {}", render_chain(.chain))]
    CircularReference { chain: Vec<LogicalId> },

    /// A reference names an entity that is neither declared nor in the ledger.
    #[error("Reference to undeclared entity '{0}'")]
    UnknownEntity(LogicalId),
}

impl SyncError {
    /// Build a cycle error from the resolution stack and the identity that
    /// was about to be pushed onto it again.
    pub(crate) fn circular(stack: &[LogicalId], repeated: &LogicalId) -> Self {
        let start = stack.iter().position(|id| id == repeated).unwrap_or(0);
        let mut chain: Vec<LogicalId> = stack[start..].to_vec();
        chain.push(repeated.clone());
        Self::CircularReference { chain }
    }
}

fn render_chain(chain: &[LogicalId]) -> String {
    chain
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}
