use crate::store::StoreError;

/// Errors surfaced by the engine's write boundary.
///
/// Read-side store failures never appear here; the resolvers absorb them
/// (logging at error level) and return empty results instead.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A mandatory document cannot be recorded as merely "seen"; the record
    /// was rejected before reaching storage.
    #[error("mandatory terms '{0}' require acceptance, not just having been seen")]
    MandatoryNotAccepted(String),

    /// The acceptance store failed during a write. Propagated so a lost
    /// write never looks like success.
    #[error(transparent)]
    Store(#[from] StoreError),
}
