/// Store error type used throughout `stowage-opfs`.
///
/// Re-exported from [`stowage_store`] so callers match on a single error enum
/// no matter which backend (web, native, memory) produced the failure.
pub use stowage_store::StoreError;

/// Convenience re-export of `stowage_store::StoreResult`.
pub use stowage_store::StoreResult;
