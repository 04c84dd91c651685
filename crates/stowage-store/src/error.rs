use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Unified error type shared by every blob-store backend.
///
/// All backends (the OPFS-backed primary, fallback stores, in-memory doubles)
/// report failures through this one enum so that callers and composing stores
/// handle a single error surface regardless of which tier actually did the
/// work.
///
/// Variants that wrap a backend detail carry a `String` rather than a
/// platform error type so wasm32 backends can surface errors originating from
/// JavaScript without dragging `JsValue` into the shared contract.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The execution context is not a secure context, so origin-private
    /// storage cannot be used at all.
    #[error("secure context required for origin-private storage")]
    SecureContextRequired,

    /// The backend's storage root could not be acquired.
    #[error("storage backend unavailable")]
    Unavailable,

    /// One segment of a key could not be resolved to a directory or file.
    #[error("cannot resolve segment {segment:?} of key {key:?}")]
    PathResolution { key: String, segment: String },

    /// Handles resolved but the byte transfer itself failed.
    #[error("transfer failed for key {key:?}: {detail}")]
    Transfer { key: String, detail: String },

    /// The origin is out of storage quota.
    #[error("storage quota exceeded")]
    QuotaExceeded,

    /// Backend failure with no more specific classification.
    #[error("backend error: {0}")]
    Backend(String),
}
