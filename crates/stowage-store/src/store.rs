use async_trait::async_trait;

use crate::error::StoreResult;

/// Capability contract implemented by every blob-store backend.
///
/// A store persists opaque byte payloads under hierarchical string keys such
/// as `"drawings/a7f3"` or `"snapshots/2024/boot"`. `/` separates segments;
/// every segment except the last names a folder level and the final segment
/// names the blob itself. Keys are otherwise opaque at this layer: no
/// normalization, no `.`/`..` handling, no validation. Whether a given key is
/// acceptable is decided by the backing platform when the operation runs.
///
/// The asymmetric error discipline is part of the contract:
///
/// - [`BlobStore::write`] is the only operation that reports failure, because
///   silently dropping a payload would break the caller's durability
///   expectation.
/// - [`BlobStore::read`] maps every failure to `None`. "No data under this
///   key" deliberately covers both absence and unreadable state.
/// - [`BlobStore::delete`] is an idempotent no-op for missing keys and
///   swallows failures.
/// - [`BlobStore::is_available`] never fails and is re-derived per call;
///   availability is time-varying (permissions, quota and platform support
///   can change under a running app).
///
/// Futures returned by this trait are `!Send`: the deployment target is the
/// single-threaded browser event loop, where storage handles are not `Send`
/// and a work-stealing runtime is never in play.
#[async_trait(?Send)]
pub trait BlobStore {
    /// Report whether the backend can currently serve operations.
    ///
    /// May acquire and cache backend resources (such as a storage-root
    /// handle) as a side effect, so a `true` answer usually means later
    /// operations start from a warm state.
    async fn is_available(&self) -> bool;

    /// Persist `bytes` under `key`, replacing any previous payload.
    ///
    /// Callers must not assume a failed write left the previous payload
    /// intact; partial replacement is backend-specific.
    async fn write(&self, key: &str, bytes: &[u8]) -> StoreResult<()>;

    /// Fetch the payload stored under `key`, or `None` when the backend has
    /// no data to give for it.
    async fn read(&self, key: &str) -> Option<Vec<u8>>;

    /// Remove the payload stored under `key`, if any.
    async fn delete(&self, key: &str);
}
