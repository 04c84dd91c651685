//! Capability traits between [`OpfsStore`](crate::OpfsStore) and a host
//! filesystem.
//!
//! The store only ever talks to these four traits, so everything
//! platform-specific (browser handle types, `std::fs`, the in-memory fake)
//! stays inside one adapter module per host. The traits are used generically,
//! never as trait objects, and spell their futures out as `impl Future + 'a`;
//! none of them carry a `Send` bound because every handle lives on a
//! single-threaded event loop.
//!
//! Error conventions shared by all adapters:
//!
//! - `open_*` methods report a clean "no such entry" as `Ok(None)`. Every
//!   other outcome, including an entry of the wrong kind under that name, is
//!   an `Err`.
//! - `create_*` methods are create-if-absent and never disturb sibling
//!   entries; an entry of the wrong kind blocking the name is an `Err`.
//! - Adapters never invent [`StoreError::PathResolution`]; they only know a
//!   single entry name, so key-level classification is left to the store.

use stowage_store::{StoreError, StoreResult};

/// Snapshot of what the host environment offers for origin-private storage.
///
/// Purely diagnostic: the store's own availability probe is
/// [`crate::OpfsStore`]'s `is_available`, which actually exercises root
/// acquisition rather than reading flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageCapabilities {
    /// Whether the execution context is a secure context.
    pub secure_context: bool,
    /// Whether a storage manager (`navigator.storage` or an equivalent) is
    /// reachable at all.
    pub storage_manager: bool,
}

/// Entry point to one host's storage: context checks plus root acquisition.
pub trait StoragePlatform {
    type Dir: DirHandle;

    /// Whether the host considers this execution context secure. Origin-private
    /// storage is only reachable from secure contexts, so the store fails fast
    /// on `false` without touching the platform further.
    fn secure_context(&self) -> bool;

    /// Diagnostic capability snapshot for this host.
    fn capabilities(&self) -> StorageCapabilities;

    /// Acquire a handle to the storage root directory.
    ///
    /// Called lazily and rarely; the store caches the returned handle for the
    /// lifetime of the instance and only retries after a failure.
    fn storage_root<'a>(
        &'a self,
    ) -> impl std::future::Future<Output = StoreResult<Self::Dir>> + 'a;
}

/// Directory handle. Cheap reference to a directory, cloned freely while
/// walking key segments.
pub trait DirHandle: Clone {
    type File: FileHandle;

    /// Resolve an existing child directory, `Ok(None)` when there is none.
    fn open_dir<'a>(
        &'a self,
        name: &'a str,
    ) -> impl std::future::Future<Output = StoreResult<Option<Self>>> + 'a;

    /// Resolve a child directory, creating it when absent.
    fn create_dir<'a>(
        &'a self,
        name: &'a str,
    ) -> impl std::future::Future<Output = StoreResult<Self>> + 'a;

    /// Resolve an existing child file, `Ok(None)` when there is none.
    fn open_file<'a>(
        &'a self,
        name: &'a str,
    ) -> impl std::future::Future<Output = StoreResult<Option<Self::File>>> + 'a;

    /// Resolve a child file, creating it empty when absent.
    fn create_file<'a>(
        &'a self,
        name: &'a str,
    ) -> impl std::future::Future<Output = StoreResult<Self::File>> + 'a;

    /// Remove the named child entry. Returns `false` when there was nothing
    /// to remove. Removing a non-empty directory is an error, as it is in the
    /// browser API.
    fn remove_entry<'a>(
        &'a self,
        name: &'a str,
    ) -> impl std::future::Future<Output = StoreResult<bool>> + 'a;
}

/// File handle.
pub trait FileHandle {
    type Writer: WriteStream;

    /// Materialize the full file content.
    fn read_all<'a>(&'a self) -> impl std::future::Future<Output = StoreResult<Vec<u8>>> + 'a;

    /// Open a write stream over this file.
    fn create_writable<'a>(
        &'a self,
    ) -> impl std::future::Future<Output = StoreResult<Self::Writer>> + 'a;
}

/// Write stream with commit-on-close semantics: staged bytes replace the file
/// content only when [`WriteStream::close`] succeeds, matching how browser
/// writable streams behave. An unclosed stream leaves the previous content in
/// place.
pub trait WriteStream {
    fn write_all<'a>(
        &'a mut self,
        bytes: &'a [u8],
    ) -> impl std::future::Future<Output = StoreResult<()>> + 'a;

    /// Commit the staged bytes. Closing an already-closed stream is a no-op.
    fn close<'a>(&'a mut self) -> impl std::future::Future<Output = StoreResult<()>> + 'a;
}

/// Shared entry-name check for adapters that enforce names themselves (the
/// browser rejects these natively). Rules follow the platform API: no empty
/// names, no `.`/`..`, no separators.
pub(crate) fn validate_entry_name(name: &str) -> StoreResult<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') || name.contains('\\') {
        return Err(StoreError::Backend(format!("invalid entry name: {name:?}")));
    }
    Ok(())
}
