use std::cell::RefCell;

use async_trait::async_trait;
use stowage_store::{BlobStore, StoreError, StoreResult};
use tracing::{debug, warn};

use crate::fs::{DirHandle, FileHandle, StorageCapabilities, StoragePlatform, WriteStream};

/// [`BlobStore`] over an origin-private filesystem, generic over the
/// [`StoragePlatform`] that provides the actual directory and file handles.
///
/// Keys are slash-delimited: `"drawings/a/b"` resolves the directories
/// `drawings` then `a` under the storage root and the file `b` inside them.
/// Directory levels are created as needed on write and never removed; a key
/// without a `/` names a file directly under the root.
///
/// The root directory handle is acquired lazily on first use and cached for
/// the lifetime of the instance. Acquisition failures clear the cache, so the
/// next operation retries from scratch and the store self-heals when the
/// platform comes back. A cached handle is reused without re-checking the
/// platform; availability degradation after a successful acquisition
/// surfaces as per-operation errors instead.
pub struct OpfsStore<P: StoragePlatform> {
    platform: P,
    root: RefCell<Option<P::Dir>>,
}

impl<P: StoragePlatform> OpfsStore<P> {
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            root: RefCell::new(None),
        }
    }

    /// The platform adapter this store runs on.
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Diagnostic capability snapshot from the underlying platform.
    pub fn capabilities(&self) -> StorageCapabilities {
        self.platform.capabilities()
    }

    /// Non-swallowing form of [`BlobStore::read`]: `Ok(None)` is a clean
    /// miss, `Err` is the failure detail that `read` masks as absence.
    pub async fn try_read(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let root = self.ensure_root().await?;
        let (folders, file_name) = split_key(key);
        let mut dir = root;
        for segment in folders {
            match dir.open_dir(segment).await? {
                Some(next) => dir = next,
                None => return Ok(None),
            }
        }
        match dir.open_file(file_name).await? {
            Some(file) => Ok(Some(file.read_all().await?)),
            None => Ok(None),
        }
    }

    /// Non-swallowing form of [`BlobStore::delete`]. Deleting a key whose
    /// directory levels or file never existed is still `Ok`.
    pub async fn try_delete(&self, key: &str) -> StoreResult<()> {
        let root = self.ensure_root().await?;
        let (folders, file_name) = split_key(key);
        let mut dir = root;
        for segment in folders {
            match dir.open_dir(segment).await? {
                Some(next) => dir = next,
                None => return Ok(()),
            }
        }
        dir.remove_entry(file_name).await?;
        Ok(())
    }

    /// Return the cached root handle, acquiring it on first use.
    ///
    /// Failures leave the cache empty so the next call retries.
    async fn ensure_root(&self) -> StoreResult<P::Dir> {
        if let Some(root) = self.root.borrow().clone() {
            return Ok(root);
        }
        if !self.platform.secure_context() {
            return Err(StoreError::SecureContextRequired);
        }
        match self.platform.storage_root().await {
            Ok(root) => {
                *self.root.borrow_mut() = Some(root.clone());
                Ok(root)
            }
            Err(err) => {
                self.root.borrow_mut().take();
                Err(err)
            }
        }
    }
}

#[async_trait(?Send)]
impl<P: StoragePlatform> BlobStore for OpfsStore<P> {
    async fn is_available(&self) -> bool {
        match self.ensure_root().await {
            Ok(_) => true,
            Err(err) => {
                debug!(error = %err, "origin-private storage unavailable");
                false
            }
        }
    }

    async fn write(&self, key: &str, bytes: &[u8]) -> StoreResult<()> {
        let root = self.ensure_root().await?;
        let (folders, file_name) = split_key(key);
        let mut dir = root;
        for segment in folders {
            dir = dir
                .create_dir(segment)
                .await
                .map_err(|err| resolution_error(key, segment, err))?;
        }
        let file = dir
            .create_file(file_name)
            .await
            .map_err(|err| resolution_error(key, file_name, err))?;
        let mut writer = file
            .create_writable()
            .await
            .map_err(|err| transfer_error(key, err))?;
        // Close runs even when the transfer failed, so a platform lock on the
        // file is never leaked. The write error takes precedence.
        let write_res = writer.write_all(bytes).await;
        let close_res = writer.close().await;
        write_res
            .and(close_res)
            .map_err(|err| transfer_error(key, err))
    }

    async fn read(&self, key: &str) -> Option<Vec<u8>> {
        match self.try_read(key).await {
            Ok(found) => found,
            Err(err) => {
                warn!(key, error = %err, "read failed, reporting the key as absent");
                None
            }
        }
    }

    async fn delete(&self, key: &str) {
        if let Err(err) = self.try_delete(key).await {
            warn!(key, error = %err, "delete failed, swallowed");
        }
    }
}

/// Split a key into directory segments and the final file name. `split`
/// yields at least one element for any input, including the empty string.
fn split_key(key: &str) -> (Vec<&str>, &str) {
    let mut segments: Vec<&str> = key.split('/').collect();
    let file_name = segments.pop().unwrap_or(key);
    (segments, file_name)
}

/// Classify a failed directory/file resolution step for `write`, where it
/// must propagate with key context. Quota pressure keeps its own variant.
fn resolution_error(key: &str, segment: &str, err: StoreError) -> StoreError {
    match err {
        StoreError::QuotaExceeded => StoreError::QuotaExceeded,
        other => {
            debug!(key, segment, error = %other, "segment did not resolve");
            StoreError::PathResolution {
                key: key.to_owned(),
                segment: segment.to_owned(),
            }
        }
    }
}

/// Classify a failed stream operation for `write`.
fn transfer_error(key: &str, err: StoreError) -> StoreError {
    match err {
        StoreError::QuotaExceeded => StoreError::QuotaExceeded,
        StoreError::Backend(detail) => StoreError::Transfer {
            key: key.to_owned(),
            detail,
        },
        other => StoreError::Transfer {
            key: key.to_owned(),
            detail: other.to_string(),
        },
    }
}
