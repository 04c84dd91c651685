//! Native platform adapter.
//!
//! Mirrors the browser adapter's semantics over a rooted `std::fs` directory:
//! entry names are validated the way the browser validates them (which also
//! keeps keys from escaping the root), and writes stage into a sibling file
//! that replaces the destination on close. Filesystem calls are plain
//! synchronous `std::fs` inside the returned futures; payloads are small
//! blobs, not streams.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};

use stowage_store::{StoreError, StoreResult};
use tracing::debug;

use crate::fs::{
    DirHandle, FileHandle, StorageCapabilities, StoragePlatform, validate_entry_name, WriteStream,
};

/// [`StoragePlatform`] over a root directory on the local filesystem.
pub struct NativeFs {
    root: PathBuf,
}

impl NativeFs {
    /// Store everything under `root`. The directory is created on first use.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl StoragePlatform for NativeFs {
    type Dir = NativeDir;

    fn secure_context(&self) -> bool {
        true
    }

    fn capabilities(&self) -> StorageCapabilities {
        StorageCapabilities {
            secure_context: true,
            storage_manager: true,
        }
    }

    fn storage_root<'a>(
        &'a self,
    ) -> impl std::future::Future<Output = StoreResult<NativeDir>> + 'a {
        async move {
            if let Err(err) = fs::create_dir_all(&self.root) {
                debug!(root = %self.root.display(), error = %err, "storage root unavailable");
                return Err(StoreError::Unavailable);
            }
            Ok(NativeDir {
                path: self.root.clone(),
            })
        }
    }
}

/// Directory handle: a validated path under the adapter root.
#[derive(Clone)]
pub struct NativeDir {
    path: PathBuf,
}

impl DirHandle for NativeDir {
    type File = NativeFile;

    fn open_dir<'a>(
        &'a self,
        name: &'a str,
    ) -> impl std::future::Future<Output = StoreResult<Option<Self>>> + 'a {
        async move {
            validate_entry_name(name)?;
            let path = self.path.join(name);
            match fs::metadata(&path) {
                Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
                Err(err) => Err(io_error(err)),
                Ok(meta) if meta.is_dir() => Ok(Some(NativeDir { path })),
                Ok(_) => Err(type_mismatch(name, "directory")),
            }
        }
    }

    fn create_dir<'a>(
        &'a self,
        name: &'a str,
    ) -> impl std::future::Future<Output = StoreResult<Self>> + 'a {
        async move {
            validate_entry_name(name)?;
            let path = self.path.join(name);
            match fs::create_dir(&path) {
                Ok(()) => Ok(NativeDir { path }),
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                    let meta = fs::metadata(&path).map_err(io_error)?;
                    if meta.is_dir() {
                        Ok(NativeDir { path })
                    } else {
                        Err(type_mismatch(name, "directory"))
                    }
                }
                Err(err) => Err(io_error(err)),
            }
        }
    }

    fn open_file<'a>(
        &'a self,
        name: &'a str,
    ) -> impl std::future::Future<Output = StoreResult<Option<NativeFile>>> + 'a {
        async move {
            validate_entry_name(name)?;
            let path = self.path.join(name);
            match fs::metadata(&path) {
                Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
                Err(err) => Err(io_error(err)),
                Ok(meta) if meta.is_file() => Ok(Some(NativeFile { path })),
                Ok(_) => Err(type_mismatch(name, "file")),
            }
        }
    }

    fn create_file<'a>(
        &'a self,
        name: &'a str,
    ) -> impl std::future::Future<Output = StoreResult<NativeFile>> + 'a {
        async move {
            validate_entry_name(name)?;
            let path = self.path.join(name);
            match fs::metadata(&path) {
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    // The browser call creates the (empty) file eagerly; match it.
                    fs::OpenOptions::new()
                        .write(true)
                        .create(true)
                        .truncate(true)
                        .open(&path)
                        .map_err(io_error)?;
                    Ok(NativeFile { path })
                }
                Err(err) => Err(io_error(err)),
                Ok(meta) if meta.is_file() => Ok(NativeFile { path }),
                Ok(_) => Err(type_mismatch(name, "file")),
            }
        }
    }

    fn remove_entry<'a>(
        &'a self,
        name: &'a str,
    ) -> impl std::future::Future<Output = StoreResult<bool>> + 'a {
        async move {
            validate_entry_name(name)?;
            let path = self.path.join(name);
            match fs::metadata(&path) {
                Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
                Err(err) => Err(io_error(err)),
                Ok(meta) => {
                    let removed = if meta.is_dir() {
                        fs::remove_dir(&path)
                    } else {
                        fs::remove_file(&path)
                    };
                    removed.map_err(io_error)?;
                    Ok(true)
                }
            }
        }
    }
}

/// File handle: a path whose existence was checked (or forced) by the parent
/// directory handle.
#[derive(Clone)]
pub struct NativeFile {
    path: PathBuf,
}

impl FileHandle for NativeFile {
    type Writer = NativeWriter;

    fn read_all<'a>(&'a self) -> impl std::future::Future<Output = StoreResult<Vec<u8>>> + 'a {
        async move { fs::read(&self.path).map_err(io_error) }
    }

    fn create_writable<'a>(
        &'a self,
    ) -> impl std::future::Future<Output = StoreResult<NativeWriter>> + 'a {
        async move {
            let staging = staging_path(&self.path)?;
            let file = fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&staging)
                .map_err(io_error)?;
            Ok(NativeWriter {
                dest: self.path.clone(),
                staging,
                file: Some(file),
            })
        }
    }
}

/// Writer staging into a sibling file; the rename on close gives the same
/// commit-on-close behavior as the browser's writable stream.
pub struct NativeWriter {
    dest: PathBuf,
    staging: PathBuf,
    file: Option<fs::File>,
}

impl WriteStream for NativeWriter {
    fn write_all<'a>(
        &'a mut self,
        bytes: &'a [u8],
    ) -> impl std::future::Future<Output = StoreResult<()>> + 'a {
        async move {
            let file = self
                .file
                .as_mut()
                .ok_or_else(|| StoreError::Backend("write to closed stream".into()))?;
            file.write_all(bytes).map_err(io_error)
        }
    }

    fn close<'a>(&'a mut self) -> impl std::future::Future<Output = StoreResult<()>> + 'a {
        async move {
            let Some(file) = self.file.take() else {
                return Ok(());
            };
            let synced = file.sync_all();
            drop(file);
            let res = synced
                .and_then(|()| fs::rename(&self.staging, &self.dest))
                .map_err(io_error);
            if res.is_err() {
                let _ = fs::remove_file(&self.staging);
            }
            res
        }
    }
}

impl Drop for NativeWriter {
    fn drop(&mut self) {
        // Abandoned stream: discard the staged bytes.
        if self.file.take().is_some() {
            let _ = fs::remove_file(&self.staging);
        }
    }
}

static STAGING_SEQ: AtomicU64 = AtomicU64::new(0);

fn staging_path(dest: &Path) -> StoreResult<PathBuf> {
    let parent = dest
        .parent()
        .ok_or_else(|| StoreError::Backend("file has no parent directory".into()))?;
    let name = dest
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| StoreError::Backend("file has no usable name".into()))?;
    let seq = STAGING_SEQ.fetch_add(1, Ordering::Relaxed);
    Ok(parent.join(format!(".{name}.stage-{}-{seq}", process::id())))
}

fn io_error(err: io::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn type_mismatch(name: &str, wanted: &str) -> StoreError {
    StoreError::Backend(format!("entry {name:?} is not a {wanted}"))
}
