//! In-memory platform adapter.
//!
//! A directory tree of `Rc`-shared maps with the same entry-name rules and
//! commit-on-close write semantics as the browser adapter. Besides serving as
//! an ephemeral backend, it carries failure-injection knobs so tests can
//! drive every error path of the store without a browser.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use stowage_store::{StoreError, StoreResult};

use crate::fs::{
    DirHandle, FileHandle, StorageCapabilities, StoragePlatform, validate_entry_name, WriteStream,
};

/// In-memory [`StoragePlatform`]. Clones share the same tree and knobs.
#[derive(Clone)]
pub struct MemoryFs {
    state: Rc<FsState>,
}

struct FsState {
    root: MemoryDir,
    secure_context: Cell<bool>,
    root_available: Cell<bool>,
    fail_io: Rc<Cell<bool>>,
}

impl MemoryFs {
    pub fn new() -> Self {
        let fail_io = Rc::new(Cell::new(false));
        Self {
            state: Rc::new(FsState {
                root: MemoryDir::new(Rc::clone(&fail_io)),
                secure_context: Cell::new(true),
                root_available: Cell::new(true),
                fail_io,
            }),
        }
    }

    /// Report an insecure execution context from now on.
    pub fn set_secure_context(&self, secure: bool) {
        self.state.secure_context.set(secure);
    }

    /// Make fresh root acquisition fail. Handles already given out keep
    /// working, which matches how a cached browser root handle behaves.
    pub fn set_root_available(&self, available: bool) {
        self.state.root_available.set(available);
    }

    /// Make reads, stream writes, closes and removals fail with an injected
    /// I/O error until cleared.
    pub fn set_fail_io(&self, fail: bool) {
        self.state.fail_io.set(fail);
    }
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl StoragePlatform for MemoryFs {
    type Dir = MemoryDir;

    fn secure_context(&self) -> bool {
        self.state.secure_context.get()
    }

    fn capabilities(&self) -> StorageCapabilities {
        StorageCapabilities {
            secure_context: self.state.secure_context.get(),
            storage_manager: self.state.root_available.get(),
        }
    }

    fn storage_root<'a>(
        &'a self,
    ) -> impl std::future::Future<Output = StoreResult<MemoryDir>> + 'a {
        async move {
            if !self.state.root_available.get() {
                return Err(StoreError::Unavailable);
            }
            Ok(self.state.root.clone())
        }
    }
}

/// Directory node, a shared map of child entries.
#[derive(Clone)]
pub struct MemoryDir {
    entries: Rc<RefCell<HashMap<String, MemoryEntry>>>,
    fail_io: Rc<Cell<bool>>,
}

enum MemoryEntry {
    Dir(MemoryDir),
    File(MemoryFile),
}

impl MemoryDir {
    fn new(fail_io: Rc<Cell<bool>>) -> Self {
        Self {
            entries: Rc::new(RefCell::new(HashMap::new())),
            fail_io,
        }
    }

    fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl DirHandle for MemoryDir {
    type File = MemoryFile;

    fn open_dir<'a>(
        &'a self,
        name: &'a str,
    ) -> impl std::future::Future<Output = StoreResult<Option<Self>>> + 'a {
        async move {
            validate_entry_name(name)?;
            match self.entries.borrow().get(name) {
                None => Ok(None),
                Some(MemoryEntry::Dir(dir)) => Ok(Some(dir.clone())),
                Some(MemoryEntry::File(_)) => Err(type_mismatch(name, "directory")),
            }
        }
    }

    fn create_dir<'a>(
        &'a self,
        name: &'a str,
    ) -> impl std::future::Future<Output = StoreResult<Self>> + 'a {
        async move {
            validate_entry_name(name)?;
            let mut entries = self.entries.borrow_mut();
            match entries.get(name) {
                Some(MemoryEntry::Dir(dir)) => Ok(dir.clone()),
                Some(MemoryEntry::File(_)) => Err(type_mismatch(name, "directory")),
                None => {
                    let dir = MemoryDir::new(Rc::clone(&self.fail_io));
                    entries.insert(name.to_owned(), MemoryEntry::Dir(dir.clone()));
                    Ok(dir)
                }
            }
        }
    }

    fn open_file<'a>(
        &'a self,
        name: &'a str,
    ) -> impl std::future::Future<Output = StoreResult<Option<MemoryFile>>> + 'a {
        async move {
            validate_entry_name(name)?;
            match self.entries.borrow().get(name) {
                None => Ok(None),
                Some(MemoryEntry::File(file)) => Ok(Some(file.clone())),
                Some(MemoryEntry::Dir(_)) => Err(type_mismatch(name, "file")),
            }
        }
    }

    fn create_file<'a>(
        &'a self,
        name: &'a str,
    ) -> impl std::future::Future<Output = StoreResult<MemoryFile>> + 'a {
        async move {
            validate_entry_name(name)?;
            let mut entries = self.entries.borrow_mut();
            match entries.get(name) {
                Some(MemoryEntry::File(file)) => Ok(file.clone()),
                Some(MemoryEntry::Dir(_)) => Err(type_mismatch(name, "file")),
                None => {
                    let file = MemoryFile::new(Rc::clone(&self.fail_io));
                    entries.insert(name.to_owned(), MemoryEntry::File(file.clone()));
                    Ok(file)
                }
            }
        }
    }

    fn remove_entry<'a>(
        &'a self,
        name: &'a str,
    ) -> impl std::future::Future<Output = StoreResult<bool>> + 'a {
        async move {
            validate_entry_name(name)?;
            if self.fail_io.get() {
                return Err(injected_failure());
            }
            let mut entries = self.entries.borrow_mut();
            match entries.get(name) {
                None => Ok(false),
                Some(MemoryEntry::Dir(dir)) if !dir.is_empty() => Err(StoreError::Backend(
                    format!("directory {name:?} is not empty"),
                )),
                Some(_) => {
                    entries.remove(name);
                    Ok(true)
                }
            }
        }
    }
}

/// File node; the content cell is shared with every open handle and writer.
#[derive(Clone)]
pub struct MemoryFile {
    contents: Rc<RefCell<Vec<u8>>>,
    fail_io: Rc<Cell<bool>>,
}

impl MemoryFile {
    fn new(fail_io: Rc<Cell<bool>>) -> Self {
        Self {
            contents: Rc::new(RefCell::new(Vec::new())),
            fail_io,
        }
    }
}

impl FileHandle for MemoryFile {
    type Writer = MemoryWriter;

    fn read_all<'a>(&'a self) -> impl std::future::Future<Output = StoreResult<Vec<u8>>> + 'a {
        async move {
            if self.fail_io.get() {
                return Err(injected_failure());
            }
            Ok(self.contents.borrow().clone())
        }
    }

    fn create_writable<'a>(
        &'a self,
    ) -> impl std::future::Future<Output = StoreResult<MemoryWriter>> + 'a {
        async move {
            Ok(MemoryWriter {
                target: Rc::clone(&self.contents),
                staged: Vec::new(),
                closed: false,
                fail_io: Rc::clone(&self.fail_io),
            })
        }
    }
}

/// Staging writer: bytes land in a private buffer and replace the file
/// content wholesale on close, so concurrent writers race by last close.
pub struct MemoryWriter {
    target: Rc<RefCell<Vec<u8>>>,
    staged: Vec<u8>,
    closed: bool,
    fail_io: Rc<Cell<bool>>,
}

impl WriteStream for MemoryWriter {
    fn write_all<'a>(
        &'a mut self,
        bytes: &'a [u8],
    ) -> impl std::future::Future<Output = StoreResult<()>> + 'a {
        async move {
            if self.closed {
                return Err(StoreError::Backend("write to closed stream".into()));
            }
            if self.fail_io.get() {
                return Err(injected_failure());
            }
            self.staged.extend_from_slice(bytes);
            Ok(())
        }
    }

    fn close<'a>(&'a mut self) -> impl std::future::Future<Output = StoreResult<()>> + 'a {
        async move {
            if self.closed {
                return Ok(());
            }
            self.closed = true;
            if self.fail_io.get() {
                return Err(injected_failure());
            }
            *self.target.borrow_mut() = std::mem::take(&mut self.staged);
            Ok(())
        }
    }
}

fn type_mismatch(name: &str, wanted: &str) -> StoreError {
    StoreError::Backend(format!("entry {name:?} is not a {wanted}"))
}

fn injected_failure() -> StoreError {
    StoreError::Backend("injected i/o failure".into())
}
