//! Browser platform adapter over the origin-private filesystem.
//!
//! Thin bindings from the capability traits onto `navigator.storage` and the
//! `FileSystem*Handle` types. Promise rejections arrive as `JsValue`s; the
//! only names this layer discriminates are `"NotFoundError"` (a clean miss on
//! the `open_*`/`remove_entry` forms) and `"QuotaExceededError"` (its own
//! error variant). Everything else is carried as backend detail text.

use js_sys::{Reflect, Uint8Array};
use stowage_store::{StoreError, StoreResult};
use tracing::debug;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    DomException, FileSystemDirectoryHandle, FileSystemFileHandle, FileSystemGetDirectoryOptions,
    FileSystemGetFileOptions, FileSystemWritableFileStream, StorageManager, Window,
    WorkerGlobalScope,
};

use crate::fs::{DirHandle, FileHandle, StorageCapabilities, StoragePlatform, WriteStream};

/// [`StoragePlatform`] for browser main threads and workers.
#[derive(Clone, Default)]
pub struct WebFs;

impl WebFs {
    pub fn new() -> Self {
        Self
    }
}

impl StoragePlatform for WebFs {
    type Dir = WebDir;

    fn secure_context(&self) -> bool {
        is_secure_context()
    }

    fn capabilities(&self) -> StorageCapabilities {
        StorageCapabilities {
            secure_context: is_secure_context(),
            storage_manager: storage_manager().is_some(),
        }
    }

    fn storage_root<'a>(&'a self) -> impl std::future::Future<Output = StoreResult<WebDir>> + 'a {
        async move {
            let Some(manager) = storage_manager() else {
                return Err(StoreError::Unavailable);
            };
            match JsFuture::from(manager.get_directory()).await {
                Ok(value) => {
                    let handle = cast::<FileSystemDirectoryHandle>(value, "a directory handle")?;
                    Ok(WebDir { handle })
                }
                Err(err) => {
                    debug!(error = %js_detail(&err), "storage root acquisition rejected");
                    Err(StoreError::Unavailable)
                }
            }
        }
    }
}

/// Directory handle wrapping a `FileSystemDirectoryHandle`.
#[derive(Clone)]
pub struct WebDir {
    handle: FileSystemDirectoryHandle,
}

impl DirHandle for WebDir {
    type File = WebFile;

    fn open_dir<'a>(
        &'a self,
        name: &'a str,
    ) -> impl std::future::Future<Output = StoreResult<Option<Self>>> + 'a {
        async move {
            match JsFuture::from(self.handle.get_directory_handle(name)).await {
                Ok(value) => {
                    let handle = cast::<FileSystemDirectoryHandle>(value, "a directory handle")?;
                    Ok(Some(WebDir { handle }))
                }
                Err(err) if is_not_found(&err) => Ok(None),
                Err(err) => Err(store_error_from_js(err)),
            }
        }
    }

    fn create_dir<'a>(
        &'a self,
        name: &'a str,
    ) -> impl std::future::Future<Output = StoreResult<Self>> + 'a {
        async move {
            let opts = FileSystemGetDirectoryOptions::new();
            opts.set_create(true);
            let value = JsFuture::from(self.handle.get_directory_handle_with_options(name, &opts))
                .await
                .map_err(store_error_from_js)?;
            let handle = cast::<FileSystemDirectoryHandle>(value, "a directory handle")?;
            Ok(WebDir { handle })
        }
    }

    fn open_file<'a>(
        &'a self,
        name: &'a str,
    ) -> impl std::future::Future<Output = StoreResult<Option<WebFile>>> + 'a {
        async move {
            match JsFuture::from(self.handle.get_file_handle(name)).await {
                Ok(value) => {
                    let handle = cast::<FileSystemFileHandle>(value, "a file handle")?;
                    Ok(Some(WebFile { handle }))
                }
                Err(err) if is_not_found(&err) => Ok(None),
                Err(err) => Err(store_error_from_js(err)),
            }
        }
    }

    fn create_file<'a>(
        &'a self,
        name: &'a str,
    ) -> impl std::future::Future<Output = StoreResult<WebFile>> + 'a {
        async move {
            let opts = FileSystemGetFileOptions::new();
            opts.set_create(true);
            let value = JsFuture::from(self.handle.get_file_handle_with_options(name, &opts))
                .await
                .map_err(store_error_from_js)?;
            let handle = cast::<FileSystemFileHandle>(value, "a file handle")?;
            Ok(WebFile { handle })
        }
    }

    fn remove_entry<'a>(
        &'a self,
        name: &'a str,
    ) -> impl std::future::Future<Output = StoreResult<bool>> + 'a {
        async move {
            match JsFuture::from(self.handle.remove_entry(name)).await {
                Ok(_) => Ok(true),
                Err(err) if is_not_found(&err) => Ok(false),
                Err(err) => Err(store_error_from_js(err)),
            }
        }
    }
}

/// File handle wrapping a `FileSystemFileHandle`.
#[derive(Clone)]
pub struct WebFile {
    handle: FileSystemFileHandle,
}

impl FileHandle for WebFile {
    type Writer = WebWriter;

    fn read_all<'a>(&'a self) -> impl std::future::Future<Output = StoreResult<Vec<u8>>> + 'a {
        async move {
            let value = JsFuture::from(self.handle.get_file())
                .await
                .map_err(store_error_from_js)?;
            let file = cast::<web_sys::File>(value, "a file")?;
            let buffer = JsFuture::from(file.array_buffer())
                .await
                .map_err(store_error_from_js)?;
            Ok(Uint8Array::new(&buffer).to_vec())
        }
    }

    fn create_writable<'a>(
        &'a self,
    ) -> impl std::future::Future<Output = StoreResult<WebWriter>> + 'a {
        async move {
            let value = JsFuture::from(self.handle.create_writable())
                .await
                .map_err(store_error_from_js)?;
            let stream = cast::<FileSystemWritableFileStream>(value, "a writable stream")?;
            Ok(WebWriter {
                stream,
                closed: false,
            })
        }
    }
}

/// Writer over a `FileSystemWritableFileStream`. The browser stages writes
/// and commits them when the stream closes.
pub struct WebWriter {
    stream: FileSystemWritableFileStream,
    closed: bool,
}

impl WriteStream for WebWriter {
    fn write_all<'a>(
        &'a mut self,
        bytes: &'a [u8],
    ) -> impl std::future::Future<Output = StoreResult<()>> + 'a {
        async move {
            if self.closed {
                return Err(StoreError::Backend("write to closed stream".into()));
            }
            // Hand the stream a JS-owned copy; a view into wasm memory could be
            // invalidated by memory growth before the stream consumes the chunk.
            let data = Uint8Array::from(bytes);
            let promise = self
                .stream
                .write_with_buffer_source(&data)
                .map_err(store_error_from_js)?;
            JsFuture::from(promise).await.map_err(store_error_from_js)?;
            Ok(())
        }
    }

    fn close<'a>(&'a mut self) -> impl std::future::Future<Output = StoreResult<()>> + 'a {
        async move {
            if self.closed {
                return Ok(());
            }
            self.closed = true;
            JsFuture::from(self.stream.close())
                .await
                .map_err(store_error_from_js)?;
            Ok(())
        }
    }
}

impl Drop for WebWriter {
    fn drop(&mut self) {
        // Release the platform's file lock when the stream was never closed;
        // the staged bytes are discarded either way.
        if !self.closed {
            let _ = self.stream.abort();
        }
    }
}

fn is_secure_context() -> bool {
    let global = js_sys::global();
    if let Some(window) = global.dyn_ref::<Window>() {
        window.is_secure_context()
    } else if let Some(scope) = global.dyn_ref::<WorkerGlobalScope>() {
        scope.is_secure_context()
    } else {
        false
    }
}

/// Feature-detect `navigator.storage`; it is absent on older engines and in
/// some browsing modes.
fn storage_manager() -> Option<StorageManager> {
    let global = js_sys::global();
    let navigator: JsValue = if let Some(window) = global.dyn_ref::<Window>() {
        window.navigator().into()
    } else if let Some(scope) = global.dyn_ref::<WorkerGlobalScope>() {
        scope.navigator().into()
    } else {
        return None;
    };
    let storage = Reflect::get(&navigator, &JsValue::from_str("storage")).ok()?;
    storage.dyn_into::<StorageManager>().ok()
}

fn cast<T: JsCast>(value: JsValue, what: &str) -> StoreResult<T> {
    value
        .dyn_into::<T>()
        .map_err(|_| StoreError::Backend(format!("platform returned something other than {what}")))
}

fn is_not_found(err: &JsValue) -> bool {
    err.dyn_ref::<DomException>()
        .is_some_and(|ex| ex.name() == "NotFoundError")
}

// https://webidl.spec.whatwg.org/#idl-DOMException-error-names
fn store_error_from_js(err: JsValue) -> StoreError {
    match err.dyn_ref::<DomException>() {
        Some(ex) if ex.name() == "QuotaExceededError" => StoreError::QuotaExceeded,
        Some(ex) => StoreError::Backend(format!("{}: {}", ex.name(), ex.message())),
        None => StoreError::Backend(format!("{err:?}")),
    }
}

fn js_detail(err: &JsValue) -> String {
    match err.dyn_ref::<DomException>() {
        Some(ex) => format!("{}: {}", ex.name(), ex.message()),
        None => format!("{err:?}"),
    }
}
