#![cfg(target_arch = "wasm32")]

// Keep all wasm-only browser integration tests in a single crate so native
// `cargo test` runs don't have to link extra empty test binaries.

wasm_bindgen_test::wasm_bindgen_test_configure!(run_in_browser);

use stowage_opfs::OpfsStore;
use stowage_opfs::platform::WebFs;
use stowage_store::{BlobStore, FailoverStore, MemoryStore};
use wasm_bindgen_test::wasm_bindgen_test;

fn unique_key(prefix: &str) -> String {
    let now = js_sys::Date::now() as u64;
    format!("tests/{prefix}-{now}/blob.bin")
}

/// Browser-hosted runners without OPFS (insecure context, unsupported
/// engine) skip these tests instead of failing them.
async fn opfs_store() -> Option<OpfsStore<WebFs>> {
    let store = OpfsStore::new(WebFs::new());
    if store.is_available().await {
        Some(store)
    } else {
        None
    }
}

#[wasm_bindgen_test(async)]
async fn opfs_roundtrip_nested_key() {
    let Some(store) = opfs_store().await else { return };
    let key = unique_key("roundtrip");

    store.write(&key, b"payload").await.unwrap();
    assert_eq!(store.read(&key).await.as_deref(), Some(&b"payload"[..]));

    store.write(&key, b"replaced").await.unwrap();
    assert_eq!(store.read(&key).await.as_deref(), Some(&b"replaced"[..]));

    store.delete(&key).await;
    assert_eq!(store.read(&key).await, None);
}

#[wasm_bindgen_test(async)]
async fn opfs_empty_payload_roundtrip() {
    let Some(store) = opfs_store().await else { return };
    let key = unique_key("empty");

    store.write(&key, b"").await.unwrap();
    assert_eq!(store.read(&key).await, Some(Vec::new()));
    store.delete(&key).await;
}

#[wasm_bindgen_test(async)]
async fn opfs_absent_key_reads_none() {
    let Some(store) = opfs_store().await else { return };

    assert_eq!(store.read(&unique_key("never-written")).await, None);
    assert_eq!(store.try_read(&unique_key("never-written")).await.unwrap(), None);
}

#[wasm_bindgen_test(async)]
async fn opfs_delete_is_idempotent() {
    let Some(store) = opfs_store().await else { return };
    let key = unique_key("delete");

    store.write(&key, b"v").await.unwrap();
    store.delete(&key).await;
    store.delete(&key).await;
    store.delete(&unique_key("never-written")).await;
    assert_eq!(store.read(&key).await, None);
}

#[wasm_bindgen_test(async)]
async fn opfs_sibling_keys_share_directories() {
    let Some(store) = opfs_store().await else { return };
    let now = js_sys::Date::now() as u64;
    let x = format!("tests/siblings-{now}/x");
    let y = format!("tests/siblings-{now}/y");

    store.write(&x, b"x").await.unwrap();
    store.write(&y, b"y").await.unwrap();
    assert_eq!(store.read(&x).await.as_deref(), Some(&b"x"[..]));
    assert_eq!(store.read(&y).await.as_deref(), Some(&b"y"[..]));

    store.delete(&x).await;
    assert_eq!(store.read(&y).await.as_deref(), Some(&b"y"[..]));
    store.delete(&y).await;
}

#[wasm_bindgen_test(async)]
async fn opfs_capabilities_match_availability() {
    let Some(store) = opfs_store().await else { return };

    let caps = store.capabilities();
    assert!(caps.secure_context);
    assert!(caps.storage_manager);
}

#[wasm_bindgen_test(async)]
async fn failover_prefers_opfs_and_reads_through() {
    let Some(primary) = opfs_store().await else { return };
    let fallback = MemoryStore::new();
    let store = FailoverStore::new(primary, fallback.clone());
    let key = unique_key("failover");

    store.write(&key, b"payload").await.unwrap();
    assert!(fallback.is_empty());
    assert_eq!(store.read(&key).await.as_deref(), Some(&b"payload"[..]));

    // A fallback-only copy is reachable through the composite.
    let orphan = unique_key("failover-orphan");
    fallback.write(&orphan, b"f").await.unwrap();
    assert_eq!(store.read(&orphan).await.as_deref(), Some(&b"f"[..]));

    store.delete(&key).await;
}
