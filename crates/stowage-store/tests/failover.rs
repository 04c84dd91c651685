#![cfg(not(target_arch = "wasm32"))]

use stowage_store::{BlobStore, FailoverStore, MemoryStore, StoreError};

/// Composite over two memory stores, returning observer handles to both
/// tiers so tests can assert where payloads actually landed.
fn tiered() -> (FailoverStore<MemoryStore, MemoryStore>, MemoryStore, MemoryStore) {
    let primary = MemoryStore::new();
    let fallback = MemoryStore::new();
    let store = FailoverStore::new(primary.clone(), fallback.clone());
    (store, primary, fallback)
}

#[tokio::test]
async fn write_routes_to_primary_when_available() {
    let (store, primary, fallback) = tiered();

    store.write("drawings/a", b"payload").await.unwrap();

    assert!(primary.contains("drawings/a"));
    assert!(!fallback.contains("drawings/a"));
    assert_eq!(store.read("drawings/a").await.as_deref(), Some(&b"payload"[..]));
}

#[tokio::test]
async fn write_routes_to_fallback_when_primary_down() {
    let (store, primary, fallback) = tiered();
    primary.set_available(false);

    store.write("drawings/a", b"payload").await.unwrap();

    assert!(!primary.contains("drawings/a"));
    assert!(fallback.contains("drawings/a"));
}

#[tokio::test]
async fn read_falls_through_to_fallback_on_primary_miss() {
    let (store, primary, fallback) = tiered();
    fallback.write("only/in/fallback", b"f").await.unwrap();

    assert!(primary.is_available().await);
    assert_eq!(
        store.read("only/in/fallback").await.as_deref(),
        Some(&b"f"[..])
    );
}

#[tokio::test]
async fn read_prefers_primary_copy_over_fallback_copy() {
    let (store, primary, fallback) = tiered();
    primary.write("k", b"primary").await.unwrap();
    fallback.write("k", b"fallback").await.unwrap();

    assert_eq!(store.read("k").await.as_deref(), Some(&b"primary"[..]));
}

#[tokio::test]
async fn read_uses_fallback_when_primary_down() {
    let (store, primary, fallback) = tiered();
    primary.write("k", b"primary").await.unwrap();
    fallback.write("k", b"fallback").await.unwrap();
    primary.set_available(false);

    assert_eq!(store.read("k").await.as_deref(), Some(&b"fallback"[..]));
}

#[tokio::test]
async fn delete_targets_only_the_available_primary() {
    let (store, primary, fallback) = tiered();
    // Seed a fallback copy behind the composite's back, then store a newer
    // payload through the composite while the primary is up.
    fallback.write("k", b"old").await.unwrap();
    store.write("k", b"new").await.unwrap();
    assert_eq!(store.read("k").await.as_deref(), Some(&b"new"[..]));

    store.delete("k").await;

    // Only the primary copy is gone. The fallback copy is orphaned and
    // becomes visible again through read-through.
    assert!(!primary.contains("k"));
    assert!(fallback.contains("k"));
    assert_eq!(store.read("k").await.as_deref(), Some(&b"old"[..]));
}

#[tokio::test]
async fn delete_targets_fallback_when_primary_down() {
    let (store, primary, fallback) = tiered();
    primary.set_available(false);
    store.write("k", b"v").await.unwrap();
    assert!(fallback.contains("k"));

    store.delete("k").await;

    assert!(!fallback.contains("k"));
    assert_eq!(store.read("k").await, None);
}

#[tokio::test]
async fn available_when_either_tier_is_up() {
    let (store, primary, fallback) = tiered();
    assert!(store.is_available().await);

    primary.set_available(false);
    assert!(store.is_available().await);

    primary.set_available(true);
    fallback.set_available(false);
    assert!(store.is_available().await);
}

#[tokio::test]
async fn fallback_outage_is_invisible_while_primary_up() {
    let (store, _primary, fallback) = tiered();
    fallback.set_available(false);

    assert!(store.is_available().await);
    store.write("k", b"v").await.unwrap();
    assert_eq!(store.read("k").await.as_deref(), Some(&b"v"[..]));
    assert_eq!(store.read("absent").await, None);
    store.delete("k").await;
    assert_eq!(store.read("k").await, None);
}

#[tokio::test]
async fn both_tiers_down_degrades_per_contract() {
    let (store, primary, fallback) = tiered();
    primary.write("k", b"v").await.unwrap();
    primary.set_available(false);
    fallback.set_available(false);

    assert!(!store.is_available().await);
    assert!(matches!(
        store.write("k", b"new").await,
        Err(StoreError::Unavailable)
    ));
    assert_eq!(store.read("k").await, None);
    // Delete still completes silently.
    store.delete("k").await;
}

#[tokio::test]
async fn full_cycle_with_fallback_only() {
    let (store, primary, _fallback) = tiered();
    primary.set_available(false);

    store.write("snapshots/2024/boot", b"\x00\x01\x02").await.unwrap();
    assert_eq!(
        store.read("snapshots/2024/boot").await.as_deref(),
        Some(&b"\x00\x01\x02"[..])
    );
    store.delete("snapshots/2024/boot").await;
    assert_eq!(store.read("snapshots/2024/boot").await, None);
}

#[tokio::test]
async fn availability_flip_between_operations() {
    let (store, primary, fallback) = tiered();

    // Outage window: the write lands in the fallback.
    primary.set_available(false);
    store.write("k", b"v1").await.unwrap();

    // Primary recovers: the copy is still reachable via read-through, and the
    // next write lands in the primary.
    primary.set_available(true);
    assert_eq!(store.read("k").await.as_deref(), Some(&b"v1"[..]));
    store.write("k", b"v2").await.unwrap();
    assert_eq!(store.read("k").await.as_deref(), Some(&b"v2"[..]));

    // Second outage: the composite reverts to the stale fallback copy, since
    // nothing ever reconciles the tiers.
    primary.set_available(false);
    assert_eq!(store.read("k").await.as_deref(), Some(&b"v1"[..]));
    assert!(fallback.contains("k"));
}

#[tokio::test]
async fn composites_nest() {
    let inner_primary = MemoryStore::new();
    let inner_fallback = MemoryStore::new();
    let last_resort = MemoryStore::new();
    let store = FailoverStore::new(
        FailoverStore::new(inner_primary.clone(), inner_fallback.clone()),
        last_resort.clone(),
    );

    store.write("k", b"v").await.unwrap();
    assert!(inner_primary.contains("k"));

    inner_primary.set_available(false);
    inner_fallback.set_available(false);
    store.write("k2", b"v2").await.unwrap();
    assert!(last_resort.contains("k2"));
    assert_eq!(store.read("k").await, None);
    assert_eq!(store.read("k2").await.as_deref(), Some(&b"v2"[..]));
}

#[tokio::test]
async fn accessors_expose_tiers() {
    let (store, _primary, _fallback) = tiered();
    store.primary().write("p", b"1").await.unwrap();
    store.fallback().write("f", b"2").await.unwrap();

    let (primary, fallback) = store.into_parts();
    assert!(primary.contains("p"));
    assert!(fallback.contains("f"));
}
