use async_trait::async_trait;
use tracing::debug;

use crate::error::StoreResult;
use crate::store::BlobStore;

/// Composite [`BlobStore`] that prefers a primary backend and falls back to a
/// secondary one.
///
/// Availability of the primary is re-checked on every operation, never cached,
/// so the composite tracks backends that come and go while the app is
/// running (permission revoked mid-session, quota pressure, a platform that
/// only works in some browsing modes).
///
/// Routing policy:
///
/// - `write` and `delete` target exactly one backend: the primary when it is
///   available at that moment, otherwise the fallback. Mutating both tiers
///   would turn every disagreement between them into an ambiguity about which
///   copy is the truth.
/// - `read` consults the primary first and falls through to the fallback on a
///   miss, so a payload stays reachable no matter which tier originally
///   accepted it.
///
/// The cost of single-target mutation is that the tiers are never reconciled.
/// A payload written to the fallback during a primary outage is not removed
/// by a later `delete` that routes to the recovered primary; the fallback
/// copy lingers and `read` serves it again once the primary misses. Callers
/// that cannot tolerate such stale copies need a reconciliation pass on top
/// of this layer, not a different routing policy.
pub struct FailoverStore<P, F> {
    primary: P,
    fallback: F,
}

impl<P, F> FailoverStore<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }

    pub fn primary(&self) -> &P {
        &self.primary
    }

    pub fn fallback(&self) -> &F {
        &self.fallback
    }

    pub fn into_parts(self) -> (P, F) {
        (self.primary, self.fallback)
    }
}

#[async_trait(?Send)]
impl<P: BlobStore, F: BlobStore> BlobStore for FailoverStore<P, F> {
    async fn is_available(&self) -> bool {
        self.primary.is_available().await || self.fallback.is_available().await
    }

    async fn write(&self, key: &str, bytes: &[u8]) -> StoreResult<()> {
        if self.primary.is_available().await {
            self.primary.write(key, bytes).await
        } else {
            debug!(key, "primary unavailable, writing to fallback");
            self.fallback.write(key, bytes).await
        }
    }

    async fn read(&self, key: &str) -> Option<Vec<u8>> {
        if self.primary.is_available().await {
            if let Some(bytes) = self.primary.read(key).await {
                return Some(bytes);
            }
            debug!(key, "primary miss, reading from fallback");
        }
        self.fallback.read(key).await
    }

    async fn delete(&self, key: &str) {
        if self.primary.is_available().await {
            self.primary.delete(key).await;
        } else {
            debug!(key, "primary unavailable, deleting from fallback");
            self.fallback.delete(key).await;
        }
    }
}
