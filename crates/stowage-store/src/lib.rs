//! Store contract and composition layer for stowage.
//!
//! Browser-hosted apps need to persist opaque blobs (drawings, session
//! snapshots) under hierarchical string keys, against backends whose
//! availability varies at runtime. This crate defines the pieces that are
//! backend-agnostic:
//!
//! - [`BlobStore`]: the four-operation capability contract every backend
//!   implements: a per-call availability probe, a fallible write, a read
//!   that reports absence instead of failing, and an idempotent delete.
//! - [`FailoverStore`]: primary/fallback composite with per-operation
//!   availability routing and read-through to the fallback on a primary
//!   miss.
//! - [`MemoryStore`]: ephemeral in-memory backend, also the test double for
//!   composite scenarios.
//! - [`StoreError`]: unified error surface shared by all backends.
//!
//! The origin-private-filesystem primary store lives in the `stowage-opfs`
//! crate.

mod error;
mod failover;
mod memory;
mod store;

pub use error::{StoreError, StoreResult};
pub use failover::FailoverStore;
pub use memory::MemoryStore;
pub use store::BlobStore;
