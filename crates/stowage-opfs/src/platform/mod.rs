//! Platform adapters: one implementation of the [`crate::fs`] capability
//! traits per host environment.
//!
//! `web` is the real thing, built on the browser's origin-private filesystem;
//! `native` mirrors its semantics over a rooted `std::fs` directory so the
//! store can be exercised (and embedded) off-browser; `memory` is an
//! ephemeral fake with failure-injection knobs for tests.

pub mod memory;

#[cfg(not(target_arch = "wasm32"))]
pub mod native;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use memory::MemoryFs;

#[cfg(not(target_arch = "wasm32"))]
pub use native::NativeFs;

#[cfg(target_arch = "wasm32")]
pub use web::WebFs;
