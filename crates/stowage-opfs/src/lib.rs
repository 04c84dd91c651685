pub mod fs;
pub mod platform;

mod error;
mod store;

pub use error::{StoreError, StoreResult};
pub use fs::StorageCapabilities;
pub use store::OpfsStore;
