//! Key to byte-stream storage
//!
//! Provides the [`ByteStore`] contract used by the proxy for both direct file
//! serving and cache population, a directory-backed implementation with
//! atomic replace-on-write, and an in-memory implementation.

mod content;
mod error;
mod fs;
mod key;
mod memory;
mod store;

pub use content::Content;
pub use error::{Result, StoreError};
pub use fs::FsStore;
pub use key::{Key, KeyError};
pub use memory::MemoryStore;
pub use store::ByteStore;
