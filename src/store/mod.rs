//! The key-value store behind the registry and the click log
//!
//! The adapter is deliberately dumb: get/put/delete/prefix-scan over string
//! keys and values, plus one conditional primitive. Anything that spans two
//! keys is the caller's problem to sequence.

use async_trait::async_trait;
use thiserror::Error;

pub use memory::Memory;

mod memory;

/// Setup the store
pub fn setup() -> Memory {
    Memory::new()
}

/// Store errors
#[derive(Debug, Error)]
pub enum Error {
    /// A connection error with the backing store
    #[allow(dead_code)]
    #[error("Connection error: {0}")]
    Connection(String),

    /// A value did not survive the trip through serialization
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for all store interactions
pub type Result<T> = core::result::Result<T, Error>;

/// Store with all supported operations
///
/// There are no multi-key transactions; `put_if_absent` is the only
/// conditional write and the only tool for serializing competing writers.
#[async_trait]
pub trait Store: Clone + Send + Sync + 'static {
    /// Read the value under a key
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, overwriting whatever was there
    async fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Write a value only when the key does not exist yet
    ///
    /// Returns `false`, without writing, when the key is already present.
    async fn put_if_absent(&self, key: &str, value: &str) -> Result<bool>;

    /// Remove a key
    ///
    /// Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// List all keys starting with a prefix, in key order
    ///
    /// The result is unbounded; callers should not assume it fits any
    /// particular size.
    async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<String>>;
}
