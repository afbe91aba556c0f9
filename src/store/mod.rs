//! Remote object storage.
//!
//! Pipelines talk to the bucket only through [`ObjectStore`], so the S3
//! backend can be swapped for [`MemoryStore`] in tests.

mod memory;
mod s3;

pub use memory::MemoryStore;
pub use s3::S3Store;

use crate::error::SyncError;
use async_trait::async_trait;
use tokio::io::AsyncWrite;

/// A single entry returned by a prefix listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub key: String,
    pub size: u64,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Cheapest call that proves the credentials work.
    async fn probe(&self) -> Result<(), SyncError>;

    /// Every object whose key starts with `prefix`, across all pages.
    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectInfo>, SyncError>;

    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<(), SyncError>;

    /// Streams the object body into `sink` and returns the number of bytes written.
    async fn get_object(
        &self,
        key: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64, SyncError>;
}
