use super::{ObjectInfo, ObjectStore};
use crate::error::SyncError;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// In-process bucket.
///
/// Counts every put and get. It can be told to reject the access probe, to
/// refuse puts of given keys, or to break reads of given keys halfway
/// through, so the pipelines can be exercised without a server.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, Bytes>>,
    broken_reads: Mutex<HashSet<String>>,
    broken_puts: Mutex<HashSet<String>>,
    deny_access: AtomicBool,
    puts: AtomicUsize,
    gets: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: impl Into<String>, body: impl Into<Bytes>) {
        self.lock_objects().insert(key.into(), body.into());
    }

    pub fn object(&self, key: &str) -> Option<Bytes> {
        self.lock_objects().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.lock_objects().keys().cloned().collect()
    }

    pub fn deny_access(&self, deny: bool) {
        self.deny_access.store(deny, Ordering::SeqCst);
    }

    /// Makes reads of `key` fail after writing half of the body.
    pub fn break_reads_of(&self, key: impl Into<String>) {
        self.broken_reads
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.into());
    }

    /// Makes puts of `key` fail with a server error; nothing is stored.
    pub fn break_puts_of(&self, key: impl Into<String>) {
        self.broken_puts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.into());
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    fn lock_objects(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Bytes>> {
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_broken(set: &Mutex<HashSet<String>>, key: &str) -> bool {
        set.lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(key)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn probe(&self) -> Result<(), SyncError> {
        if self.deny_access.load(Ordering::SeqCst) {
            return Err(SyncError::Status {
                action: "List",
                key: String::new(),
                status: reqwest::StatusCode::FORBIDDEN,
            });
        }
        Ok(())
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectInfo>, SyncError> {
        Ok(self
            .lock_objects()
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, body)| ObjectInfo {
                key: key.clone(),
                size: body.len() as u64,
            })
            .collect())
    }

    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<(), SyncError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if Self::is_broken(&self.broken_puts, key) {
            return Err(SyncError::Status {
                action: "Put",
                key: key.to_string(),
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            });
        }
        self.insert(key, body);
        Ok(())
    }

    async fn get_object(
        &self,
        key: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64, SyncError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        let body = self
            .object(key)
            .ok_or_else(|| SyncError::NotFound(key.to_string()))?;

        if Self::is_broken(&self.broken_reads, key) {
            sink.write_all(&body[..body.len() / 2]).await?;
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "connection reset mid-body").into());
        }

        sink.write_all(&body).await?;
        sink.flush().await?;
        Ok(body.len() as u64)
    }
}
