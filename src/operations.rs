use crate::config::{S3Config, SyncOptions};
use crate::Result;
use crate::error::SyncError;
use crate::keys;
use crate::models::{Direction, TransferItem, TransferOutcome, TransferReport};
use crate::store::{ObjectStore, S3Store};
use futures::stream::{self, StreamExt};
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Moves screenshot trees between a local folder and a remote directory.
pub struct ScreenshotSync {
    store: Arc<dyn ObjectStore>,
    options: SyncOptions,
}

impl ScreenshotSync {
    pub fn new(store: Arc<dyn ObjectStore>, options: SyncOptions) -> Self {
        Self { store, options }
    }

    /// Connects to the S3 bucket described by `config`.
    pub fn connect(config: &S3Config, options: SyncOptions) -> Result<Self> {
        let store = S3Store::new(config, options.request_timeout)?;
        info!(
            "Using bucket {} at {}",
            store.bucket_name(),
            config.endpoint
        );
        Ok(Self::new(Arc::new(store), options))
    }

    /// Confirms the credentials can reach the bucket.
    ///
    /// Whatever goes wrong underneath is reported as
    /// [`SyncError::AccessInvalid`].
    pub async fn check_access(&self) -> Result<()> {
        match self.store.probe().await {
            Ok(()) => {
                info!("Storage access is valid");
                Ok(())
            }
            Err(e) => {
                debug!("Access probe failed: {}", e);
                Err(SyncError::access(e))
            }
        }
    }

    /// Uploads every image under `local_folder` to `{remote_dir}/...`.
    ///
    /// Fails up front when access is invalid or the folder cannot be walked.
    /// A failed file is recorded in the report and does not stop the others.
    pub async fn upload_new_screenshots(
        &self,
        remote_dir: &str,
        local_folder: impl AsRef<Path>,
    ) -> Result<TransferReport> {
        let local_folder = local_folder.as_ref();
        self.check_access().await?;

        let images = self.find_local_images(local_folder)?;
        info!(
            "Found {} image(s) under {}",
            images.len(),
            local_folder.display()
        );

        let mut report = TransferReport::new(Direction::Upload, remote_dir);
        let mut items = Vec::with_capacity(images.len());
        for path in images {
            match keys::remote_key(remote_dir, local_folder, &path) {
                Ok(key) => items.push(TransferItem {
                    local_path: path,
                    key,
                }),
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    let key = path.display().to_string();
                    report.outcomes.push(TransferOutcome::failed(
                        TransferItem {
                            local_path: path,
                            key,
                        },
                        e,
                    ));
                }
            }
        }

        let outcomes: Vec<TransferOutcome> = stream::iter(items)
            .map(|item| self.upload_one(item))
            .buffer_unordered(self.options.concurrency.max(1))
            .collect()
            .await;
        report.outcomes.extend(outcomes);

        Ok(report)
    }

    /// Downloads every image under `{remote_dir}/` into `local_dir`.
    ///
    /// Never fails: an invalid access check or a failed listing is logged and
    /// returned as an aborted report, and each file succeeds or fails alone.
    pub async fn download_screenshots(
        &self,
        remote_dir: &str,
        local_dir: impl AsRef<Path>,
    ) -> TransferReport {
        let local_dir = local_dir.as_ref();

        let found = match self.list_remote_images(remote_dir).await {
            Ok(found) => found,
            Err(e) => {
                error!("Error: {}", e);
                return TransferReport::aborted(Direction::Download, remote_dir, e);
            }
        };
        info!("Found {} image(s) under {}/", found.len(), remote_dir.trim_end_matches('/'));

        let mut report = TransferReport::new(Direction::Download, remote_dir);
        let mut destinations = HashSet::new();
        let mut items = Vec::with_capacity(found.len());
        for key in found {
            match keys::local_path(remote_dir, local_dir, &key) {
                Ok(local_path) if destinations.insert(local_path.clone()) => {
                    items.push(TransferItem { local_path, key });
                }
                Ok(local_path) => {
                    let e = SyncError::InvalidKey {
                        key: key.clone(),
                        reason: "another key maps to the same local file",
                    };
                    warn!("Skipping {}: {}", key, e);
                    report
                        .outcomes
                        .push(TransferOutcome::failed(TransferItem { local_path, key }, e));
                }
                Err(e) => {
                    error!("Error downloading file {}: {}", key, e);
                    let item = TransferItem {
                        local_path: local_dir.to_path_buf(),
                        key,
                    };
                    report.outcomes.push(TransferOutcome::failed(item, e));
                }
            }
        }

        let outcomes: Vec<TransferOutcome> = stream::iter(items)
            .map(|item| self.download_one(item))
            .buffer_unordered(self.options.concurrency.max(1))
            .collect()
            .await;
        report.outcomes.extend(outcomes);

        report
    }

    fn find_local_images(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut images = Vec::new();
        for entry in WalkDir::new(root) {
            let entry = entry.map_err(|source| SyncError::LocalListing {
                root: root.to_path_buf(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let matches = entry
                .file_name()
                .to_str()
                .is_some_and(|name| keys::has_extension(name, &self.options.extensions));
            if matches {
                images.push(entry.into_path());
            }
        }
        Ok(images)
    }

    async fn list_remote_images(&self, remote_dir: &str) -> Result<Vec<String>> {
        self.check_access().await?;

        let prefix = keys::remote_prefix(remote_dir);
        let objects = self
            .store
            .list_objects(&prefix)
            .await
            .map_err(|e| SyncError::remote_listing(prefix.as_str(), e))?;

        Ok(objects
            .into_iter()
            .map(|obj| obj.key)
            .filter(|key| keys::has_extension(key, &self.options.extensions))
            .collect())
    }

    async fn upload_one(&self, item: TransferItem) -> TransferOutcome {
        let body = match tokio::fs::read(&item.local_path).await {
            Ok(body) => body,
            Err(e) => {
                error!("Error reading {}: {}", item.local_path.display(), e);
                return TransferOutcome::failed(item, e);
            }
        };
        let size = body.len() as u64;

        match self.store.put_object(&item.key, body).await {
            Ok(()) => {
                info!("Uploaded successfully: {}", item.key);
                TransferOutcome::completed(item, size)
            }
            Err(e) => {
                error!("Error uploading file {}: {}", item.key, e);
                TransferOutcome::failed(item, e)
            }
        }
    }

    async fn download_one(&self, item: TransferItem) -> TransferOutcome {
        match self.fetch_to_file(&item).await {
            Ok(bytes) => {
                info!("Downloaded successfully: {}", item.local_path.display());
                TransferOutcome::completed(item, bytes)
            }
            Err(e) => {
                error!("Error downloading file {}: {}", item.key, e);
                TransferOutcome::failed(item, e)
            }
        }
    }

    async fn fetch_to_file(&self, item: &TransferItem) -> Result<u64> {
        if let Some(parent) = item.local_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::File::create(&item.local_path).await?;
        let result = self.store.get_object(&item.key, &mut file).await;
        drop(file);

        if result.is_err() {
            if let Err(e) = tokio::fs::remove_file(&item.local_path).await {
                warn!(
                    "Could not remove partial file {}: {}",
                    item.local_path.display(),
                    e
                );
            }
        }
        result
    }
}
