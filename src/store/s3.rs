use super::{ObjectInfo, ObjectStore};
use crate::config::S3Config;
use crate::error::{ConfigError, SyncError};
use async_trait::async_trait;
use log::debug;
use quick_xml::de::from_str;
use reqwest::Client as ReqwestClient;
use rusty_s3::{Bucket, Credentials, S3Action};
use serde::Deserialize;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};

const PRESIGN_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Deserialize)]
struct ListObjectsResponse {
    #[serde(rename = "Contents", default)]
    contents: Vec<S3Object>,
    #[serde(rename = "IsTruncated", default)]
    is_truncated: bool,
    #[serde(rename = "NextContinuationToken", default)]
    next_continuation_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct S3Object {
    #[serde(rename = "Key")]
    key: String,
    #[serde(rename = "Size", default)]
    size: Option<u64>,
}

/// S3-compatible backend: presigned requests sent over one shared HTTP client.
pub struct S3Store {
    bucket: Bucket,
    client: ReqwestClient,
    credentials: Credentials,
}

impl S3Store {
    pub fn new(config: &S3Config, request_timeout: Duration) -> Result<Self, SyncError> {
        let bucket = Bucket::new(
            config.endpoint.clone(),
            config.url_style,
            config.bucket_name.clone(),
            config.region.clone(),
        )
        .map_err(ConfigError::from)?;
        debug!("Bucket base url: {}", bucket.base_url());

        let credentials = Credentials::new(config.access_key.clone(), config.secret_key.clone());
        let client = ReqwestClient::builder().timeout(request_timeout).build()?;

        Ok(Self {
            bucket,
            client,
            credentials,
        })
    }

    pub fn bucket_name(&self) -> &str {
        self.bucket.name()
    }

    async fn list_page(
        &self,
        prefix: Option<&str>,
        continuation: Option<&str>,
        max_keys: Option<usize>,
    ) -> Result<ListObjectsResponse, SyncError> {
        let mut action = self.bucket.list_objects_v2(Some(&self.credentials));
        if let Some(prefix) = prefix {
            action.with_prefix(prefix);
        }
        if let Some(token) = continuation {
            action.with_continuation_token(token);
        }
        if let Some(max_keys) = max_keys {
            action.with_max_keys(max_keys);
        }
        let url = action.sign(PRESIGN_TTL);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Status {
                action: "List",
                key: prefix.unwrap_or_default().to_string(),
                status,
            });
        }
        let content = response.text().await?;
        parse_list_response(&content)
    }
}

fn parse_list_response(content: &str) -> Result<ListObjectsResponse, SyncError> {
    Ok(from_str(content)?)
}

fn content_type_for(key: &str) -> &'static str {
    let ext = key.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn probe(&self) -> Result<(), SyncError> {
        let page = self.list_page(None, None, Some(1)).await?;
        debug!(
            "Bucket {} is reachable, first page has {} object(s)",
            self.bucket.name(),
            page.contents.len()
        );
        Ok(())
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectInfo>, SyncError> {
        let mut objects = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let page = self
                .list_page(Some(prefix), continuation.as_deref(), None)
                .await?;
            debug!("Listed {} object(s) under {}", page.contents.len(), prefix);

            objects.extend(page.contents.into_iter().map(|obj| ObjectInfo {
                key: obj.key,
                size: obj.size.unwrap_or(0),
            }));

            match page.next_continuation_token {
                Some(token) if page.is_truncated => continuation = Some(token),
                _ => break,
            }
        }

        Ok(objects)
    }

    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<(), SyncError> {
        let action = self.bucket.put_object(Some(&self.credentials), key);
        let url = action.sign(PRESIGN_TTL);

        let response = self
            .client
            .put(url)
            .header("Content-Type", content_type_for(key))
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SyncError::Status {
                action: "Put",
                key: key.to_string(),
                status: response.status(),
            });
        }
        Ok(())
    }

    async fn get_object(
        &self,
        key: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64, SyncError> {
        let action = self.bucket.get_object(Some(&self.credentials), key);
        let url = action.sign(PRESIGN_TTL);

        let mut response = self.client.get(url).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SyncError::NotFound(key.to_string()));
        }
        if !status.is_success() {
            return Err(SyncError::Status {
                action: "Get",
                key: key.to_string(),
                status,
            });
        }

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            sink.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        sink.flush().await?;
        Ok(written)
    }
}
