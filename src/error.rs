use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} environment variable is not set")]
    MissingVar(&'static str),
    #[error("Invalid endpoint {endpoint}: {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Invalid url style {0}, expected `path` or `virtual`")]
    InvalidUrlStyle(String),
    #[error("Invalid bucket: {0}")]
    Bucket(#[from] rusty_s3::BucketError),
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("storage access is invalid")]
    AccessInvalid(#[source] Box<SyncError>),
    #[error("Failed to list local files under {}: {source}", root.display())]
    LocalListing {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("Failed to list remote objects under {prefix}: {source}")]
    RemoteListing {
        prefix: String,
        #[source]
        source: Box<SyncError>,
    },
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{action} {key} failed with status {status}")]
    Status {
        action: &'static str,
        key: String,
        status: reqwest::StatusCode,
    },
    #[error("Failed to parse listing response: {0}")]
    Xml(#[from] quick_xml::DeError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Invalid object key {key}: {reason}")]
    InvalidKey { key: String, reason: &'static str },
    #[error("Object {0} not found")]
    NotFound(String),
}

impl SyncError {
    pub fn access(source: SyncError) -> Self {
        SyncError::AccessInvalid(Box::new(source))
    }

    pub fn remote_listing(prefix: impl Into<String>, source: SyncError) -> Self {
        SyncError::RemoteListing {
            prefix: prefix.into(),
            source: Box::new(source),
        }
    }
}
