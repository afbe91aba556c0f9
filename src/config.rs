use crate::error::ConfigError;
use rusty_s3::UrlStyle;
use std::time::Duration;
use url::Url;

pub const ENV_ENDPOINT: &str = "S3_ENDPOINT";
pub const ENV_BUCKET_NAME: &str = "S3_BUCKET_NAME";
pub const ENV_REGION: &str = "S3_REGION";
pub const ENV_ACCESS_KEY: &str = "S3_ACCESS_KEY";
pub const ENV_SECRET_KEY: &str = "S3_SECRET_KEY";
pub const ENV_URL_STYLE: &str = "S3_URL_STYLE";

pub const DEFAULT_REMOTE_DIR: &str = "remoteDir";
pub const DEFAULT_UPLOAD_DIR: &str = "tests/screenshots";
pub const DEFAULT_DOWNLOAD_DIR: &str = "./tests/screenshots";

/// Connection parameters for the object store.
///
/// Built once at startup; every field is required and non-empty.
#[derive(Debug, Clone)]
pub struct S3Config {
    pub endpoint: Url,
    pub bucket_name: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    pub url_style: UrlStyle,
}

impl S3Config {
    /// Reads the configuration from the process environment, loading `.env` first.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| -> Result<String, ConfigError> {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::MissingVar(name))
        };

        let endpoint = required(ENV_ENDPOINT)?;
        let bucket_name = required(ENV_BUCKET_NAME)?;
        let region = required(ENV_REGION)?;
        let access_key = required(ENV_ACCESS_KEY)?;
        let secret_key = required(ENV_SECRET_KEY)?;

        let url_style = match lookup(ENV_URL_STYLE).as_deref().map(str::trim) {
            None | Some("") | Some("path") => UrlStyle::Path,
            Some("virtual") | Some("virtual-host") => UrlStyle::VirtualHost,
            Some(other) => return Err(ConfigError::InvalidUrlStyle(other.to_string())),
        };

        Ok(Self {
            endpoint: normalize_endpoint(&endpoint)?,
            bucket_name,
            region,
            access_key,
            secret_key,
            url_style,
        })
    }
}

/// Adds a scheme when missing and drops trailing slashes.
pub fn normalize_endpoint(endpoint: &str) -> Result<Url, ConfigError> {
    let base_url = if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
        format!("https://{}", endpoint)
    } else {
        endpoint.to_string()
    };
    let base_url = base_url.trim_end_matches('/');

    Url::parse(base_url).map_err(|source| ConfigError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        source,
    })
}

/// Tunables shared by both pipelines.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Upper bound on transfers in flight at once.
    pub concurrency: usize,
    /// File extensions without the dot, matched case-sensitively.
    pub extensions: Vec<String>,
    pub request_timeout: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            extensions: vec!["png".to_string()],
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl SyncOptions {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions: Vec<String> = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_string())
            .filter(|ext| !ext.is_empty())
            .collect();
        if !extensions.is_empty() {
            self.extensions = extensions;
        }
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
