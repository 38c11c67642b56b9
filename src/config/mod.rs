use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Bucket every object is written to and deleted from.
pub const BUCKET_NAME: &str = "learn_file_handling_go";

/// Folder uploads land in inside the bucket.
pub const UPLOAD_PREFIX: &str = "images";

/// Multipart field carrying the uploaded files.
pub const UPLOAD_FIELD: &str = "files";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageProviderKind {
    Gcs,
    S3,
}

impl FromStr for StorageProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gcs" | "gcp" => Ok(Self::Gcs),
            "s3" => Ok(Self::S3),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for StorageProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gcs => write!(f, "gcs"),
            Self::S3 => write!(f, "s3"),
        }
    }
}

/// Process configuration, loaded once at startup.
#[derive(Clone)]
pub struct AppConfig {
    /// Credential blob handed to the storage provider (GCP_CREDENTIALS)
    pub credentials: String,

    /// Storage backend: "gcs" or "s3" (default: "gcs")
    pub storage_provider: StorageProviderKind,

    /// Maximum aggregate upload body in bytes (default: 10 MB)
    pub max_upload_size: usize,

    /// Deadline after which in-flight storage calls are cancelled (default: 60s)
    pub request_timeout: Duration,

    /// Directory served at `/` (default: "public")
    pub static_dir: PathBuf,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("credentials", &"<redacted>")
            .field("storage_provider", &self.storage_provider)
            .field("max_upload_size", &self.max_upload_size)
            .field("request_timeout", &self.request_timeout)
            .field("static_dir", &self.static_dir)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            credentials: String::new(),
            storage_provider: StorageProviderKind::Gcs,
            max_upload_size: 10 * 1024 * 1024, // 10 MB
            request_timeout: Duration::from_secs(60),
            static_dir: PathBuf::from("public"),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();

        let credentials = lookup("GCP_CREDENTIALS")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("GCP_CREDENTIALS"))?;

        let storage_provider = match lookup("STORAGE_PROVIDER") {
            Some(v) => v.parse().map_err(|value| ConfigError::Invalid {
                key: "STORAGE_PROVIDER",
                value,
            })?,
            None => default.storage_provider,
        };

        let max_upload_size = match lookup("MAX_UPLOAD_SIZE") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
                key: "MAX_UPLOAD_SIZE",
                value: v,
            })?,
            None => default.max_upload_size,
        };

        let request_timeout = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(v) => v
                .parse()
                .ok()
                .filter(|secs: &u64| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::Invalid {
                    key: "REQUEST_TIMEOUT_SECS",
                    value: v,
                })?,
            None => default.request_timeout,
        };

        Ok(Self {
            credentials,
            storage_provider,
            max_upload_size,
            request_timeout,
            static_dir: lookup("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.static_dir),
        })
    }

    /// Config for local runs and tests (placeholder credentials)
    pub fn development() -> Self {
        Self {
            credentials: "{}".to_string(),
            ..Self::default()
        }
    }
}
