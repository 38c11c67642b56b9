//! Google Cloud Storage provider built on `object_store`.

use async_trait::async_trait;
use object_store::buffered::BufWriter;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::path::Path;
use object_store::{ObjectStore, RetryConfig};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::storage::{ObjectReader, StorageProvider, StorageSession, StoreError};

/// The subset of a service-account key checked before handing it to the client.
#[derive(Deserialize)]
struct ServiceAccountKey {
    #[serde(rename = "type")]
    key_type: String,
    client_email: String,
    private_key: String,
}

pub struct GcsStorageProvider {
    credentials: String,
    bucket: String,
}

impl fmt::Debug for GcsStorageProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GcsStorageProvider")
            .field("bucket", &self.bucket)
            .field("credentials", &"<redacted>")
            .finish()
    }
}

impl GcsStorageProvider {
    pub fn new(credentials: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            credentials: credentials.into(),
            bucket: bucket.into(),
        }
    }

    fn validate_key(&self) -> Result<ServiceAccountKey, StoreError> {
        let key: ServiceAccountKey = serde_json::from_str(&self.credentials)
            .map_err(|e| StoreError::Auth(format!("Malformed service account key: {}", e)))?;

        if key.key_type != "service_account" {
            return Err(StoreError::Auth(format!(
                "Unsupported credential type '{}', expected 'service_account'",
                key.key_type
            )));
        }
        if key.client_email.is_empty() || key.private_key.is_empty() {
            return Err(StoreError::Auth(
                "Service account key is missing client_email or private_key".to_string(),
            ));
        }

        Ok(key)
    }
}

#[async_trait]
impl StorageProvider for GcsStorageProvider {
    fn name(&self) -> &'static str {
        "gcs"
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn open_session(&self) -> Result<Box<dyn StorageSession>, StoreError> {
        let key = self.validate_key()?;

        let store = GoogleCloudStorageBuilder::new()
            .with_bucket_name(&self.bucket)
            .with_service_account_key(self.credentials.as_str())
            .with_retry(RetryConfig {
                max_retries: 0,
                ..Default::default()
            })
            .build()
            .map_err(|e| StoreError::Auth(format!("Failed to create GCS client: {}", e)))?;

        debug!("Opened GCS session for {} on bucket {}", key.client_email, self.bucket);
        Ok(Box::new(ObjectStoreSession::new(Arc::new(store))))
    }
}

/// Session over any `object_store` backend.
pub struct ObjectStoreSession {
    store: Arc<dyn ObjectStore>,
}

impl ObjectStoreSession {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }
}

/// Parses `path` without normalising it. `Path::parse` strips leading and
/// trailing delimiters, which would address a different object.
fn parse_path(path: &str) -> Result<Path, String> {
    let location = Path::parse(path).map_err(|e| format!("Invalid object path: {}", e))?;
    if location.as_ref() != path {
        return Err(format!(
            "Object path '{}' is not canonical (would address '{}')",
            path, location
        ));
    }
    Ok(location)
}

fn is_auth_failure(err: &object_store::Error) -> bool {
    matches!(
        err,
        object_store::Error::Unauthenticated { .. } | object_store::Error::PermissionDenied { .. }
    )
}

/// `BufWriter` surfaces store failures as `io::Error`; recover the original when present.
fn write_failure(path: &str, err: std::io::Error) -> StoreError {
    let inner = err
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<object_store::Error>());

    match inner {
        Some(store_err) if is_auth_failure(store_err) => StoreError::Auth(store_err.to_string()),
        _ => StoreError::Write {
            path: path.to_string(),
            message: err.to_string(),
        },
    }
}

#[async_trait]
impl StorageSession for ObjectStoreSession {
    async fn write_object<'a>(
        &self,
        path: &str,
        mut reader: ObjectReader<'a>,
        cancel: &CancellationToken,
    ) -> Result<u64, StoreError> {
        let location = parse_path(path).map_err(|message| StoreError::Write {
            path: path.to_string(),
            message,
        })?;
        let mut writer = BufWriter::new(Arc::clone(&self.store), location);

        let copied = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(StoreError::Cancelled),
            res = tokio::io::copy(&mut reader, &mut writer) => res.map_err(|e| write_failure(path, e)),
        };

        let written = match copied {
            Ok(written) => written,
            Err(e) => {
                if let Err(abort_err) = writer.abort().await {
                    warn!("Failed to abort upload of {}: {}", path, abort_err);
                }
                return Err(e);
            }
        };

        // The commit is not raced against cancellation: once it starts, the
        // object either lands whole or a failed multipart upload is aborted
        // by the writer itself.
        writer.shutdown().await.map_err(|e| write_failure(path, e))?;

        Ok(written)
    }

    async fn delete_object(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<(), StoreError> {
        let location = parse_path(path).map_err(|message| StoreError::Delete {
            path: path.to_string(),
            message,
        })?;

        let res = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StoreError::Cancelled),
            res = self.store.delete(&location) => res,
        };

        match res {
            Ok(()) => Ok(()),
            Err(object_store::Error::NotFound { .. }) => Err(StoreError::NotFound(path.to_string())),
            Err(e) if is_auth_failure(&e) => Err(StoreError::Auth(e.to_string())),
            Err(e) => Err(StoreError::Delete {
                path: path.to_string(),
                message: e.to_string(),
            }),
        }
    }

    async fn close(self: Box<Self>) {
        debug!("Closing object store session");
    }
}
