use std::io::Cursor;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::batch::{BatchReport, run_batch};
use super::storage::{StorageProvider, StoreError};
use crate::models::UploadedFile;

/// Drives upload and delete batches through per-item storage sessions.
pub struct GatewayService {
    provider: Arc<dyn StorageProvider>,
    prefix: String,
}

impl GatewayService {
    pub fn new(provider: Arc<dyn StorageProvider>, prefix: impl Into<String>) -> Self {
        Self {
            provider,
            prefix: prefix.into(),
        }
    }

    pub fn provider(&self) -> &dyn StorageProvider {
        self.provider.as_ref()
    }

    pub fn destination_path(&self, name: &str) -> String {
        format!("{}/{}", self.prefix.trim_end_matches('/'), name)
    }

    pub async fn upload_batch(
        &self,
        files: Vec<UploadedFile>,
        cancel: &CancellationToken,
    ) -> BatchReport {
        run_batch(
            files,
            |file| self.destination_path(&file.name),
            |file| self.upload_one(file, cancel),
        )
        .await
    }

    pub async fn delete_batch(&self, names: Vec<String>, cancel: &CancellationToken) -> BatchReport {
        run_batch(
            names,
            |name| name.clone(),
            |name| self.delete_one(name, cancel),
        )
        .await
    }

    async fn upload_one(
        &self,
        file: UploadedFile,
        cancel: &CancellationToken,
    ) -> Result<(), StoreError> {
        let path = self.destination_path(&file.name);
        let size = file.size();

        let session = self.provider.open_session().await.map_err(|e| {
            error!("Failed to open storage session for {}: {}", path, e);
            e
        })?;
        let result = session
            .write_object(&path, Box::new(Cursor::new(file.data)), cancel)
            .await;
        session.close().await;

        match result {
            Ok(written) => {
                info!(
                    "☁️  Uploaded {} to bucket {} ({} of {} bytes)",
                    path,
                    self.provider.bucket(),
                    written,
                    size
                );
                Ok(())
            }
            Err(e) => {
                error!("Upload to {} failed: {}", path, e);
                Err(e)
            }
        }
    }

    async fn delete_one(&self, name: String, cancel: &CancellationToken) -> Result<(), StoreError> {
        let session = self.provider.open_session().await.map_err(|e| {
            error!("Failed to open storage session for {}: {}", name, e);
            e
        })?;
        let result = session.delete_object(&name, cancel).await;
        session.close().await;

        match result {
            Ok(()) => {
                info!("🗑️  Deleted {} from bucket {}", name, self.provider.bucket());
                Ok(())
            }
            Err(e) => {
                error!("Delete of {} failed: {}", name, e);
                Err(e)
            }
        }
    }
}
