use crate::config::{AppConfig, BUCKET_NAME, StorageProviderKind};
use crate::services::gcs::GcsStorageProvider;
use crate::services::s3::S3StorageProvider;
use crate::services::storage::StorageProvider;
use std::sync::Arc;
use tracing::{info, warn};

pub fn setup_storage(config: &AppConfig) -> Arc<dyn StorageProvider> {
    info!(
        "☁️  Storage: {} (Bucket: {})",
        config.storage_provider, BUCKET_NAME
    );

    match config.storage_provider {
        StorageProviderKind::Gcs => Arc::new(GcsStorageProvider::new(
            config.credentials.clone(),
            BUCKET_NAME,
        )),
        StorageProviderKind::S3 => Arc::new(S3StorageProvider::new(
            config.credentials.clone(),
            BUCKET_NAME,
        )),
    }
}

/// Opens and closes one session so bad credentials show up in the startup log.
///
/// Failures are only reported; each request still opens its own session and
/// surfaces the error to its caller.
pub async fn probe_storage(provider: &dyn StorageProvider) {
    match provider.open_session().await {
        Ok(session) => {
            session.close().await;
            info!("🔑 Storage credentials accepted by {} provider", provider.name());
        }
        Err(e) => warn!("⚠️  Storage credentials check failed: {}", e),
    }
}
