use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use serde::Deserialize;
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::storage::{ObjectReader, StorageProvider, StorageSession, StoreError, read_chunk};

/// Objects smaller than one part go through a single `PutObject`.
const PART_SIZE: usize = 8 * 1024 * 1024;

/// Credential document for S3-compatible endpoints (MinIO, GCS interoperability).
#[derive(Deserialize)]
struct S3Credentials {
    access_key_id: String,
    secret_access_key: String,
    endpoint: Option<String>,
    region: Option<String>,
}

pub struct S3StorageProvider {
    credentials: String,
    bucket: String,
}

impl fmt::Debug for S3StorageProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3StorageProvider")
            .field("bucket", &self.bucket)
            .field("credentials", &"<redacted>")
            .finish()
    }
}

impl S3StorageProvider {
    pub fn new(credentials: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            credentials: credentials.into(),
            bucket: bucket.into(),
        }
    }

    fn parse_credentials(&self) -> Result<S3Credentials, StoreError> {
        let creds: S3Credentials = serde_json::from_str(&self.credentials)
            .map_err(|e| StoreError::Auth(format!("Malformed S3 credentials: {}", e)))?;
        if creds.access_key_id.is_empty() || creds.secret_access_key.is_empty() {
            return Err(StoreError::Auth(
                "S3 credentials are missing access_key_id or secret_access_key".to_string(),
            ));
        }
        Ok(creds)
    }
}

#[async_trait]
impl StorageProvider for S3StorageProvider {
    fn name(&self) -> &'static str {
        "s3"
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn open_session(&self) -> Result<Box<dyn StorageSession>, StoreError> {
        let creds = self.parse_credentials()?;
        let region = creds.region.clone().unwrap_or_else(|| "us-east-1".to_string());

        let mut loader = aws_config::from_env()
            .region(Region::new(region))
            .credentials_provider(Credentials::new(
                creds.access_key_id,
                creds.secret_access_key,
                None,
                None,
                "static",
            ));
        if let Some(endpoint) = &creds.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let aws_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
            .force_path_style(creds.endpoint.is_some())
            .retry_config(RetryConfig::disabled())
            .build();

        debug!("Opened S3 session on bucket {}", self.bucket);
        Ok(Box::new(S3Session {
            client: Client::from_conf(s3_config),
            bucket: self.bucket.clone(),
        }))
    }
}

pub struct S3Session {
    client: Client,
    bucket: String,
}

fn status_of<E>(err: &SdkError<E, HttpResponse>) -> Option<u16> {
    err.raw_response().map(|r| r.status().as_u16())
}

fn write_failure<E>(path: &str, err: SdkError<E, HttpResponse>) -> StoreError
where
    E: std::error::Error + 'static,
{
    match status_of(&err) {
        Some(401 | 403) => StoreError::Auth(DisplayErrorContext(&err).to_string()),
        _ => StoreError::Write {
            path: path.to_string(),
            message: DisplayErrorContext(&err).to_string(),
        },
    }
}

impl S3Session {
    async fn put_small(&self, path: &str, data: Vec<u8>) -> Result<u64, StoreError> {
        let size = data.len() as u64;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| write_failure(path, e))?;
        Ok(size)
    }

    async fn upload_parts(
        &self,
        path: &str,
        upload_id: &str,
        first: Vec<u8>,
        reader: &mut ObjectReader<'_>,
    ) -> Result<(Vec<CompletedPart>, u64), StoreError> {
        let mut completed_parts = Vec::new();
        let mut part_number = 1;
        let mut total_size = 0u64;
        let mut chunk = first;

        while !chunk.is_empty() {
            total_size += chunk.len() as u64;
            let part = self
                .client
                .upload_part()
                .bucket(&self.bucket)
                .key(path)
                .upload_id(upload_id)
                .part_number(part_number)
                .body(ByteStream::from(chunk))
                .send()
                .await
                .map_err(|e| write_failure(path, e))?;

            completed_parts.push(
                CompletedPart::builder()
                    .e_tag(part.e_tag().unwrap_or_default())
                    .part_number(part_number)
                    .build(),
            );
            part_number += 1;

            chunk = read_chunk(reader, PART_SIZE)
                .await
                .map_err(|e| StoreError::Write {
                    path: path.to_string(),
                    message: e.to_string(),
                })?;
        }

        Ok((completed_parts, total_size))
    }

    async fn complete(
        &self,
        path: &str,
        upload_id: &str,
        parts: Vec<CompletedPart>,
    ) -> Result<(), StoreError> {
        self.client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(path)
            .upload_id(upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(parts))
                    .build(),
            )
            .send()
            .await
            .map_err(|e| write_failure(path, e))?;
        Ok(())
    }

    async fn abort(&self, path: &str, upload_id: &str) {
        let abort = self
            .client
            .abort_multipart_upload()
            .bucket(&self.bucket)
            .key(path)
            .upload_id(upload_id)
            .send()
            .await;
        if let Err(e) = abort {
            warn!(
                "Failed to abort multipart upload {} for {}: {}",
                upload_id,
                path,
                DisplayErrorContext(&e)
            );
        }
    }

    async fn write_multipart(
        &self,
        path: &str,
        first: Vec<u8>,
        mut reader: ObjectReader<'_>,
        cancel: &CancellationToken,
    ) -> Result<u64, StoreError> {
        let created = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| write_failure(path, e))?;
        let upload_id = created
            .upload_id()
            .ok_or_else(|| StoreError::Write {
                path: path.to_string(),
                message: "No upload ID".to_string(),
            })?
            .to_string();

        let uploaded = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(StoreError::Cancelled),
            res = self.upload_parts(path, &upload_id, first, &mut reader) => res,
        };

        let outcome = match uploaded {
            Ok((parts, total_size)) => self
                .complete(path, &upload_id, parts)
                .await
                .map(|()| total_size),
            Err(e) => Err(e),
        };

        if outcome.is_err() {
            self.abort(path, &upload_id).await;
        }

        outcome
    }
}

#[async_trait]
impl StorageSession for S3Session {
    async fn write_object<'a>(
        &self,
        path: &str,
        mut reader: ObjectReader<'a>,
        cancel: &CancellationToken,
    ) -> Result<u64, StoreError> {
        let first = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StoreError::Cancelled),
            res = read_chunk(&mut reader, PART_SIZE) => res.map_err(|e| StoreError::Write {
                path: path.to_string(),
                message: e.to_string(),
            })?,
        };

        if first.len() < PART_SIZE {
            return self.put_small(path, first).await;
        }

        self.write_multipart(path, first, reader, cancel).await
    }

    async fn delete_object(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<(), StoreError> {
        let res = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StoreError::Cancelled),
            res = self.client.delete_object().bucket(&self.bucket).key(path).send() => res,
        };

        match res {
            Ok(_) => Ok(()),
            Err(e) => match status_of(&e) {
                Some(404) => Err(StoreError::NotFound(path.to_string())),
                Some(401 | 403) => Err(StoreError::Auth(DisplayErrorContext(&e).to_string())),
                _ => Err(StoreError::Delete {
                    path: path.to_string(),
                    message: DisplayErrorContext(&e).to_string(),
                }),
            },
        }
    }

    async fn close(self: Box<Self>) {
        debug!("Closing S3 session on bucket {}", self.bucket);
    }
}
