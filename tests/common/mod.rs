#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use gcs_file_gateway::config::{AppConfig, UPLOAD_PREFIX};
use gcs_file_gateway::services::gateway::GatewayService;
use gcs_file_gateway::services::storage::{
    ObjectReader, StorageProvider, StorageSession, StoreError,
};
use gcs_file_gateway::{AppState, create_app};
use http_body_util::BodyExt;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

pub const BOUNDARY: &str = "---------------------------123456789012345678901234567";

#[derive(Default)]
pub struct MockState {
    pub objects: Mutex<HashMap<String, Vec<u8>>>,
    pub fail_writes: Mutex<HashSet<String>>,
    pub reject_credentials: AtomicBool,
    pub panic_on_open: AtomicBool,
    pub hang_until_cancelled: AtomicBool,
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub write_attempts: Mutex<Vec<String>>,
    pub delete_attempts: Mutex<Vec<String>>,
}

impl MockState {
    pub fn object(&self, path: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(path).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn insert(&self, path: &str, data: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(path.to_string(), data.to_vec());
    }

    pub fn fail_write(&self, path: &str) {
        self.fail_writes.lock().unwrap().insert(path.to_string());
    }

    pub fn sessions_balanced(&self) -> bool {
        self.opened.load(Ordering::SeqCst) == self.closed.load(Ordering::SeqCst)
    }
}

pub struct MockStorageProvider {
    pub state: Arc<MockState>,
}

#[async_trait]
impl StorageProvider for MockStorageProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn bucket(&self) -> &str {
        "mock-bucket"
    }

    async fn open_session(&self) -> Result<Box<dyn StorageSession>, StoreError> {
        if self.state.panic_on_open.load(Ordering::SeqCst) {
            panic!("storage client exploded");
        }
        if self.state.reject_credentials.load(Ordering::SeqCst) {
            return Err(StoreError::Auth("invalid service account key".to_string()));
        }
        self.state.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            state: self.state.clone(),
        }))
    }
}

struct MockSession {
    state: Arc<MockState>,
}

#[async_trait]
impl StorageSession for MockSession {
    async fn write_object<'a>(
        &self,
        path: &str,
        mut reader: ObjectReader<'a>,
        cancel: &CancellationToken,
    ) -> Result<u64, StoreError> {
        self.state
            .write_attempts
            .lock()
            .unwrap()
            .push(path.to_string());

        if self.state.hang_until_cancelled.load(Ordering::SeqCst) {
            cancel.cancelled().await;
            return Err(StoreError::Cancelled);
        }
        if self.state.fail_writes.lock().unwrap().contains(path) {
            return Err(StoreError::Write {
                path: path.to_string(),
                message: "simulated network failure".to_string(),
            });
        }

        let mut data = Vec::new();
        reader
            .read_to_end(&mut data)
            .await
            .map_err(|e| StoreError::Write {
                path: path.to_string(),
                message: e.to_string(),
            })?;
        let size = data.len() as u64;
        self.state
            .objects
            .lock()
            .unwrap()
            .insert(path.to_string(), data);
        Ok(size)
    }

    async fn delete_object(
        &self,
        path: &str,
        _cancel: &CancellationToken,
    ) -> Result<(), StoreError> {
        self.state
            .delete_attempts
            .lock()
            .unwrap()
            .push(path.to_string());

        match self.state.objects.lock().unwrap().remove(path) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(path.to_string())),
        }
    }

    async fn close(self: Box<Self>) {
        self.state.closed.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn setup_app_with_config(config: AppConfig) -> (Router, Arc<MockState>) {
    let state = Arc::new(MockState::default());
    let provider = Arc::new(MockStorageProvider {
        state: state.clone(),
    });

    let app = create_app(AppState {
        gateway: Arc::new(GatewayService::new(provider, UPLOAD_PREFIX)),
        config,
    });
    (app, state)
}

pub fn setup_app() -> (Router, Arc<MockState>) {
    setup_app_with_config(AppConfig::development())
}

/// Builds a multipart body from `(field, filename, content)` parts.
pub fn multipart_body(parts: &[(&str, &str, &str)]) -> String {
    let mut body = String::new();
    for (field, filename, content) in parts {
        body.push_str(&format!(
            "--{BOUNDARY}\r\n\
            Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
            Content-Type: application/octet-stream\r\n\r\n\
            {content}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    body
}

pub fn upload_request(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/gcp-upload")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn delete_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri("/gcp-delete")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&bytes).to_string()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
