use axum::{
    Extension,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::header,
    response::IntoResponse,
};
use tokio_util::sync::CancellationToken;

use crate::AppState;
use crate::api::error::AppError;
use crate::config::UPLOAD_FIELD;
use crate::models::UploadedFile;
use crate::utils::validation::validate_file_name;

pub const UPLOAD_SUCCESS_MESSAGE: &str =
    "All files were uploaded to the images/ folder in the bucket\n";

/// Reads the whole form before anything is written, so a malformed body or a
/// rejected name leaves the bucket untouched.
async fn collect_files(mut multipart: Multipart) -> Result<Vec<UploadedFile>, AppError> {
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        // A plain value, or a file input submitted with nothing selected.
        let Some(file_name) = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
        else {
            tracing::debug!("Skipping non-file part in field {}", UPLOAD_FIELD);
            continue;
        };
        let name = validate_file_name(&file_name)?.to_string();
        let data = field.bytes().await?;

        tracing::debug!("Received part {} ({} bytes)", name, data.len());
        files.push(UploadedFile { name, data });
    }

    Ok(files)
}

#[utoipa::path(
    post,
    path = "/gcp-upload",
    request_body(content = Multipart, description = "One or more file parts under the repeated `files` field", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "All files uploaded", body = String, content_type = "text/plain"),
        (status = 400, description = "Malformed multipart body or rejected file name"),
        (status = 413, description = "Upload exceeds the configured size ceiling"),
        (status = 502, description = "Storage rejected a write; earlier files in the batch stay written")
    ),
    tag = "storage"
)]
pub async fn upload_files(
    State(state): State<AppState>,
    Extension(cancel): Extension<CancellationToken>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    let files = collect_files(multipart?).await?;
    let count = files.len();

    let report = state.gateway.upload_batch(files, &cancel).await;
    AppError::check_batch(report)?;

    tracing::info!("📦 Upload batch of {} file(s) complete", count);
    Ok((
        [(header::CONTENT_TYPE, mime::TEXT_PLAIN_UTF_8.to_string())],
        UPLOAD_SUCCESS_MESSAGE,
    ))
}
