use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::header,
    response::IntoResponse,
};
use tokio_util::sync::CancellationToken;

use crate::AppState;
use crate::api::error::AppError;
use crate::utils::validation::validate_object_name;

pub const DELETE_SUCCESS_MESSAGE: &str = "All requested objects were deleted from the bucket\n";

#[utoipa::path(
    delete,
    path = "/gcp-delete",
    request_body(content = Vec<String>, description = "Object names to delete, used verbatim", content_type = "application/json"),
    responses(
        (status = 200, description = "All objects deleted", body = String, content_type = "text/plain"),
        (status = 400, description = "Body is not a JSON array of names, or a name has a leading, trailing or repeated `/`"),
        (status = 404, description = "A named object does not exist; later names were not attempted. The s3 provider reports deletes of absent keys as success, as S3 itself does")
    ),
    tag = "storage"
)]
pub async fn delete_objects(
    State(state): State<AppState>,
    Extension(cancel): Extension<CancellationToken>,
    body: Result<Json<Vec<String>>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(names) = body?;
    for name in &names {
        validate_object_name(name)?;
    }
    let count = names.len();

    let report = state.gateway.delete_batch(names, &cancel).await;
    AppError::check_batch(report)?;

    tracing::info!("🧹 Delete batch of {} object(s) complete", count);
    Ok((
        [(header::CONTENT_TYPE, mime::TEXT_PLAIN_UTF_8.to_string())],
        DELETE_SUCCESS_MESSAGE,
    ))
}
