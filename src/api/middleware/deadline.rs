use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::AppState;

/// Attaches a per-request [`CancellationToken`] for storage calls to observe.
///
/// The token fires when the configured deadline passes, or when the request
/// future is dropped (client disconnect).
pub async fn request_deadline(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = CancellationToken::new();
    req.extensions_mut().insert(token.clone());
    let _guard = token.clone().drop_guard();

    let timeout = state.config.request_timeout;
    let watched = token.clone();
    let path = req.uri().path().to_string();
    tokio::spawn(async move {
        tokio::select! {
            _ = watched.cancelled() => {}
            _ = tokio::time::sleep(timeout) => {
                warn!("⏱️  {} exceeded its {:?} deadline, cancelling storage calls", path, timeout);
                watched.cancel();
            }
        }
    });

    next.run(req).await
}
