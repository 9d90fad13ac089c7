//! Request capture middleware.
//! Snapshots and logs every request before routing.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::http::request::{extract, BodyCapture, Captured};
use crate::http::server::AppState;
use crate::observability::metrics;

/// Capture the request once, log it, and pass the snapshot on to the handler.
///
/// Handlers read the snapshot from the `Arc<RequestSnapshot>` extension and
/// must not read the body again. Bodies over the configured limit are logged
/// and answered with `413` without reaching a handler.
pub async fn capture_requests(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();

    let Captured {
        snapshot,
        mut request,
        body,
    } = extract(request, state.max_body_size).await;
    state.logger.log(&snapshot, None);
    let snapshot = Arc::new(snapshot);

    let response = if body == BodyCapture::TooLarge {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(json!({ "error": "Request body too large" })),
        )
            .into_response()
    } else {
        request.extensions_mut().insert(Arc::clone(&snapshot));
        next.run(request).await
    };

    tracing::debug!(
        method = %snapshot.method,
        path = %snapshot.path,
        status = response.status().as_u16(),
        "Request answered"
    );
    metrics::record_request(&snapshot.method, response.status().as_u16(), start);

    response
}
