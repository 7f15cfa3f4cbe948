use crate::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use log::*;
use sse::ConnectionRecord;

/// GET the logs of every tracked stream connection
#[utoipa::path(
    get,
    path = "/debug",
    responses(
        (status = 200, description = "Connection logs of recent and active streams, in no particular order", body = [ConnectionRecord]),
    )
)]
pub async fn index(State(app_state): State<AppState>) -> impl IntoResponse {
    let records = app_state.connection_registry.snapshot();
    debug!("Serving {} connection logs", records.len());

    Json(records)
}
