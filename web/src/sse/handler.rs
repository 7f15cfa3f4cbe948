use crate::error::Error;
use crate::extractors::connection_metadata::ConnectionMetadata;
use crate::AppState;
use async_stream::stream;
use axum::extract::State;
use axum::http::header;
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use log::*;
use sse::StreamSession;
use std::convert::Infallible;
use tokio::sync::mpsc;

/// GET a never-ending stream of random memes, one `data:` event per emit interval.
///
/// The connection is registered and the meme cache refreshed before any byte is
/// sent, so a failed refresh surfaces as a plain 500. After that the session runs
/// on its own task and the response body drains its channel; dropping the body
/// (client disconnect) closes the channel and ends the session.
#[utoipa::path(
    get,
    path = "/memes",
    responses(
        (status = 200, description = "Event stream of `{title, url, connID}` payloads", content_type = "text/event-stream", body = String),
        (status = 500, description = "The meme cache could not be refreshed", body = String)
    )
)]
pub(crate) async fn meme_stream(
    State(app_state): State<AppState>,
    metadata: ConnectionMetadata,
) -> Result<impl IntoResponse, Error> {
    let mut session = StreamSession::new(
        app_state.content_cache.clone(),
        app_state.connection_registry.clone(),
        app_state.config.emit_interval(),
    );
    let connection_id = session
        .open(metadata.remote_addr, metadata.request_headers)
        .await?;

    // A single slot: the session waits for the client to take each meme.
    let (tx, mut rx) = mpsc::channel(1);
    let shutdown = app_state.shutdown_receiver();
    tokio::spawn(async move {
        let reason = session.run(tx, shutdown).await;
        trace!("Session task finished: {reason:?}");
    });

    let stream = stream! {
        while let Some(message) = rx.recv().await {
            yield Ok::<Event, Infallible>(Event::from(message));
        }
        debug!("SSE stream for {connection_id} drained");
    };

    Ok(([(header::CONNECTION, "keep-alive")], Sse::new(stream)))
}
