use crate::connection::{ConnectionId, ConnectionRegistry, RequestHeaders};
use crate::message::Message;
use domain::error::Error;
use domain::ContentCache;
use log::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Pause between two memes on the same stream.
pub const DEFAULT_EMIT_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Starting,
    Streaming,
    Closed,
}

/// Why a streaming loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The receiving side of the stream went away.
    ClientDisconnected,
    ServerShutdown,
    /// Writing a message to the stream failed.
    SendFailed,
    /// `run` was called on a session that never reached `Streaming`.
    NotStreaming,
}

/// Server-side lifetime of one client's meme stream.
///
/// `open` moves the session from `Starting` to `Streaming` (or straight to `Closed`
/// when the cache refresh fails). `run` then emits one random meme per
/// `emit_interval` into the sink until the sink closes, a send fails or the
/// server shuts down. A closed session is never reopened.
pub struct StreamSession {
    cache: Arc<ContentCache>,
    registry: Arc<ConnectionRegistry>,
    emit_interval: Duration,
    id: Option<ConnectionId>,
    state: SessionState,
}

impl StreamSession {
    pub fn new(
        cache: Arc<ContentCache>,
        registry: Arc<ConnectionRegistry>,
        emit_interval: Duration,
    ) -> Self {
        Self {
            cache,
            registry,
            emit_interval,
            id: None,
            state: SessionState::Starting,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn id(&self) -> Option<&ConnectionId> {
        self.id.as_ref()
    }

    /// Register the connection, log its headers and make sure the cache is fresh.
    ///
    /// A refresh failure is recorded on the connection log, closes the session and
    /// is handed back so the caller can fail the request.
    pub async fn open(
        &mut self,
        remote_addr: String,
        request_headers: RequestHeaders,
    ) -> Result<ConnectionId, Error> {
        let header_events: Vec<String> = request_headers
            .iter()
            .map(|(name, values)| format!("Header: {name} = {}", values.join(", ")))
            .collect();

        let id = self.registry.register(remote_addr.clone(), request_headers);
        self.id = Some(id.clone());
        self.registry.append_event(&id, "Connection Established");

        info!("SSE connection received from {remote_addr} (ID: {id})");
        for event in header_events {
            debug!("{id} {event}");
            self.registry.append_event(&id, event);
        }

        if let Err(err) = self.cache.refresh().await {
            error!("Closing connection {id}, meme fetch failed: {err}");
            self.registry
                .append_event(&id, format!("Meme Fetch Error: {err}"));
            self.state = SessionState::Closed;
            return Err(err);
        }

        self.state = SessionState::Streaming;
        Ok(id)
    }

    /// Stream memes into `sink` until the connection ends.
    ///
    /// Cancellation is observed while sleeping as well as while waiting for the
    /// sink to accept a message, so a disconnect or shutdown ends the loop without
    /// waiting out the emit interval.
    pub async fn run(
        &mut self,
        sink: mpsc::Sender<Message>,
        mut shutdown: watch::Receiver<bool>,
    ) -> CloseReason {
        let id = match (&self.id, self.state) {
            (Some(id), SessionState::Streaming) => id.clone(),
            _ => return CloseReason::NotStreaming,
        };

        let reason = loop {
            if sink.is_closed() {
                break CloseReason::ClientDisconnected;
            }

            let message = Message::new(self.cache.pick_random(), &id);
            tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => break CloseReason::ServerShutdown,
                sent = sink.send(message) => {
                    if let Err(err) = sent {
                        warn!("Error sending event for {id}: {err}");
                        self.registry
                            .append_event(&id, format!("Event Send Error: {err}"));
                        break CloseReason::SendFailed;
                    }
                }
            }

            tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => break CloseReason::ServerShutdown,
                _ = sink.closed() => break CloseReason::ClientDisconnected,
                _ = tokio::time::sleep(self.emit_interval) => {}
            }
        };

        match reason {
            CloseReason::ClientDisconnected => {
                self.registry.append_event(&id, "Client connection closed")
            }
            CloseReason::ServerShutdown => self.registry.append_event(&id, "Server shutting down"),
            CloseReason::SendFailed | CloseReason::NotStreaming => {}
        }
        info!("Connection {id} closed ({reason:?})");

        self.state = SessionState::Closed;
        reason
    }
}

/// Resolves once shutdown is signalled, or once nobody can signal it anymore.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}
