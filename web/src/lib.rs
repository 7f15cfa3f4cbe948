//! HTTP surface of the meme stream: routes, handlers and server bootstrap.

use domain::{ContentCache, ContentSource};
use log::*;
use service::config::Config;
use ::sse::ConnectionRegistry;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;

mod controller;
mod error;
mod extractors;
pub mod router;
mod sse;

/// Shared state handed to every handler. The cache and the registry are built
/// once per process and shared by every stream session.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub content_cache: Arc<ContentCache>,
    pub connection_registry: Arc<ConnectionRegistry>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl AppState {
    pub fn new(config: Config, content_source: Arc<dyn ContentSource>) -> Self {
        let content_cache = Arc::new(ContentCache::new(
            content_source,
            config.refresh_interval(),
        ));
        let connection_registry = Arc::new(ConnectionRegistry::new(config.max_connections()));
        let (shutdown, _) = watch::channel(false);

        Self {
            config,
            content_cache,
            connection_registry,
            shutdown: Arc::new(shutdown),
        }
    }

    /// A receiver that flips to `true` once the server starts shutting down.
    pub fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Tell every live stream session to close.
    pub fn signal_shutdown(&self) {
        self.shutdown.send_replace(true);
    }
}

pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let listen_address = app_state.config.listen_address();
    let listener = TcpListener::bind(&listen_address).await?;
    info!("Server starting on {listen_address}");

    let router = router::define_routes(app_state.clone());

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(app_state))
    .await
}

// Streams never finish on their own, so graceful shutdown first has to close
// every session.
async fn shutdown_signal(app_state: AppState) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for the shutdown signal: {e}");
        std::future::pending::<()>().await;
    }

    info!("Shutdown requested, closing stream sessions");
    app_state.signal_shutdown();
}
