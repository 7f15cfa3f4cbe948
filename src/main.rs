use domain::gateway::reddit::RedditClient;
use log::*;
use service::{config::Config, logging::Logger};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config);

    info!("Starting up Meme SSE Debugger...");
    info!(
        "Upstream: {} (refresh at most every {}s, timeout {}s); streaming every {}s; keeping {} connection logs",
        config.upstream_url(),
        config.refresh_interval_secs,
        config.upstream_timeout_secs,
        config.emit_interval_secs,
        config.max_connections(),
    );

    let reddit_client = match RedditClient::new(&config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to build the upstream HTTP client: {e}");
            std::process::exit(1);
        }
    };

    let app_state = web::AppState::new(config, reddit_client);

    if let Err(e) = web::init_server(app_state).await {
        error!("Server error: {e}");
        std::process::exit(1);
    }

    info!("Server stopped");
}
