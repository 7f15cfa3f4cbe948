use crate::{controller::debug_controller, controller::health_check_controller, AppState};
use crate::{controller::index_controller, sse::handler};
use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use log::*;
use service::config::Config;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Meme SSE Debugger API"
        ),
        paths(
            debug_controller::index,
            health_check_controller::health_check,
            handler::meme_stream,
        ),
        components(
            schemas(
                sse::ConnectionRecord,
                sse::ConnectionId,
            )
        ),
        tags(
            (name = "meme_sse_debugger", description = "Random meme event stream with per-connection diagnostics")
        )
    )]
struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    let cors = cors_layer(&app_state.config);

    Router::new()
        .merge(meme_routes(app_state.clone()))
        .merge(debug_routes(app_state))
        .merge(health_routes())
        .merge(index_routes())
        .merge(RapiDoc::with_openapi("/api-docs/openapi2.json", ApiDoc::openapi()).path("/rapidoc"))
        .layer(cors)
}

fn meme_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/memes", get(handler::meme_stream))
        .with_state(app_state)
}

fn debug_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/debug", get(debug_controller::index))
        .with_state(app_state)
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn index_routes() -> Router {
    Router::new().route("/", get(index_controller::index))
}

/// Any origin when `*` is configured, otherwise exactly the configured origins.
fn cors_layer(config: &Config) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods([Method::GET, Method::HEAD, Method::POST]);

    if config.allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.trim().parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {origin:?}: {e}");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}
