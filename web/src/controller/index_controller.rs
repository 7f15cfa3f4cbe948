use axum::response::{Html, IntoResponse};

const INDEX_HTML: &str = include_str!("../../templates/index.html");

/// GET the landing page that subscribes to the meme stream
pub async fn index() -> impl IntoResponse {
    Html(INDEX_HTML)
}
