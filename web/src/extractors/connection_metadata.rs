use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::request::Parts,
};
use sse::RequestHeaders;
use std::convert::Infallible;
use std::net::SocketAddr;

/// Peer address and raw request headers of an incoming stream request, as recorded
/// in the connection log.
pub(crate) struct ConnectionMetadata {
    pub remote_addr: String,
    pub request_headers: RequestHeaders,
}

#[async_trait]
impl<S> FromRequestParts<S> for ConnectionMetadata
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    // The peer address is only known when the router is served with connect info;
    // without it the connection is logged with an "unknown" address rather than rejected.
    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let remote_addr = ConnectInfo::<SocketAddr>::from_request_parts(parts, state)
            .await
            .map(|ConnectInfo(addr)| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        let mut request_headers = RequestHeaders::new();
        for (name, value) in parts.headers.iter() {
            request_headers
                .entry(name.as_str().to_string())
                .or_default()
                .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
        }

        Ok(ConnectionMetadata {
            remote_addr,
            request_headers,
        })
    }
}
