use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use domain::error::{DomainErrorKind, Error as DomainError, InternalErrorKind};
use log::*;

#[derive(Debug)]
pub struct Error(DomainError);

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{}", self.0)
    }
}

// Upstream failures are reported to the client as-is: the stream could not start
// and the error text is the only diagnostic the client gets.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self.0.error_kind {
            DomainErrorKind::External(_) => {
                warn!("Responding with upstream error: {}", self.0);
                (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string()).into_response()
            }
            DomainErrorKind::Internal(InternalErrorKind::Config) => {
                error!("Configuration error: {}", self.0);
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR").into_response()
            }
            DomainErrorKind::Internal(InternalErrorKind::Other(_)) => {
                error!("Internal error: {}", self.0);
                (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string()).into_response()
            }
        }
    }
}

impl<E> From<E> for Error
where
    E: Into<DomainError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::error::ExternalErrorKind;

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_error_is_500_with_error_text() {
        let error: Error = DomainError {
            source: None,
            error_kind: DomainErrorKind::External(ExternalErrorKind::Timeout),
        }
        .into();

        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "timed out fetching memes");
    }

    #[tokio::test]
    async fn test_config_error_hides_details() {
        let error: Error = DomainError {
            source: None,
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
        }
        .into();

        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "INTERNAL SERVER ERROR");
    }
}
