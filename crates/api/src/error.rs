use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// ApiError maps internal failures onto HTTP statuses with a JSON
/// `{status, message}` body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Registry(registry::Error),
    #[error(transparent)]
    ObjectStore(cloud::Error),
    #[error(transparent)]
    Pipeline(#[from] pipeline::Error),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Registry(_) | ApiError::ObjectStore(_) | ApiError::Pipeline(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

impl From<registry::Error> for ApiError {
    fn from(err: registry::Error) -> Self {
        match err {
            registry::Error::NotFound { bucket, id } => {
                ApiError::NotFound(format!("task {bucket}/{id} is not found"))
            }
            err => ApiError::Registry(err),
        }
    }
}

impl From<cloud::Error> for ApiError {
    fn from(err: cloud::Error) -> Self {
        match err {
            cloud::Error::NotFound { bucket, path } => {
                ApiError::NotFound(format!("object {bucket}/{path} was not found"))
            }
            cloud::Error::NoSuchBucket(bucket) => {
                ApiError::NotFound(format!("bucket {bucket} was not found"))
            }
            err => ApiError::ObjectStore(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Render the full cause chain, not just the top line.
        let mut message = self.to_string();
        let mut source = std::error::Error::source(&self);
        while let Some(cause) = source {
            message = format!("{message}: {cause}");
            source = cause.source();
        }

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), message = %message, "request failed");
        }

        let body = axum::Json(serde_json::json!({
            "status": status.as_u16(),
            "message": message,
        }));
        (status, body).into_response()
    }
}
