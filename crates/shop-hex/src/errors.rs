use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use shop_types::ports::order_repository::RepoError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Checkout could not be completed; nothing was written.
    #[error("Order failed: {0}")]
    OrderFailed(anyhow::Error),

    /// A third-party service (mail provider) did not accept the request.
    #[error("External service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        AppError::Internal(anyhow::Error::new(e))
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::OrderFailed(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unavailable(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// What the client gets to see. Causes of server-side failures stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::BadRequest(m) | AppError::NotFound(m) => m.clone(),
            AppError::OrderFailed(_) => "order could not be placed".into(),
            AppError::Unavailable(_) => "external service unavailable".into(),
            AppError::Internal(_) => "internal error".into(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.status_code();
        if code.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        let body = serde_json::to_string(&ErrorBody {
            error: self.public_message(),
        })
        .unwrap_or_else(|_| "{\"error\":\"internal serialization\"}".into());
        (code, [("content-type", "application/json")], body).into_response()
    }
}
