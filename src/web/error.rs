//! Error type of the HTTP handlers.

use crate::error::DetectaError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WebError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("No analysis available in this session")]
    NoReport,

    #[error(transparent)]
    Detecta(#[from] DetectaError),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebError::BadRequest(_) => StatusCode::BAD_REQUEST,
            WebError::NoReport => StatusCode::NOT_FOUND,
            WebError::Detecta(e) => {
                tracing::error!("Request failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, self.to_string()).into_response()
    }
}
