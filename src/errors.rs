//! errors.rs
//! Errores con semántica HTTP. Los servicios devuelven `anyhow::Result` y,
//! cuando el fallo tiene un status concreto, meten un `StudioError` en la cadena.

use actix_web::{http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Try-on isn't supported for {0}. Pick upper_body, lower_body, or dresses.")]
    TryOnUnsupported(String),

    #[error("Remote model failed: {0}")]
    Upstream(String),
}

impl StudioError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            StudioError::NotFound(_) => StatusCode::NOT_FOUND,
            StudioError::BadRequest(_) => StatusCode::BAD_REQUEST,
            StudioError::TryOnUnsupported(_) => StatusCode::UNPROCESSABLE_ENTITY,
            StudioError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Status HTTP para cualquier error de la cadena; 500 si no hay `StudioError`.
pub fn status_for(err: &anyhow::Error) -> StatusCode {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<StudioError>())
        .map(StudioError::status_code)
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

pub fn error_response(err: &anyhow::Error) -> HttpResponse {
    let status = status_for(err);
    if status.is_server_error() {
        log::error!("Error procesando petición ({}): {:#}", status, err);
    } else {
        log::warn!("Petición rechazada ({}): {:#}", status, err);
    }

    HttpResponse::build(status).json(json!({
        "success": false,
        "error": format!("{:#}", err)
    }))
}
