//! errors.rs
//! Errores previos al arranque de un lote. Ninguno de ellos produce envíos.

use actix_web::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::models::credential_model::Provider;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("No rows to dispatch")]
    EmptyRows,

    #[error("Email template is empty")]
    EmptyTemplate,

    #[error("Email subject is empty")]
    EmptySubject,

    #[error("No valid credential for provider '{0}' (missing or expired)")]
    Unauthenticated(Provider),

    #[error("No mail transport configured for provider '{0}'")]
    UnsupportedProvider(Provider),

    #[error("Mail transport for provider '{provider}' is misconfigured: {reason}")]
    ProviderMisconfigured { provider: Provider, reason: String },

    #[error("Batch {0} is still running")]
    BatchInProgress(Uuid),

    #[error("Batch {0} not found")]
    BatchNotFound(Uuid),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DispatchError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DispatchError::EmptyRows
            | DispatchError::EmptyTemplate
            | DispatchError::EmptySubject => StatusCode::BAD_REQUEST,
            DispatchError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            DispatchError::UnsupportedProvider(_) | DispatchError::BatchNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            DispatchError::BatchInProgress(_) => StatusCode::CONFLICT,
            DispatchError::ProviderMisconfigured { .. } => StatusCode::SERVICE_UNAVAILABLE,
            DispatchError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
