//! handlers/mod.rs
//! Módulo que agrupa los distintos handlers (lotes de email, proveedores/OAuth).

use actix_web::HttpResponse;
use serde_json::json;

use crate::errors::DispatchError;

pub mod email_handler;
pub mod provider_handler;

/// Respuesta uniforme para errores previos al lote.
pub fn dispatch_error_response(e: &DispatchError) -> HttpResponse {
    HttpResponse::build(e.status_code()).json(json!({
        "success": false,
        "error": e.to_string()
    }))
}
