use actix_web::{web, HttpResponse};
use serde_json::json;
use uuid::Uuid;

use crate::{
    handlers::dispatch_error_response,
    models::campaign_model::{SendBatchRequest, SentCountResponse},
    services::batch_registry::BatchRegistry,
};

/// POST /api/email/send-batch
/// Síncrono por defecto: responde con el resumen cuando termina el lote.
/// Con `async_send: true` responde de inmediato con el `batch_id`.
pub async fn send_batch_endpoint(
    registry: web::Data<BatchRegistry>,
    body: web::Json<SendBatchRequest>,
) -> HttpResponse {
    let req_data = body.into_inner();
    log::info!(
        "Entrando a send_batch_endpoint: {} filas, proveedor={}, async={}",
        req_data.campaign.rows.len(),
        req_data.campaign.provider,
        req_data.async_send
    );

    if req_data.async_send {
        return match registry.spawn(req_data.campaign) {
            Ok(batch_id) => HttpResponse::Accepted().json(json!({
                "success": true,
                "batch_id": batch_id,
                "message": "Batch queued for async processing"
            })),
            Err(e) => dispatch_error_response(&e),
        };
    }

    match registry.run(req_data.campaign).await {
        Ok(summary) => HttpResponse::Ok().json(json!({
            "success": true,
            "summary": summary
        })),
        Err(e) => {
            log::error!("Batch dispatch error: {}", e);
            dispatch_error_response(&e)
        }
    }
}

/// GET /api/email/sent-count
pub async fn sent_count_endpoint(registry: web::Data<BatchRegistry>) -> HttpResponse {
    HttpResponse::Ok().json(SentCountResponse {
        count: registry.sent_count(),
    })
}

/// GET /api/email/batches/{batch_id}
pub async fn batch_status_endpoint(
    registry: web::Data<BatchRegistry>,
    path: web::Path<Uuid>,
) -> HttpResponse {
    match registry.status(path.into_inner()) {
        Ok(status) => HttpResponse::Ok().json(json!({
            "success": true,
            "status": status
        })),
        Err(e) => dispatch_error_response(&e),
    }
}

/// POST /api/email/batches/{batch_id}/cancel
pub async fn cancel_batch_endpoint(
    registry: web::Data<BatchRegistry>,
    path: web::Path<Uuid>,
) -> HttpResponse {
    let batch_id = path.into_inner();
    match registry.cancel(batch_id) {
        Ok(state) => HttpResponse::Ok().json(json!({
            "success": true,
            "batch_id": batch_id,
            "state": state,
            "message": "Cancellation requested"
        })),
        Err(e) => dispatch_error_response(&e),
    }
}
