use serde::{Deserialize, Serialize};

use crate::models::campaign_model::Row;

/// POST /api/{provider}/send-email
/// Envío individual. Si viene `row`, se personalizan `to` y `subject` con sus valores.
#[derive(Debug, Clone, Deserialize)]
pub struct SendEmailRequest {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub row: Option<Row>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendEmailResponse {
    pub success: bool,
    pub recipient: String,
    pub message: String,
}
