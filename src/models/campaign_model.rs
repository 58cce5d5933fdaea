//! models/campaign_model.rs
//! Estructuras de un lote (batch) de envío: request, resultados por fila y resumen.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::credential_model::Provider;

/// Una fila del CSV: columna -> valor.
pub type Row = HashMap<String, String>;

#[derive(Debug, Clone, Deserialize)]
pub struct CampaignRequest {
    pub rows: Vec<Row>,
    pub template: String,
    pub subject: String,
    pub provider: Provider,
}

/// POST /api/email/send-batch
#[derive(Debug, Clone, Deserialize)]
pub struct SendBatchRequest {
    #[serde(flatten)]
    pub campaign: CampaignRequest,
    /// Si es true, el lote corre en background y respondemos de inmediato con el batch_id.
    #[serde(default)]
    pub async_send: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Sent,
    Skipped { reason: String },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub index: usize,
    pub recipient: Option<String>,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BatchState {
    Running,
    Completed,
    Failed { reason: String },
}

impl BatchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchState::Completed | BatchState::Failed { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub batch_id: Uuid,
    pub provider: Provider,
    #[serde(flatten)]
    pub state: BatchState,
    pub total_considered: usize,
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
    pub outcomes: Vec<DispatchOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchSummary {
    pub fn from_outcomes(
        batch_id: Uuid,
        provider: Provider,
        state: BatchState,
        total_considered: usize,
        outcomes: Vec<DispatchOutcome>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let mut sent = 0;
        let mut skipped = 0;
        let mut failed = 0;
        for outcome in &outcomes {
            match outcome.status {
                OutcomeStatus::Sent => sent += 1,
                OutcomeStatus::Skipped { .. } => skipped += 1,
                OutcomeStatus::Failed { .. } => failed += 1,
            }
        }

        Self {
            batch_id,
            provider,
            state,
            total_considered,
            sent,
            skipped,
            failed,
            outcomes,
            started_at,
            finished_at: Utc::now(),
        }
    }
}

/// GET /api/email/batches/{id}
#[derive(Debug, Clone, Serialize)]
pub struct BatchStatusResponse {
    pub batch_id: Uuid,
    pub provider: Provider,
    #[serde(flatten)]
    pub state: BatchState,
    pub sent_count: u64,
    pub summary: Option<BatchSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SentCountResponse {
    pub count: u64,
}
