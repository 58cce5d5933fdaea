//! services/dispatch_service.rs
//! Despachador de lotes: personaliza cada fila y la envía de forma estrictamente
//! secuencial, esperando `send_interval` entre el fin de un intento y el inicio del
//! siguiente. Un fallo de fila no aborta el lote.

use std::{collections::HashSet, sync::Arc};

use chrono::{DateTime, Utc};
use tokio::{sync::watch, time::Instant};
use uuid::Uuid;

use crate::{
    config::dispatch_config::DispatchConfig,
    errors::DispatchError,
    models::{
        campaign_model::{BatchState, BatchSummary, CampaignRequest, DispatchOutcome, OutcomeStatus, Row},
        credential_model::{AccessCredential, Provider},
    },
    services::{
        mail_transport::{MailTransport, TransportRegistry},
        progress_tracker::ProgressTracker,
        template_service,
        token_store::TokenStore,
    },
};

pub const MISSING_RECIPIENT: &str = "missing recipient";
pub const CANCELLED: &str = "cancelled";

/// Lo que el lote necesita del exterior: contadores a actualizar y señal de cancelación.
pub struct BatchControl {
    pub batch_id: Uuid,
    /// Se resetean al entrar en Running y se incrementan por cada envío exitoso.
    pub trackers: Vec<ProgressTracker>,
    pub cancel: watch::Receiver<bool>,
}

impl BatchControl {
    pub fn new(batch_id: Uuid, trackers: Vec<ProgressTracker>, cancel: watch::Receiver<bool>) -> Self {
        Self {
            batch_id,
            trackers,
            cancel,
        }
    }

    fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }
}

/// Se resuelve cuando llega la cancelación. Si el emisor desaparece, nunca se resuelve.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[derive(Clone)]
pub struct DispatchService {
    config: DispatchConfig,
    token_store: TokenStore,
    transports: TransportRegistry,
}

impl DispatchService {
    pub fn new(config: DispatchConfig, token_store: TokenStore, transports: TransportRegistry) -> Self {
        Self {
            config,
            token_store,
            transports,
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Precondiciones del lote. No tiene efectos: ni resetea contadores ni llama al proveedor.
    pub fn validate(
        &self,
        campaign: &CampaignRequest,
    ) -> Result<(Arc<dyn MailTransport>, AccessCredential), DispatchError> {
        if campaign.rows.is_empty() {
            return Err(DispatchError::EmptyRows);
        }
        if campaign.template.trim().is_empty() {
            return Err(DispatchError::EmptyTemplate);
        }
        if campaign.subject.trim().is_empty() {
            return Err(DispatchError::EmptySubject);
        }
        let transport = self
            .transports
            .get(campaign.provider)
            .ok_or(DispatchError::UnsupportedProvider(campaign.provider))?;
        transport
            .ensure_configured()
            .map_err(|e| DispatchError::ProviderMisconfigured {
                provider: campaign.provider,
                reason: format!("{:#}", e),
            })?;
        let credential = self
            .token_store
            .valid_credential(campaign.provider, Utc::now())?;
        Ok((transport, credential))
    }

    /// Primera columna candidata con valor no vacío.
    pub fn resolve_recipient(&self, row: &Row) -> Option<String> {
        self.config
            .recipient_columns
            .iter()
            .filter_map(|col| template_service::column(row, col))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
            .map(|v| v.to_string())
    }

    /// Ejecuta un lote completo. Los errores de precondición se devuelven antes de
    /// cualquier efecto; una vez en Running siempre se devuelve un resumen (Completed
    /// o Failed("cancelled")).
    pub async fn run_batch(
        &self,
        campaign: CampaignRequest,
        mut control: BatchControl,
    ) -> Result<BatchSummary, DispatchError> {
        let (transport, initial_credential) = self.validate(&campaign)?;
        let provider = campaign.provider;
        let batch_id = control.batch_id;
        let started_at = Utc::now();

        // ===== RUNNING =====
        for tracker in &control.trackers {
            tracker.reset();
        }

        let received = campaign.rows.len();
        let mut rows = campaign.rows;
        rows.truncate(self.config.max_batch_size);
        let total = rows.len();
        if received > total {
            log::warn!(
                "(run_batch) Lote {}: se recibieron {} filas, sólo se procesarán {} (tope)",
                batch_id,
                received,
                total
            );
        }

        self.warn_unresolved_placeholders(batch_id, &campaign.template, &campaign.subject, &rows);

        log::info!(
            "(run_batch) Iniciando lote {} vía {}: {} filas, intervalo {:?}",
            batch_id,
            provider,
            total,
            self.config.send_interval
        );

        let mut outcomes: Vec<DispatchOutcome> = Vec::with_capacity(total);
        let mut last_attempt_done: Option<Instant> = None;

        for (index, row) in rows.iter().enumerate() {
            if control.is_cancelled() {
                return Ok(self.cancelled_summary(batch_id, provider, total, outcomes, started_at));
            }

            let subject = template_service::personalize(&campaign.subject, row);
            let body = template_service::personalize(&campaign.template, row);

            let recipient = match self.resolve_recipient(row) {
                Some(to) => to,
                None => {
                    log::warn!(
                        "(run_batch) Lote {}: fila {} sin destinatario, se omite",
                        batch_id,
                        index
                    );
                    outcomes.push(DispatchOutcome {
                        index,
                        recipient: None,
                        status: OutcomeStatus::Skipped {
                            reason: MISSING_RECIPIENT.to_string(),
                        },
                    });
                    continue;
                }
            };

            // Ritmo: desde el fin del intento anterior hasta el inicio de éste.
            if let Some(done) = last_attempt_done {
                let deadline = done + self.config.send_interval;
                tokio::select! {
                    _ = tokio::time::sleep_until(deadline) => {}
                    _ = cancelled(&mut control.cancel) => {
                        return Ok(self.cancelled_summary(batch_id, provider, total, outcomes, started_at));
                    }
                }
            }

            // Si rotaron el token desde fuera, los envíos siguientes usan el nuevo.
            let credential = self
                .token_store
                .get(provider)
                .unwrap_or_else(|| initial_credential.clone());

            let result = transport.send(&recipient, &subject, &body, &credential).await;
            last_attempt_done = Some(Instant::now());

            let status = match result {
                Ok(()) => {
                    for tracker in &control.trackers {
                        tracker.increment();
                    }
                    log::info!(
                        "(run_batch) Lote {}: [{}/{}] enviado a {}",
                        batch_id,
                        index + 1,
                        total,
                        recipient
                    );
                    OutcomeStatus::Sent
                }
                Err(e) => {
                    log::error!(
                        "(run_batch) Lote {}: [{}/{}] fallo al enviar a {}: {:?}",
                        batch_id,
                        index + 1,
                        total,
                        recipient,
                        e
                    );
                    OutcomeStatus::Failed {
                        error: format!("{:#}", e),
                    }
                }
            };

            outcomes.push(DispatchOutcome {
                index,
                recipient: Some(recipient),
                status,
            });
        }

        let summary = BatchSummary::from_outcomes(
            batch_id,
            provider,
            BatchState::Completed,
            total,
            outcomes,
            started_at,
        );
        log::info!(
            "(run_batch) Lote {} completado: {} enviados, {} omitidos, {} fallidos",
            batch_id,
            summary.sent,
            summary.skipped,
            summary.failed
        );
        Ok(summary)
    }

    fn cancelled_summary(
        &self,
        batch_id: Uuid,
        provider: Provider,
        total: usize,
        outcomes: Vec<DispatchOutcome>,
        started_at: DateTime<Utc>,
    ) -> BatchSummary {
        log::warn!(
            "(run_batch) Lote {} cancelado tras {} filas",
            batch_id,
            outcomes.len()
        );
        BatchSummary::from_outcomes(
            batch_id,
            provider,
            BatchState::Failed {
                reason: CANCELLED.to_string(),
            },
            total,
            outcomes,
            started_at,
        )
    }

    fn warn_unresolved_placeholders(&self, batch_id: Uuid, template: &str, subject: &str, rows: &[Row]) {
        let columns: HashSet<&String> = rows.iter().flat_map(|r| r.keys()).collect();
        for source in [subject, template] {
            let missing = template_service::missing_placeholders(source, columns.iter().copied());
            if !missing.is_empty() {
                log::warn!(
                    "(run_batch) Lote {}: placeholders sin columna, quedarán sin reemplazar: {:?}",
                    batch_id,
                    missing
                );
            }
        }
    }
}
