//! services/batch_registry.rs
//! Lotes en curso y terminados, indexados por id. Cada lote tiene su propio
//! contador de progreso; el contador global (`/api/email/sent-count`) refleja
//! el lote más reciente.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tokio::{sync::watch, task::JoinError};
use uuid::Uuid;

use crate::{
    errors::DispatchError,
    models::{
        campaign_model::{BatchState, BatchStatusResponse, BatchSummary, CampaignRequest},
        credential_model::Provider,
    },
    services::{
        dispatch_service::{BatchControl, DispatchService},
        progress_tracker::ProgressTracker,
    },
};

/// Cuántos lotes terminados se conservan para consulta.
const MAX_FINISHED_BATCHES: usize = 50;

struct BatchEntry {
    provider: Provider,
    state: BatchState,
    progress: ProgressTracker,
    cancel: watch::Sender<bool>,
    summary: Option<BatchSummary>,
}

#[derive(Default)]
struct Batches {
    entries: HashMap<Uuid, BatchEntry>,
    finished: VecDeque<Uuid>,
}

impl Batches {
    fn running(&self) -> Option<Uuid> {
        self.entries
            .iter()
            .find(|(_, e)| e.state == BatchState::Running)
            .map(|(id, _)| *id)
    }
}

#[derive(Clone)]
pub struct BatchRegistry {
    dispatch: DispatchService,
    global: ProgressTracker,
    batches: Arc<Mutex<Batches>>,
}

impl BatchRegistry {
    pub fn new(dispatch: DispatchService) -> Self {
        Self {
            dispatch,
            global: ProgressTracker::new(),
            batches: Arc::new(Mutex::new(Batches::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Batches> {
        self.batches.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Contador global; conserva el último valor tras terminar el lote.
    pub fn sent_count(&self) -> u64 {
        self.global.read()
    }

    /// Valida y registra el lote como Running. Sin efectos si falla.
    fn begin(&self, campaign: &CampaignRequest) -> Result<BatchControl, DispatchError> {
        self.dispatch.validate(campaign)?;

        let mut batches = self.lock();
        if !self.dispatch.config().allow_concurrent_batches {
            if let Some(running) = batches.running() {
                return Err(DispatchError::BatchInProgress(running));
            }
        }

        let batch_id = Uuid::new_v4();
        let progress = ProgressTracker::new();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        batches.entries.insert(
            batch_id,
            BatchEntry {
                provider: campaign.provider,
                state: BatchState::Running,
                progress: progress.clone(),
                cancel: cancel_tx,
                summary: None,
            },
        );

        Ok(BatchControl::new(
            batch_id,
            vec![self.global.clone(), progress],
            cancel_rx,
        ))
    }

    fn finish(&self, batch_id: Uuid, result: &Result<BatchSummary, DispatchError>) {
        let mut batches = self.lock();
        if let Some(entry) = batches.entries.get_mut(&batch_id) {
            match result {
                Ok(summary) => {
                    entry.state = summary.state.clone();
                    entry.summary = Some(summary.clone());
                }
                Err(e) => {
                    entry.state = BatchState::Failed {
                        reason: e.to_string(),
                    };
                }
            }
        }

        batches.finished.push_back(batch_id);
        while batches.finished.len() > MAX_FINISHED_BATCHES {
            if let Some(old) = batches.finished.pop_front() {
                batches.entries.remove(&old);
            }
        }
    }

    /// Lanza el lote en una tarea propia; si quien espera desaparece, el lote sigue.
    fn launch(
        &self,
        campaign: CampaignRequest,
    ) -> Result<(Uuid, tokio::task::JoinHandle<Result<BatchSummary, DispatchError>>), DispatchError> {
        let control = self.begin(&campaign)?;
        let batch_id = control.batch_id;
        let registry = self.clone();

        let handle = tokio::spawn(async move {
            let result = registry.dispatch.run_batch(campaign, control).await;
            registry.finish(batch_id, &result);
            result
        });

        Ok((batch_id, handle))
    }

    /// La tarea murió (panic) sin llegar a `finish`: el lote queda Failed.
    fn task_failed(&self, batch_id: Uuid, e: JoinError) -> Result<BatchSummary, DispatchError> {
        log::error!("(batch_registry) La tarea del lote {} terminó mal: {}", batch_id, e);
        let result = Err(DispatchError::Internal(format!("batch task failed: {}", e)));
        self.finish(batch_id, &result);
        result
    }

    /// Ejecuta el lote y espera el resumen final.
    pub async fn run(&self, campaign: CampaignRequest) -> Result<BatchSummary, DispatchError> {
        let (batch_id, handle) = self.launch(campaign)?;
        match handle.await {
            Ok(result) => result,
            Err(e) => self.task_failed(batch_id, e),
        }
    }

    /// Lanza el lote en background y devuelve su id de inmediato.
    pub fn spawn(&self, campaign: CampaignRequest) -> Result<Uuid, DispatchError> {
        let (batch_id, handle) = self.launch(campaign)?;
        log::info!("(batch_registry) Lote {} encolado en background", batch_id);

        let registry = self.clone();
        tokio::spawn(async move {
            if let Err(e) = handle.await {
                let _ = registry.task_failed(batch_id, e);
            }
        });
        Ok(batch_id)
    }

    pub fn status(&self, batch_id: Uuid) -> Result<BatchStatusResponse, DispatchError> {
        let batches = self.lock();
        let entry = batches
            .entries
            .get(&batch_id)
            .ok_or(DispatchError::BatchNotFound(batch_id))?;

        Ok(BatchStatusResponse {
            batch_id,
            provider: entry.provider,
            state: entry.state.clone(),
            sent_count: entry.progress.read(),
            summary: entry.summary.clone(),
        })
    }

    /// Pide la cancelación; el lote se detiene en el próximo límite entre filas.
    pub fn cancel(&self, batch_id: Uuid) -> Result<BatchState, DispatchError> {
        let batches = self.lock();
        let entry = batches
            .entries
            .get(&batch_id)
            .ok_or(DispatchError::BatchNotFound(batch_id))?;

        if !entry.state.is_terminal() {
            log::info!("(batch_registry) Cancelación solicitada para lote {}", batch_id);
            // Si el receptor ya no existe el lote terminó; no hay nada que cancelar.
            let _ = entry.cancel.send(true);
        }
        Ok(entry.state.clone())
    }
}
