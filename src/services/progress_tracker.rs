//! services/progress_tracker.rs
//! Contador de correos enviados con éxito en el lote actual.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

/// Handle compartido: los clones apuntan al mismo contador.
#[derive(Clone, Debug, Default)]
pub struct ProgressTracker {
    sent: Arc<AtomicU64>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sólo al inicio de un lote, antes del primer envío.
    pub fn reset(&self) {
        self.sent.store(0, Ordering::SeqCst);
    }

    pub fn increment(&self) {
        self.sent.fetch_add(1, Ordering::SeqCst);
    }

    pub fn read(&self) -> u64 {
        self.sent.load(Ordering::SeqCst)
    }
}
