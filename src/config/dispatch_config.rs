//! config/dispatch_config.rs
//! Parámetros del despachador de lotes (ritmo de envío, tamaño máximo, etc.)

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::env_opt;

/// Intervalo por defecto entre envíos: 3 minutos.
pub const DEFAULT_SEND_INTERVAL: Duration = Duration::from_secs(180);
/// Perfil rápido ("SEND_PROFILE=fast"): 1 minuto.
pub const FAST_SEND_INTERVAL: Duration = Duration::from_secs(60);
/// Tope de filas por lote; el resto se descarta sin registrarse.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 450;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Espera entre el fin de un intento y el inicio del siguiente.
    pub send_interval: Duration,
    pub max_batch_size: usize,
    /// Columnas candidatas para el destinatario, en orden de prioridad.
    pub recipient_columns: Vec<String>,
    /// Si es false, sólo puede correr un lote a la vez (el contador global lo requiere).
    pub allow_concurrent_batches: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        DispatchConfig {
            send_interval: DEFAULT_SEND_INTERVAL,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            recipient_columns: vec!["email".to_string(), "Email".to_string(), "to".to_string()],
            allow_concurrent_batches: false,
        }
    }
}

impl DispatchConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = DispatchConfig::default();

        if env_opt("SEND_PROFILE").as_deref() == Some("fast") {
            config.send_interval = FAST_SEND_INTERVAL;
        }

        if let Some(secs) = env_opt("SEND_INTERVAL_SECS") {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("SEND_INTERVAL_SECS inválido: {}", secs))?;
            config.send_interval = Duration::from_secs(secs);
        }

        if let Some(max) = env_opt("MAX_BATCH_SIZE") {
            config.max_batch_size = max
                .parse()
                .with_context(|| format!("MAX_BATCH_SIZE inválido: {}", max))?;
        }

        if let Some(columns) = env_opt("RECIPIENT_COLUMNS") {
            let columns: Vec<String> = columns
                .split(',')
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect();
            if !columns.is_empty() {
                config.recipient_columns = columns;
            }
        }

        if let Some(flag) = env_opt("ALLOW_CONCURRENT_BATCHES") {
            config.allow_concurrent_batches = matches!(flag.as_str(), "1" | "true" | "yes");
        }

        Ok(config)
    }
}
