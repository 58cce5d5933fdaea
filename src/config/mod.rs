//! config/mod.rs
//! Configuración leída del entorno (.env vía dotenv).

pub mod dispatch_config;
pub mod provider_config;

/// Lee una variable de entorno, tratando los valores vacíos como ausentes.
pub(crate) fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
