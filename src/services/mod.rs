//! services/mod.rs
//! Módulo que agrupa los "servicios" o "capas de negocio" de la app.

pub mod batch_registry;
pub mod dispatch_service;
pub mod gmail_transport;
pub mod mail_transport;
pub mod oauth_service;
pub mod progress_tracker;
pub mod template_service;
pub mod token_store;
pub mod zoho_transport;
