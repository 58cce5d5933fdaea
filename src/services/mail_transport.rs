//! services/mail_transport.rs
//! Contrato común de envío para los proveedores (Gmail, Zoho).

use std::{collections::HashMap, sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;

use crate::{
    config::provider_config::ProviderConfig,
    models::credential_model::{AccessCredential, Provider},
    services::{gmail_transport::GmailTransport, zoho_transport::ZohoTransport},
};

/// Tiempo máximo para una llamada al proveedor
pub const SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Un envío autenticado. Los errores de red o del proveedor se devuelven, nunca se tragan.
#[async_trait]
pub trait MailTransport: Send + Sync {
    fn provider(&self) -> Provider;

    /// Configuración propia del transporte (cuenta, remitente...). Se comprueba antes
    /// de arrancar un lote para no fallar fila por fila.
    fn ensure_configured(&self) -> Result<()> {
        Ok(())
    }

    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
        credential: &AccessCredential,
    ) -> Result<()>;
}

/// Transporte elegido por proveedor; la selección es por lote, no por fila.
#[derive(Clone, Default)]
pub struct TransportRegistry {
    transports: HashMap<Provider, Arc<dyn MailTransport>>,
}

impl TransportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ProviderConfig, http_client: Client) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(GmailTransport::new(
            http_client.clone(),
            config.google.api_base_url.clone(),
        )));
        registry.register(Arc::new(ZohoTransport::new(
            http_client,
            config.zoho.api_base_url.clone(),
            config.zoho.account_id.clone(),
            config.zoho.from_address.clone(),
        )));
        registry
    }

    pub fn register(&mut self, transport: Arc<dyn MailTransport>) {
        self.transports.insert(transport.provider(), transport);
    }

    pub fn get(&self, provider: Provider) -> Option<Arc<dyn MailTransport>> {
        self.transports.get(&provider).cloned()
    }
}

/// Rechaza saltos de línea en valores que terminan en un header.
pub(crate) fn ensure_single_line(field: &str, value: &str) -> Result<()> {
    if value.contains('\r') || value.contains('\n') {
        anyhow::bail!("El campo '{}' contiene saltos de línea", field);
    }
    Ok(())
}
