//! tests/support.rs
//! Transporte falso que registra cada envío y helpers para armar lotes.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use tokio::time::Instant;

use crate::{
    config::dispatch_config::DispatchConfig,
    models::{
        campaign_model::{CampaignRequest, Row},
        credential_model::{AccessCredential, Provider},
    },
    services::{
        dispatch_service::DispatchService,
        mail_transport::{MailTransport, TransportRegistry},
        token_store::TokenStore,
    },
};

#[derive(Debug, Clone)]
pub struct SendCall {
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub token: String,
    pub started: Instant,
    pub finished: Instant,
}

pub struct RecordingTransport {
    provider: Provider,
    latency: Duration,
    fail_for: HashSet<String>,
    calls: Mutex<Vec<SendCall>>,
}

impl RecordingTransport {
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            latency: Duration::ZERO,
            fail_for: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn failing_for(mut self, recipient: &str) -> Self {
        self.fail_for.insert(recipient.to_string());
        self
    }

    pub fn calls(&self) -> Vec<SendCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
        credential: &AccessCredential,
    ) -> Result<()> {
        let started = Instant::now();
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.calls.lock().unwrap().push(SendCall {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            token: credential.access_token.clone(),
            started,
            finished: Instant::now(),
        });

        if self.fail_for.contains(recipient) {
            return Err(anyhow!("provider rejected {}", recipient));
        }
        Ok(())
    }
}

pub fn valid_credential(token: &str) -> AccessCredential {
    AccessCredential::expiring_in(token, 24 * 3600, None, Utc::now()).unwrap()
}

pub fn config_with_interval(send_interval: Duration) -> DispatchConfig {
    DispatchConfig {
        send_interval,
        ..DispatchConfig::default()
    }
}

/// Servicio con credencial válida de Gmail y el transporte falso registrado.
pub fn dispatch_service(
    config: DispatchConfig,
    transport: Arc<RecordingTransport>,
) -> (DispatchService, TokenStore) {
    let store = TokenStore::new();
    store.set(Provider::Gmail, valid_credential("token-1"));

    let mut transports = TransportRegistry::new();
    transports.register(transport);

    (DispatchService::new(config, store.clone(), transports), store)
}

pub fn row(pairs: &[(&str, &str)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn contact_rows(n: usize) -> Vec<Row> {
    (1..=n)
        .map(|i| {
            let email = format!("user{}@example.com", i);
            let name = format!("User {}", i);
            row(&[("email", email.as_str()), ("name", name.as_str())])
        })
        .collect()
}

pub fn campaign(rows: Vec<Row>) -> CampaignRequest {
    CampaignRequest {
        rows,
        template: "Hola {{ name }}, gracias por tu interés.".to_string(),
        subject: "Propuesta para {{name}}".to_string(),
        provider: Provider::Gmail,
    }
}
