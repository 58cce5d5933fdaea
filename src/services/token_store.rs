//! services/token_store.rs
//! Credencial OAuth vigente por proveedor. Sólo se reemplaza completa; nunca se mezcla.

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use chrono::{DateTime, Utc};

use crate::{
    config::provider_config::ProviderConfig,
    errors::DispatchError,
    models::credential_model::{AccessCredential, Provider},
};

#[derive(Clone, Default)]
pub struct TokenStore {
    credentials: Arc<RwLock<HashMap<Provider, AccessCredential>>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Siembra tokens definidos en el entorno (GOOGLE_ACCESS_TOKEN / ZOHO_ACCESS_TOKEN).
    pub fn from_config(config: &ProviderConfig) -> Self {
        let store = Self::new();
        let now = Utc::now();

        let seeds = [
            (Provider::Gmail, &config.google.seeded_access_token, config.google.seeded_expires_in),
            (Provider::Zoho, &config.zoho.seeded_access_token, config.zoho.seeded_expires_in),
        ];
        for (provider, token, ttl) in seeds {
            let Some(token) = token else { continue };
            match AccessCredential::expiring_in(token.clone(), ttl, None, now) {
                Ok(credential) => {
                    log::info!(
                        "(token_store) Token de {} sembrado desde el entorno, expira en {}s",
                        provider,
                        ttl
                    );
                    store.set(provider, credential);
                }
                Err(e) => log::warn!("(token_store) Token de {} ignorado: {:#}", provider, e),
            }
        }

        store
    }

    pub fn set(&self, provider: Provider, credential: AccessCredential) {
        let mut guard = self
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        guard.insert(provider, credential);
    }

    pub fn get(&self, provider: Provider) -> Option<AccessCredential> {
        let guard = self
            .credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        guard.get(&provider).cloned()
    }

    pub fn is_valid(&self, provider: Provider, now: DateTime<Utc>) -> bool {
        self.get(provider)
            .map(|cred| cred.is_valid(now))
            .unwrap_or(false)
    }

    /// Credencial utilizable ahora mismo o `Unauthenticated`.
    pub fn valid_credential(
        &self,
        provider: Provider,
        now: DateTime<Utc>,
    ) -> Result<AccessCredential, DispatchError> {
        match self.get(provider) {
            Some(cred) if cred.is_valid(now) => Ok(cred),
            _ => Err(DispatchError::Unauthenticated(provider)),
        }
    }
}
