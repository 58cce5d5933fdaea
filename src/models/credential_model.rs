//! models/credential_model.rs
//! Credenciales OAuth por proveedor de correo.

use std::fmt;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Proveedor de correo soportado. En las rutas se acepta "google" como alias de Gmail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[serde(alias = "google")]
    Gmail,
    Zoho,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Gmail => "gmail",
            Provider::Zoho => "zoho",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessCredential {
    pub access_token: String,
    /// Sin expiración conocida la credencial se considera inválida.
    pub expires_at: Option<DateTime<Utc>>,
    pub refresh_token: Option<String>,
}

impl AccessCredential {
    pub fn new(access_token: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at,
            refresh_token: None,
        }
    }

    /// Crea la credencial a partir de `expires_in` (segundos) relativo a `now`.
    /// Falla si la fecha resultante no es representable.
    pub fn expiring_in(
        access_token: impl Into<String>,
        expires_in_secs: i64,
        refresh_token: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let expires_at = expiry_after(now, expires_in_secs)
            .ok_or_else(|| anyhow!("expires_in fuera de rango: {}", expires_in_secs))?;
        Ok(Self {
            access_token: access_token.into(),
            expires_at: Some(expires_at),
            refresh_token,
        })
    }

    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        if self.access_token.trim().is_empty() {
            return false;
        }
        match self.expires_at {
            Some(expiry) => now < expiry,
            None => false,
        }
    }
}

/// `now + secs`, o None si no cabe en un `DateTime<Utc>`.
pub fn expiry_after(now: DateTime<Utc>, secs: i64) -> Option<DateTime<Utc>> {
    Duration::try_seconds(secs).and_then(|delta| now.checked_add_signed(delta))
}

/// Respuesta del token endpoint (Google y Zoho comparten el formato).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Lo que devolvemos al cliente tras un intercambio: nunca el token en sí.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialStatusResponse {
    pub provider: Provider,
    pub valid: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub has_refresh_token: bool,
    pub scope: Option<String>,
}

/// PUT /api/{provider}/token
#[derive(Debug, Clone, Deserialize)]
pub struct SetTokenRequest {
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub expires_in: Option<i64>,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
}
