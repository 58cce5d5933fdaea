//! config/provider_config.rs
//! Credenciales de cliente OAuth y endpoints de Gmail / Zoho.

use serde::{Deserialize, Serialize};

use super::env_opt;

pub const GMAIL_API_BASE_URL: &str = "https://www.googleapis.com";
pub const GOOGLE_OAUTH_BASE_URL: &str = "https://oauth2.googleapis.com";
pub const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GMAIL_SEND_SCOPE: &str = "https://www.googleapis.com/auth/gmail.send";

pub const ZOHO_MAIL_API_BASE_URL: &str = "https://mail.zoho.com";
pub const ZOHO_ACCOUNTS_BASE_URL: &str = "https://accounts.zoho.com";
pub const ZOHO_SEND_SCOPE: &str = "ZohoMail.messages.CREATE";

/// Vida por defecto de un token sembrado desde el entorno (1 hora, igual que Google y Zoho).
pub const DEFAULT_SEEDED_TOKEN_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OAuthClientConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    pub oauth: OAuthClientConfig,
    pub api_base_url: String,
    pub oauth_base_url: String,
    pub authorize_url: String,
    pub seeded_access_token: Option<String>,
    pub seeded_expires_in: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZohoConfig {
    pub oauth: OAuthClientConfig,
    pub api_base_url: String,
    pub accounts_base_url: String,
    pub account_id: Option<String>,
    pub from_address: Option<String>,
    pub seeded_access_token: Option<String>,
    pub seeded_expires_in: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub google: GoogleConfig,
    pub zoho: ZohoConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            google: GoogleConfig {
                oauth: OAuthClientConfig::default(),
                api_base_url: GMAIL_API_BASE_URL.to_string(),
                oauth_base_url: GOOGLE_OAUTH_BASE_URL.to_string(),
                authorize_url: GOOGLE_AUTHORIZE_URL.to_string(),
                seeded_access_token: None,
                seeded_expires_in: DEFAULT_SEEDED_TOKEN_TTL_SECS,
            },
            zoho: ZohoConfig {
                oauth: OAuthClientConfig::default(),
                api_base_url: ZOHO_MAIL_API_BASE_URL.to_string(),
                accounts_base_url: ZOHO_ACCOUNTS_BASE_URL.to_string(),
                account_id: None,
                from_address: None,
                seeded_access_token: None,
                seeded_expires_in: DEFAULT_SEEDED_TOKEN_TTL_SECS,
            },
        }
    }
}

impl ProviderConfig {
    /// Las variables faltantes quedan en `None`; se reportan recién al usarlas.
    pub fn from_env() -> Self {
        let mut config = ProviderConfig::default();

        // ===== GOOGLE =====
        config.google.oauth = OAuthClientConfig {
            client_id: env_opt("GOOGLE_CLIENT_ID"),
            client_secret: env_opt("GOOGLE_CLIENT_SECRET"),
            redirect_uri: env_opt("GOOGLE_REDIRECT_URI").or_else(|| env_opt("NEXT_PUBLIC_APP_URL")),
        };
        if let Some(url) = env_opt("GMAIL_API_BASE_URL") {
            config.google.api_base_url = url;
        }
        if let Some(url) = env_opt("GOOGLE_OAUTH_BASE_URL") {
            config.google.oauth_base_url = url;
        }
        config.google.seeded_access_token = env_opt("GOOGLE_ACCESS_TOKEN");
        if let Some(ttl) = env_opt("GOOGLE_ACCESS_TOKEN_EXPIRES_IN").and_then(|v| v.parse().ok()) {
            config.google.seeded_expires_in = ttl;
        }

        // ===== ZOHO =====
        config.zoho.oauth = OAuthClientConfig {
            client_id: env_opt("ZOHO_CLIENT_ID"),
            client_secret: env_opt("ZOHO_CLIENT_SECRET"),
            redirect_uri: env_opt("ZOHO_REDIRECT_URI"),
        };
        if let Some(url) = env_opt("ZOHO_MAIL_API_BASE_URL") {
            config.zoho.api_base_url = url;
        }
        if let Some(url) = env_opt("ZOHO_ACCOUNTS_BASE_URL") {
            config.zoho.accounts_base_url = url;
        }
        config.zoho.account_id = env_opt("ZOHO_ACCOUNT_ID");
        config.zoho.from_address = env_opt("ZOHO_FROM_ADDRESS");
        config.zoho.seeded_access_token = env_opt("ZOHO_ACCESS_TOKEN");
        if let Some(ttl) = env_opt("ZOHO_ACCESS_TOKEN_EXPIRES_IN").and_then(|v| v.parse().ok()) {
            config.zoho.seeded_expires_in = ttl;
        }

        config
    }
}
