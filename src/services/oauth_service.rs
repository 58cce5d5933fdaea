//! services/oauth_service.rs
//! Intercambio OAuth con Google y Zoho (authorization code y refresh token).
//! El resultado se guarda en el TokenStore; el despachador sólo lo lee.

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use reqwest::Client;

use crate::{
    config::provider_config::{OAuthClientConfig, ProviderConfig, GMAIL_SEND_SCOPE, ZOHO_SEND_SCOPE},
    models::credential_model::{AccessCredential, Provider, TokenResponse},
    services::token_store::TokenStore,
};

/// Si el proveedor no informa `expires_in`, asumimos una hora.
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

#[derive(Clone)]
pub struct OAuthService {
    config: ProviderConfig,
    token_store: TokenStore,
    http_client: Client,
}

impl OAuthService {
    pub fn new(config: ProviderConfig, token_store: TokenStore, http_client: Client) -> Self {
        Self {
            config,
            token_store,
            http_client,
        }
    }

    fn client_config(&self, provider: Provider) -> &OAuthClientConfig {
        match provider {
            Provider::Gmail => &self.config.google.oauth,
            Provider::Zoho => &self.config.zoho.oauth,
        }
    }

    fn token_url(&self, provider: Provider) -> String {
        match provider {
            Provider::Gmail => format!(
                "{}/token",
                self.config.google.oauth_base_url.trim_end_matches('/')
            ),
            Provider::Zoho => format!(
                "{}/oauth/v2/token",
                self.config.zoho.accounts_base_url.trim_end_matches('/')
            ),
        }
    }

    fn client_credentials(&self, provider: Provider) -> Result<(String, String)> {
        let oauth = self.client_config(provider);
        let prefix = match provider {
            Provider::Gmail => "GOOGLE",
            Provider::Zoho => "ZOHO",
        };
        let client_id = oauth
            .client_id
            .clone()
            .ok_or_else(|| anyhow!("No se definió {}_CLIENT_ID", prefix))?;
        let client_secret = oauth
            .client_secret
            .clone()
            .ok_or_else(|| anyhow!("No se definió {}_CLIENT_SECRET", prefix))?;
        Ok((client_id, client_secret))
    }

    fn redirect_uri(&self, provider: Provider) -> Result<String> {
        self.client_config(provider)
            .redirect_uri
            .clone()
            .ok_or_else(|| anyhow!("No se definió el redirect URI para {}", provider))
    }

    /// URL a la que se redirige al usuario para autorizar el envío de correo.
    pub fn authorization_url(&self, provider: Provider) -> Result<String> {
        let oauth = self.client_config(provider);
        let client_id = oauth
            .client_id
            .as_deref()
            .ok_or_else(|| anyhow!("Falta client_id para {}", provider))?;
        let redirect_uri = self.redirect_uri(provider)?;

        let url = match provider {
            Provider::Gmail => format!(
                "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
                self.config.google.authorize_url,
                urlencoding::encode(client_id),
                urlencoding::encode(&redirect_uri),
                urlencoding::encode(GMAIL_SEND_SCOPE),
            ),
            Provider::Zoho => format!(
                "{}/oauth/v2/auth?scope={}&client_id={}&response_type=code&access_type=offline&redirect_uri={}",
                self.config.zoho.accounts_base_url.trim_end_matches('/'),
                urlencoding::encode(ZOHO_SEND_SCOPE),
                urlencoding::encode(client_id),
                urlencoding::encode(&redirect_uri),
            ),
        };
        Ok(url)
    }

    async fn request_token(&self, provider: Provider, params: &[(&str, &str)]) -> Result<TokenResponse> {
        let url = self.token_url(provider);
        log::info!("(request_token) POST {} para {}", url, provider);

        let resp = self
            .http_client
            .post(&url)
            .form(params)
            .send()
            .await
            .with_context(|| format!("Fallo al contactar el token endpoint de {}", provider))?;

        let status = resp.status();
        if !status.is_success() {
            let body_txt = resp.text().await.unwrap_or_default();
            log::error!(
                "(request_token) {} respondió {}: {}",
                provider,
                status,
                body_txt
            );
            return Err(anyhow!("Token exchange failed ({}): {}", status, body_txt));
        }

        let body_txt = resp.text().await.context("Respuesta de token ilegible")?;
        // Zoho responde 200 con {"error": "..."} cuando el código es inválido.
        if let Ok(v) = serde_json::from_str::<serde_json::Value>(&body_txt) {
            if let Some(err) = v.get("error").and_then(|e| e.as_str()) {
                return Err(anyhow!("Token exchange failed: {}", err));
            }
        }
        serde_json::from_str::<TokenResponse>(&body_txt)
            .with_context(|| format!("Respuesta de token inválida de {}", provider))
    }

    /// Intercambia el authorization code y guarda la credencial resultante.
    pub async fn exchange_code(&self, provider: Provider, code: &str) -> Result<(AccessCredential, TokenResponse)> {
        let (client_id, client_secret) = self.client_credentials(provider)?;
        let redirect_uri = self.redirect_uri(provider)?;

        let token = self
            .request_token(
                provider,
                &[
                    ("code", code),
                    ("client_id", client_id.as_str()),
                    ("client_secret", client_secret.as_str()),
                    ("redirect_uri", redirect_uri.as_str()),
                    ("grant_type", "authorization_code"),
                ],
            )
            .await?;

        let credential = AccessCredential::expiring_in(
            token.access_token.clone(),
            token.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS),
            token.refresh_token.clone(),
            Utc::now(),
        )?;
        self.token_store.set(provider, credential.clone());
        log::info!(
            "(exchange_code) Credencial de {} guardada, expira {:?}",
            provider,
            credential.expires_at
        );
        Ok((credential, token))
    }

    /// Renueva el access token con el refresh token guardado.
    pub async fn refresh(&self, provider: Provider) -> Result<AccessCredential> {
        let current = self
            .token_store
            .get(provider)
            .ok_or_else(|| anyhow!("No hay credencial guardada para {}", provider))?;
        let refresh_token = current
            .refresh_token
            .clone()
            .ok_or_else(|| anyhow!("La credencial de {} no tiene refresh token", provider))?;
        let (client_id, client_secret) = self.client_credentials(provider)?;

        let token = self
            .request_token(
                provider,
                &[
                    ("refresh_token", refresh_token.as_str()),
                    ("client_id", client_id.as_str()),
                    ("client_secret", client_secret.as_str()),
                    ("grant_type", "refresh_token"),
                ],
            )
            .await?;

        // Google y Zoho no devuelven un refresh token nuevo en cada renovación.
        let credential = AccessCredential::expiring_in(
            token.access_token,
            token.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS),
            token.refresh_token.or(Some(refresh_token)),
            Utc::now(),
        )?;
        self.token_store.set(provider, credential.clone());
        log::info!("(refresh) Credencial de {} renovada", provider);
        Ok(credential)
    }
}
