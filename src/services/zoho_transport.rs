//! services/zoho_transport.rs
//! Envío vía Zoho Mail API: campos from/to/subject/content directos, sin codificar.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::{
    models::credential_model::{AccessCredential, Provider},
    services::mail_transport::{ensure_single_line, MailTransport, SEND_TIMEOUT},
};

#[derive(Clone)]
pub struct ZohoTransport {
    http_client: Client,
    base_url: String,
    account_id: Option<String>,
    from_address: Option<String>,
}

impl ZohoTransport {
    pub fn new(
        http_client: Client,
        base_url: String,
        account_id: Option<String>,
        from_address: Option<String>,
    ) -> Self {
        Self {
            http_client,
            base_url,
            account_id,
            from_address,
        }
    }

    fn account(&self) -> Result<(&str, &str)> {
        let account_id = self
            .account_id
            .as_deref()
            .ok_or_else(|| anyhow!("No se definió ZOHO_ACCOUNT_ID"))?;
        let from_address = self
            .from_address
            .as_deref()
            .ok_or_else(|| anyhow!("No se definió ZOHO_FROM_ADDRESS"))?;
        Ok((account_id, from_address))
    }
}

/// Zoho devuelve el detalle en `message` o en `status.description`.
fn error_detail(json_val: &serde_json::Value) -> Option<String> {
    json_val
        .get("message")
        .and_then(|v| v.as_str())
        .or_else(|| {
            json_val
                .get("status")
                .and_then(|s| s.get("description"))
                .and_then(|v| v.as_str())
        })
        .map(|s| s.to_string())
}

#[async_trait]
impl MailTransport for ZohoTransport {
    fn provider(&self) -> Provider {
        Provider::Zoho
    }

    fn ensure_configured(&self) -> Result<()> {
        self.account().map(|_| ())
    }

    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
        credential: &AccessCredential,
    ) -> Result<()> {
        let (account_id, from_address) = self.account()?;
        ensure_single_line("to", recipient)?;
        ensure_single_line("subject", subject)?;

        let url = format!(
            "{}/api/accounts/{}/messages",
            self.base_url.trim_end_matches('/'),
            account_id
        );
        let payload = json!({
            "fromAddress": from_address,
            "toAddress": [recipient],
            "subject": subject,
            "content": body,
        });

        let request = self
            .http_client
            .post(&url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Zoho-oauthtoken {}", credential.access_token),
            )
            .json(&payload)
            .send();

        let resp = tokio::time::timeout(SEND_TIMEOUT, request)
            .await
            .context("Timeout enviando a Zoho")?
            .context("Fallo al hacer POST a Zoho messages")?;

        let status = resp.status();
        if !status.is_success() {
            let body_txt = resp.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<serde_json::Value>(&body_txt)
                .ok()
                .and_then(|v| error_detail(&v))
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown error")
                        .to_string()
                });
            return Err(anyhow!("Zoho respondió {}: {}", status.as_u16(), detail));
        }

        log::debug!("(zoho_transport) Mensaje aceptado para {}", recipient);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credential() -> AccessCredential {
        AccessCredential::expiring_in("zoho-token", 3600, None, Utc::now()).unwrap()
    }

    fn transport(base_url: String) -> ZohoTransport {
        ZohoTransport::new(
            Client::new(),
            base_url,
            Some("12345".to_string()),
            Some("ventas@example.com".to_string()),
        )
    }

    #[tokio::test]
    async fn posts_structured_fields_with_zoho_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/accounts/12345/messages"))
            .and(header("authorization", "Zoho-oauthtoken zoho-token"))
            .and(body_json(json!({
                "fromAddress": "ventas@example.com",
                "toAddress": ["ana@example.com"],
                "subject": "Hola Ana",
                "content": "Contenido",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": { "code": 200 } })))
            .expect(1)
            .mount(&server)
            .await;

        transport(server.uri())
            .send("ana@example.com", "Hola Ana", "Contenido", &credential())
            .await
            .expect("send should succeed");
    }

    #[tokio::test]
    async fn surfaces_provider_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/accounts/12345/messages"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({ "message": "Invalid toAddress" })),
            )
            .mount(&server)
            .await;

        let err = transport(server.uri())
            .send("bad", "s", "b", &credential())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid toAddress"));
    }

    #[tokio::test]
    async fn falls_back_to_status_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/accounts/12345/messages"))
            .respond_with(ResponseTemplate::new(503).set_body_string("<html>down</html>"))
            .mount(&server)
            .await;

        let err = transport(server.uri())
            .send("ana@example.com", "s", "b", &credential())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Service Unavailable"));
    }

    #[tokio::test]
    async fn missing_account_id_fails_before_any_request() {
        let server = MockServer::start().await;
        let transport = ZohoTransport::new(Client::new(), server.uri(), None, Some("a@b.com".into()));
        let err = transport
            .send("ana@example.com", "s", "b", &credential())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ZOHO_ACCOUNT_ID"));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[test]
    fn readiness_requires_account_and_sender() {
        let ready = ZohoTransport::new(Client::new(), "http://zoho".into(), Some("1".into()), Some("a@b.com".into()));
        assert!(ready.ensure_configured().is_ok());

        let no_sender = ZohoTransport::new(Client::new(), "http://zoho".into(), Some("1".into()), None);
        let err = no_sender.ensure_configured().unwrap_err();
        assert!(err.to_string().contains("ZOHO_FROM_ADDRESS"));
    }
}
