//! services/gmail_transport.rs
//! Envío vía Gmail API: el mensaje completo (headers + cuerpo) va en base64url sin padding.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
    Engine,
};
use reqwest::Client;
use serde_json::json;

use crate::{
    models::credential_model::{AccessCredential, Provider},
    services::mail_transport::{ensure_single_line, MailTransport, SEND_TIMEOUT},
};

#[derive(Clone)]
pub struct GmailTransport {
    http_client: Client,
    base_url: String,
}

impl GmailTransport {
    pub fn new(http_client: Client, base_url: String) -> Self {
        Self {
            http_client,
            base_url,
        }
    }

    fn send_url(&self) -> String {
        format!(
            "{}/gmail/v1/users/me/messages/send",
            self.base_url.trim_end_matches('/')
        )
    }
}

/// Subject con caracteres no ASCII va como encoded-word (RFC 2047).
fn encode_subject(subject: &str) -> String {
    if subject.is_ascii() {
        subject.to_string()
    } else {
        format!("=?UTF-8?B?{}?=", STANDARD.encode(subject.as_bytes()))
    }
}

/// Arma el mensaje RFC 822 en texto plano y lo codifica como espera Gmail (`raw`).
pub fn build_raw_message(recipient: &str, subject: &str, body: &str) -> Result<String> {
    ensure_single_line("to", recipient)?;
    ensure_single_line("subject", subject)?;

    let message = format!(
        "Content-Type: text/plain; charset=\"UTF-8\"\r\n\
         MIME-Version: 1.0\r\n\
         To: {}\r\n\
         Subject: {}\r\n\
         \r\n\
         {}",
        recipient,
        encode_subject(subject),
        body
    );

    Ok(URL_SAFE_NO_PAD.encode(message.as_bytes()))
}

#[async_trait]
impl MailTransport for GmailTransport {
    fn provider(&self) -> Provider {
        Provider::Gmail
    }

    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
        credential: &AccessCredential,
    ) -> Result<()> {
        let raw = build_raw_message(recipient, subject, body)?;

        let request = self
            .http_client
            .post(self.send_url())
            .bearer_auth(&credential.access_token)
            .json(&json!({ "raw": raw }))
            .send();

        let resp = tokio::time::timeout(SEND_TIMEOUT, request)
            .await
            .context("Timeout enviando a Gmail")?
            .context("Fallo al hacer POST a Gmail messages/send")?;

        let status = resp.status();
        if !status.is_success() {
            let body_txt = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Gmail respondió {}: {}", status, body_txt));
        }

        let data = resp.json::<serde_json::Value>().await.unwrap_or_default();
        log::debug!(
            "(gmail_transport) Mensaje aceptado para {}, id={:?}",
            recipient,
            data.get("id")
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use wiremock::matchers::{bearer_token, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credential() -> AccessCredential {
        AccessCredential::expiring_in("gmail-token", 3600, None, Utc::now()).unwrap()
    }

    fn decode(raw: &str) -> String {
        String::from_utf8(URL_SAFE_NO_PAD.decode(raw).unwrap()).unwrap()
    }

    #[test]
    fn raw_message_has_headers_and_body() {
        let raw = build_raw_message("ana@example.com", "Hola", "Cuerpo del mensaje").unwrap();
        assert!(!raw.contains('='));
        assert!(!raw.contains('+'));
        assert!(!raw.contains('/'));

        let decoded = decode(&raw);
        assert!(decoded.starts_with("Content-Type: text/plain; charset=\"UTF-8\"\r\n"));
        assert!(decoded.contains("MIME-Version: 1.0\r\n"));
        assert!(decoded.contains("To: ana@example.com\r\n"));
        assert!(decoded.contains("Subject: Hola\r\n\r\nCuerpo del mensaje"));
    }

    #[test]
    fn non_ascii_subject_is_encoded() {
        let decoded = decode(&build_raw_message("a@b.com", "Año nuevo", "x").unwrap());
        assert!(decoded.contains("Subject: =?UTF-8?B?"));
    }

    #[test]
    fn header_injection_is_rejected() {
        assert!(build_raw_message("a@b.com\r\nBcc: x@y.com", "s", "b").is_err());
        assert!(build_raw_message("a@b.com", "s\nBcc: x@y.com", "b").is_err());
    }

    #[tokio::test]
    async fn sends_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/gmail/v1/users/me/messages/send"))
            .and(bearer_token("gmail-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "abc" })))
            .expect(1)
            .mount(&server)
            .await;

        let transport = GmailTransport::new(Client::new(), server.uri());
        transport
            .send("ana@example.com", "Hola", "Texto", &credential())
            .await
            .expect("send should succeed");

        let requests = server.received_requests().await.unwrap();
        let payload: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let decoded = decode(payload["raw"].as_str().unwrap());
        assert!(decoded.contains("To: ana@example.com"));
    }

    #[tokio::test]
    async fn provider_rejection_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/gmail/v1/users/me/messages/send"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid credentials"))
            .mount(&server)
            .await;

        let transport = GmailTransport::new(Client::new(), server.uri());
        let err = transport
            .send("ana@example.com", "Hola", "Texto", &credential())
            .await
            .unwrap_err();
        let detail = err.to_string();
        assert!(detail.contains("401"), "detail: {}", detail);
        assert!(detail.contains("invalid credentials"), "detail: {}", detail);
    }
}
