//! handlers/provider_handler.rs
//! Endpoints por proveedor (/api/{provider}/...): envío individual y OAuth.

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde_json::json;

use crate::{
    errors::DispatchError,
    handlers::dispatch_error_response,
    models::{
        credential_model::{
            expiry_after, AccessCredential, CredentialStatusResponse, OAuthCallbackQuery, Provider,
            SetTokenRequest,
        },
        email_model::{SendEmailRequest, SendEmailResponse},
    },
    services::{
        mail_transport::TransportRegistry, oauth_service::OAuthService, template_service,
        token_store::TokenStore,
    },
};

fn credential_status(provider: Provider, credential: &AccessCredential, scope: Option<String>) -> CredentialStatusResponse {
    CredentialStatusResponse {
        provider,
        valid: credential.is_valid(Utc::now()),
        expires_at: credential.expires_at,
        has_refresh_token: credential.refresh_token.is_some(),
        scope,
    }
}

/// POST /api/{provider}/send-email
pub async fn send_email_endpoint(
    path: web::Path<Provider>,
    transports: web::Data<TransportRegistry>,
    token_store: web::Data<TokenStore>,
    body: web::Json<SendEmailRequest>,
) -> HttpResponse {
    let provider = path.into_inner();
    let req_data = body.into_inner();

    let (to, subject) = match &req_data.row {
        Some(row) => (
            template_service::personalize(&req_data.to, row),
            template_service::personalize(&req_data.subject, row),
        ),
        None => (req_data.to.clone(), req_data.subject.clone()),
    };

    if to.trim().is_empty() || subject.trim().is_empty() || req_data.body.trim().is_empty() {
        return HttpResponse::BadRequest().json(json!({
            "success": false,
            "error": "Missing email parameters"
        }));
    }

    let credential = match token_store.valid_credential(provider, Utc::now()) {
        Ok(cred) => cred,
        Err(e) => return dispatch_error_response(&e),
    };
    let transport = match transports.get(provider) {
        Some(t) => t,
        None => return dispatch_error_response(&DispatchError::UnsupportedProvider(provider)),
    };
    if let Err(e) = transport.ensure_configured() {
        return dispatch_error_response(&DispatchError::ProviderMisconfigured {
            provider,
            reason: format!("{:#}", e),
        });
    }

    match transport
        .send(to.trim(), &subject, &req_data.body, &credential)
        .await
    {
        Ok(()) => HttpResponse::Ok().json(SendEmailResponse {
            success: true,
            recipient: to.trim().to_string(),
            message: "Email sent".to_string(),
        }),
        Err(e) => {
            log::error!("{} send email error: {:?}", provider, e);
            HttpResponse::InternalServerError().json(json!({
                "success": false,
                "error": format!("{:#}", e)
            }))
        }
    }
}

/// GET /api/{provider}/authorize
pub async fn authorize_endpoint(
    path: web::Path<Provider>,
    oauth_service: web::Data<OAuthService>,
) -> HttpResponse {
    let provider = path.into_inner();
    match oauth_service.authorization_url(provider) {
        Ok(url) => HttpResponse::Ok().json(json!({
            "success": true,
            "url": url
        })),
        Err(e) => HttpResponse::InternalServerError().json(json!({
            "success": false,
            "error": e.to_string()
        })),
    }
}

/// GET /api/{provider}/oauth-callback?code=...
pub async fn oauth_callback_endpoint(
    path: web::Path<Provider>,
    query: web::Query<OAuthCallbackQuery>,
    oauth_service: web::Data<OAuthService>,
) -> HttpResponse {
    let provider = path.into_inner();
    let code = match query.into_inner().code.filter(|c| !c.is_empty()) {
        Some(code) => code,
        None => {
            return HttpResponse::BadRequest().json(json!({
                "success": false,
                "error": "Authorization code is required"
            }))
        }
    };

    match oauth_service.exchange_code(provider, &code).await {
        Ok((credential, token)) => HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Tokens received",
            "credential": credential_status(provider, &credential, token.scope)
        })),
        Err(e) => {
            log::error!("OAuth callback error ({}): {:?}", provider, e);
            HttpResponse::InternalServerError().json(json!({
                "success": false,
                "error": format!("Failed to process OAuth callback: {}", e)
            }))
        }
    }
}

/// POST /api/{provider}/refresh
pub async fn refresh_token_endpoint(
    path: web::Path<Provider>,
    oauth_service: web::Data<OAuthService>,
) -> HttpResponse {
    let provider = path.into_inner();
    match oauth_service.refresh(provider).await {
        Ok(credential) => HttpResponse::Ok().json(json!({
            "success": true,
            "credential": credential_status(provider, &credential, None)
        })),
        Err(e) => {
            log::error!("Token refresh error ({}): {:?}", provider, e);
            HttpResponse::BadGateway().json(json!({
                "success": false,
                "error": e.to_string()
            }))
        }
    }
}

/// PUT /api/{provider}/token
/// Reemplaza la credencial completa (por ejemplo con un token obtenido fuera del servicio).
pub async fn set_token_endpoint(
    path: web::Path<Provider>,
    token_store: web::Data<TokenStore>,
    body: web::Json<SetTokenRequest>,
) -> HttpResponse {
    let provider = path.into_inner();
    let req_data = body.into_inner();

    let expires_at = match (req_data.expires_at, req_data.expires_in) {
        (Some(at), _) => Some(at),
        (None, Some(secs)) => match expiry_after(Utc::now(), secs) {
            Some(at) => Some(at),
            None => {
                log::warn!("{} expires_in fuera de rango: {}", provider, secs);
                return HttpResponse::BadRequest().json(json!({
                    "success": false,
                    "error": format!("expires_in out of range: {}", secs)
                }));
            }
        },
        (None, None) => None,
    };
    let credential = AccessCredential {
        access_token: req_data.access_token,
        expires_at,
        refresh_token: req_data.refresh_token,
    };
    let status = credential_status(provider, &credential, None);
    token_store.set(provider, credential);

    log::info!("Credencial de {} reemplazada manualmente (valid={})", provider, status.valid);
    HttpResponse::Ok().json(json!({
        "success": true,
        "credential": status
    }))
}

/// GET /api/{provider}/token
pub async fn token_status_endpoint(
    path: web::Path<Provider>,
    token_store: web::Data<TokenStore>,
) -> HttpResponse {
    let provider = path.into_inner();
    match token_store.get(provider) {
        Some(credential) => HttpResponse::Ok().json(json!({
            "success": true,
            "credential": credential_status(provider, &credential, None)
        })),
        None => dispatch_error_response(&DispatchError::Unauthenticated(provider)),
    }
}
