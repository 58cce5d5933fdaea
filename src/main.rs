use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use reqwest::Client;

use crate::config::{dispatch_config::DispatchConfig, provider_config::ProviderConfig};
use crate::logger::init_logger;
use crate::services::batch_registry::BatchRegistry;
use crate::services::dispatch_service::DispatchService;
use crate::services::mail_transport::TransportRegistry;
use crate::services::oauth_service::OAuthService;
use crate::services::token_store::TokenStore;

mod app;
mod config;
mod errors;
mod handlers;
mod logger;
mod models;
mod services;

#[cfg(test)]
mod tests;

fn bind_address() -> (String, u16) {
    let host = std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(5022);
    (host, port)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok(); // Cargar .env al inicio
    init_logger();

    let dispatch_config = DispatchConfig::from_env()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("{:#}", e)))?;
    let provider_config = ProviderConfig::from_env();
    log::info!(
        "Configuración de envío: intervalo={:?}, tope={} filas, columnas destinatario={:?}",
        dispatch_config.send_interval,
        dispatch_config.max_batch_size,
        dispatch_config.recipient_columns
    );

    // Un solo cliente HTTP compartido por transportes y OAuth
    let http_client = Client::new();

    let token_store = TokenStore::from_config(&provider_config);
    let transports = TransportRegistry::from_config(&provider_config, http_client.clone());
    let oauth_service = OAuthService::new(provider_config, token_store.clone(), http_client);

    let dispatch_service = DispatchService::new(dispatch_config, token_store.clone(), transports.clone());
    let batch_registry = BatchRegistry::new(dispatch_service);

    // Levantar servidor
    let (host, port) = bind_address();
    log::info!("Levantando servidor en {}:{}", host, port);
    HttpServer::new(move || {
        App::new()
            // Aumentar límite: los lotes llegan con todas las filas del CSV
            .app_data(web::JsonConfig::default().limit(8 * 1024 * 1024))
            .app_data(web::Data::new(token_store.clone()))
            .app_data(web::Data::new(transports.clone()))
            .app_data(web::Data::new(oauth_service.clone()))
            .app_data(web::Data::new(batch_registry.clone()))
            .configure(app::init_app)
    })
    .workers(1)
    .bind((host.as_str(), port))?
    .run()
    .await
}
