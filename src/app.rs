//! app.rs
use crate::handlers::{email_handler, provider_handler};
use actix_web::web;

pub fn init_app(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(
                web::scope("/email")
                    .route(
                        "/send-batch",
                        web::post().to(email_handler::send_batch_endpoint),
                    )
                    .route(
                        "/sent-count",
                        web::get().to(email_handler::sent_count_endpoint),
                    )
                    .route(
                        "/batches/{batch_id}",
                        web::get().to(email_handler::batch_status_endpoint),
                    )
                    .route(
                        "/batches/{batch_id}/cancel",
                        web::post().to(email_handler::cancel_batch_endpoint),
                    ),
            )
            .service(
                web::scope("/{provider}")
                    .route(
                        "/send-email",
                        web::post().to(provider_handler::send_email_endpoint),
                    )
                    .route(
                        "/authorize",
                        web::get().to(provider_handler::authorize_endpoint),
                    )
                    .route(
                        "/oauth-callback",
                        web::get().to(provider_handler::oauth_callback_endpoint),
                    )
                    .route(
                        "/refresh",
                        web::post().to(provider_handler::refresh_token_endpoint),
                    )
                    .route("/token", web::put().to(provider_handler::set_token_endpoint))
                    .route(
                        "/token",
                        web::get().to(provider_handler::token_status_endpoint),
                    ),
            ),
    );
}
