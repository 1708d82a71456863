use crate::error::{json_error_handler, query_error_handler};
use crate::handlers::messages::configure_message_handlers;
use crate::handlers::token::configure_token_handlers;
use crate::handlers::whiteboard::configure_whiteboard_handlers;
use actix_web::{web, HttpResponse};

mod messages;
mod token;
mod whiteboard;

/// Session routes are served under both the short and the legacy public prefix.
pub const SESSION_SCOPES: [&str; 2] = [
    "/sessions/{session_id}",
    "/api/connections/active/{session_id}",
];

pub fn root(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler));

    cfg.service(web::resource("/health").route(web::get().to(health)));
    for scope in SESSION_SCOPES {
        cfg.service(web::scope(scope).configure(configure_session_handlers));
    }
}

fn configure_session_handlers(cfg: &mut web::ServiceConfig) {
    configure_message_handlers(cfg);
    configure_whiteboard_handlers(cfg);
    configure_token_handlers(cfg);
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}
