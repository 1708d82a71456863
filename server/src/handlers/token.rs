use actix_web::{web, HttpResponse};
use system::RequestToken;

use crate::error::ApiError;
use crate::identity::CurrentUser;
use crate::server_state::ServerState;

pub fn configure_token_handlers(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/token").route(web::post().to(post)));
}

async fn post(
    user: CurrentUser,
    session_id: web::Path<String>,
    body: web::Json<RequestToken>,
    state: web::Data<ServerState>,
) -> Result<HttpResponse, ApiError> {
    let grant = state
        .sync
        .issue_token(&session_id, user.id(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(grant))
}
