use actix_web::{web, HttpResponse};
use system::{PostMessage, SinceQuery};

use crate::error::ApiError;
use crate::identity::CurrentUser;
use crate::server_state::ServerState;

pub fn configure_message_handlers(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/messages")
            .route(web::post().to(post))
            .route(web::get().to(get)),
    );
}

async fn post(
    user: CurrentUser,
    session_id: web::Path<String>,
    body: web::Json<PostMessage>,
    state: web::Data<ServerState>,
) -> Result<HttpResponse, ApiError> {
    let message = state
        .sync
        .post_message(&session_id, user.id(), body.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(message))
}

async fn get(
    user: CurrentUser,
    session_id: web::Path<String>,
    query: web::Query<SinceQuery>,
    state: web::Data<ServerState>,
) -> Result<HttpResponse, ApiError> {
    let messages = state
        .sync
        .list_messages(&session_id, user.id(), &query)
        .await?;
    Ok(HttpResponse::Ok().json(messages))
}
