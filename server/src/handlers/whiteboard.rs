use actix_web::{web, HttpResponse};
use system::{RecordAction, SinceQuery};

use crate::error::ApiError;
use crate::identity::CurrentUser;
use crate::server_state::ServerState;

pub fn configure_whiteboard_handlers(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/whiteboard")
            .route(web::post().to(post))
            .route(web::get().to(get)),
    );
}

async fn post(
    user: CurrentUser,
    session_id: web::Path<String>,
    body: web::Json<RecordAction>,
    state: web::Data<ServerState>,
) -> Result<HttpResponse, ApiError> {
    let action = state
        .sync
        .record_action(&session_id, user.id(), body.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(action))
}

async fn get(
    user: CurrentUser,
    session_id: web::Path<String>,
    query: web::Query<SinceQuery>,
    state: web::Data<ServerState>,
) -> Result<HttpResponse, ApiError> {
    let actions = state
        .sync
        .list_actions(&session_id, user.id(), &query)
        .await?;
    Ok(HttpResponse::Ok().json(actions))
}
