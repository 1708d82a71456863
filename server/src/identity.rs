use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use system::{SyncError, UserId};

use crate::error::ApiError;
use crate::server_state::ServerState;

pub const DEFAULT_USER_ID_HEADER: &str = "x-user-id";

/// The verified caller. Authentication happens upstream; the gateway
/// forwards the user id in a trusted header.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser(pub UserId);

impl CurrentUser {
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl FromRequest for CurrentUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let header = req
            .app_data::<web::Data<ServerState>>()
            .map(|state| state.user_id_header.as_str())
            .unwrap_or(DEFAULT_USER_ID_HEADER);

        let user = req
            .headers()
            .get(header)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| CurrentUser(v.to_owned()));

        ready(user.ok_or_else(|| ApiError(SyncError::unauthenticated())))
    }
}
