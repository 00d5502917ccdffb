//! WebSocket upgrade endpoint (§6 `GET /ws`, C7 connection lifecycle steps 1-3).

use actix_web::{web, HttpRequest, HttpResponse};
use actix_web_actors::ws;

use crate::middleware::AuthedUser;
use crate::state::AppState;
use crate::ws::UserSocket;

pub async fn upgrade(
    req: HttpRequest,
    payload: web::Payload,
    state: web::Data<AppState>,
    user: AuthedUser,
) -> actix_web::Result<HttpResponse> {
    let actor = UserSocket::new(user.user_id, user.device_id.clone(), state.hub.clone());
    ws::start(actor, &req, payload)
}
