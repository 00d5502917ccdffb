//! Route table (§6): wires handlers to the three auth gates in `middleware`.

use actix_web::web;

use crate::handlers::{admin, auth, health, proxy, ws};
use crate::middleware::{RequireAdmin, RequireRole, RequireUser};

const SUPER_ADMIN_RANK: u8 = 2;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/healthz", web::get().to(health::healthz))
        .route("/readyz", web::get().to(health::readyz))
        .service(
            web::scope("/auth")
                .route("/sms/send", web::post().to(auth::send_code))
                .route("/sms/verify", web::post().to(auth::verify_code))
                .route("/refresh", web::post().to(auth::refresh))
                .service(
                    web::scope("")
                        .wrap(RequireUser)
                        .route("/logout", web::post().to(auth::logout))
                        .route("/devices", web::get().to(auth::list_devices))
                        .route("/devices/{deviceId}", web::delete().to(auth::delete_device)),
                ),
        )
        .service(
            web::scope("/admin")
                .route("/setup/status", web::post().to(admin::setup_status))
                .route("/setup/init", web::post().to(admin::setup_init))
                .route("/auth/login", web::post().to(admin::login))
                .service(
                    web::scope("")
                        .wrap(RequireAdmin)
                        .route("/devices/{deviceId}/kick", web::post().to(admin::kick_device))
                        .route("/users/{userId}/disable", web::post().to(admin::disable_user))
                        .service(
                            web::scope("")
                                .wrap(RequireRole::new(SUPER_ADMIN_RANK))
                                .route("/config/jwt", web::put().to(admin::rotate_jwt)),
                        ),
                ),
        )
        .service(
            web::scope("/api")
                .wrap(RequireUser)
                .default_service(web::route().to(proxy::passthrough)),
        )
        .service(web::scope("/ws").wrap(RequireUser).route("", web::get().to(ws::upgrade)));
}
