//! Process-wide shared handles, assembled once in `main` and cloned into
//! every request via `web::Data<AppState>`.

use std::sync::Arc;

use redis::Client;
use redis_utils::SharedConnectionManager;
use sqlx::PgPool;

use crate::admin_auth::AdminAuthService;
use crate::proxy::ProxyClient;
use crate::secret_store::SecretStore;
use crate::session::SessionManager;
use crate::sms::SmsService;
use crate::token::TokenService;
use crate::ws::HubRegistry;

pub struct AppState {
    pub pool: PgPool,
    pub redis: SharedConnectionManager,
    pub pubsub_client: Client,
    pub secrets: Arc<SecretStore>,
    pub tokens: Arc<TokenService>,
    pub sessions: Arc<SessionManager>,
    pub admin_auth: Arc<AdminAuthService>,
    pub sms: Arc<SmsService>,
    pub proxy: Arc<ProxyClient>,
    pub hub: HubRegistry,
}
