//! core-service entry point: wires the session/token/push core (§2) into a
//! single actix-web process exposing the HTTP and WebSocket surface in §6.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use db_pool::DbConfig;
use redis_utils::RedisPool;
use tracing::{error, info};
use tracing_actix_web::TracingLogger;

use core_service::admin_auth::AdminAuthService;
use core_service::config::Config;
use core_service::proxy::ProxyClient;
use core_service::secret_store::{self, SecretStore};
use core_service::session::SessionManager;
use core_service::sms::SmsService;
use core_service::state::AppState;
use core_service::token::TokenService;
use core_service::ws::{self, HubRegistry};
use core_service::{routes, telemetry};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Config::from_env().map_err(|e| anyhow::anyhow!("config: {e}"))?;
    telemetry::init(&cfg.log_format);

    info!("starting core-service");

    let encryption_key = crypto_core::parse_key(&cfg.config_encryption_key)
        .map_err(|e| anyhow::anyhow!("CONFIG_ENCRYPTION_KEY: {e}"))?;

    let db_config = DbConfig {
        service_name: "core-service".to_string(),
        database_url: cfg.database_url.clone(),
        ..DbConfig::default()
    };
    let pool = db_pool::create_pool(db_config).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let redis_pool = RedisPool::connect(&cfg.redis_url, None).await?;
    let redis = redis_pool.manager();
    let pubsub_client = redis::Client::open(cfg.redis_url.as_str())?;

    let secrets = Arc::new(SecretStore::new(pool.clone(), encryption_key));
    match secrets.preload().await {
        Ok(()) => info!("secret store preloaded"),
        Err(err) => {
            // A decrypt failure here is fatal (§4.1); any other failure
            // (e.g. table legitimately empty on first boot) is tolerated.
            if matches!(err, secret_store::SecretError::Decrypt(_)) {
                return Err(anyhow::anyhow!("fatal: secret store preload decrypt failed: {err}"));
            }
            info!(error = %err, "secret store preload skipped, continuing unseeded");
        }
    }

    let tokens = Arc::new(TokenService::new(secrets.clone()));
    let sessions = Arc::new(SessionManager::new(
        pool.clone(),
        redis.clone(),
        pubsub_client.clone(),
        tokens.clone(),
        secrets.clone(),
    ));
    let admin_auth = Arc::new(AdminAuthService::new(
        pool.clone(),
        redis.clone(),
        pubsub_client.clone(),
        tokens.clone(),
        secrets.clone(),
    ));
    let sms = Arc::new(SmsService::from_config(&secrets, redis.clone()).await);
    let proxy = Arc::new(ProxyClient::new(redis.clone(), secrets.clone()));
    let hub = HubRegistry::new();

    // Global pub/sub listener (§4.7): one per process, feeds every locally
    // registered client from whichever instance actually published.
    let listener_client = pubsub_client.clone();
    let listener_hub = hub.clone();
    tokio::spawn(async move {
        ws::run_listener(listener_client, listener_hub).await;
    });

    let listen_addr = cfg.listen_addr.clone();
    let state = web::Data::new(AppState {
        pool,
        redis,
        pubsub_client,
        secrets,
        tokens,
        sessions,
        admin_auth,
        sms,
        proxy,
        hub,
    });

    info!(%listen_addr, "listening");

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(TracingLogger::default())
            .wrap(cors)
            .app_data(state.clone())
            .configure(routes::configure)
    })
    .bind(&listen_addr)
    .map_err(|e| {
        error!(error = %e, %listen_addr, "failed to bind listener");
        e
    })?
    .run();

    server.await?;
    info!("core-service shut down cleanly");
    Ok(())
}
