//! Structured logging setup, shared by every binary in this crate.
//!
//! `RUST_LOG` drives the `EnvFilter` (default `info`); `LOG_FORMAT=json`
//! switches to the JSON formatter for production log aggregation, the
//! default `pretty` formatter is for local development.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init(log_format: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
