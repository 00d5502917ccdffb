//! Static process configuration, read once at startup.
//!
//! This is deliberately separate from the dynamic runtime configuration
//! served by the secret store (`secret_store`): anything here requires a
//! restart to change; anything there propagates within the 30s cache TTL.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub config_encryption_key: String,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Config {
    /// Loads required/optional process env vars. `.env` is read first (if
    /// present) so local development doesn't need a real shell export.
    pub fn from_env() -> Result<Self, envy::Error> {
        let _ = dotenvy::dotenv();
        envy::from_env()
    }
}
