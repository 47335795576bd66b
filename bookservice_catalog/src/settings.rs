use std::env;

use anyhow::Context;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;

const CONFIG_FILE_ENV: &str = "BOOKSERVICE_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "config/bookservice_catalog";
const ENV_PREFIX: &str = "BOOKSERVICE";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub telemetry: TelemetrySettings,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub hostname: String,
    pub username: String,
    pub password: String,
    pub use_in_memory: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TelemetrySettings {
    pub service_name: String,
    pub jaeger_enabled: bool,
}

impl Settings {
    /// Loads settings from defaults, the optional config file and `BOOKSERVICE__*` variables.
    /// Variables used by the other bookservice deployments (DB_HOST, DB_USERNAME,
    /// DB_PASSWORD, USE_IN_MEMORY_DB) are honoured as well.
    pub fn load() -> anyhow::Result<Self> {
        let config_file =
            env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        Self::builder()?
            .add_source(File::with_name(&config_file).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database.hostname", env::var("DB_HOST").ok())?
            .set_override_option("database.username", env::var("DB_USERNAME").ok())?
            .set_override_option("database.password", env::var("DB_PASSWORD").ok())?
            .set_override_option(
                "database.use_in_memory",
                env::var("USE_IN_MEMORY_DB")
                    .ok()
                    .map(|value| value.to_lowercase() == "true"),
            )?
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    fn builder() -> anyhow::Result<ConfigBuilder<DefaultState>> {
        Ok(Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.hostname", "127.0.0.1")?
            .set_default("database.username", "postgres")?
            .set_default("database.password", "postgres")?
            .set_default("database.use_in_memory", false)?
            .set_default("telemetry.service_name", "bookservice_catalog")?
            .set_default("telemetry.jaeger_enabled", false)?)
    }
}
