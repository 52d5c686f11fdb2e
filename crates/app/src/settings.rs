//! Handles settings for the application. Configuration is read from an
//! optional `settings.toml` in the working directory and from
//! `ROOMLEDGER__*` environment variables, e.g. `ROOMLEDGER__SERVER__PORT=8080`.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
    /// Buffered events per subscriber before a slow stream starts lagging.
    pub event_capacity: usize,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Server,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("app.level", "info")?
            .set_default("server.port", 3000)?
            .set_default("server.database", "memory")?
            .set_default("server.event_capacity", 256)?
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("ROOMLEDGER").separator("__"))
            .build()?
            .try_deserialize()
    }
}
