//! Handles settings for the application. Configuration is read from an
//! optional `settings.toml` next to the binary, then overridden by
//! `LEDGERBOOK__<SECTION>__<KEY>` environment variables.
//!
//! See `settings.example.toml` for the configuration.
use config::{
    Config, ConfigError, Environment, File,
    builder::{ConfigBuilder, DefaultState},
};
use serde::Deserialize;

const ENV_PREFIX: &str = "LEDGERBOOK";

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Development,
    Production,
}

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub mode: Mode,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
            mode: Mode::default(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
    pub database: Database,
    pub max_receipt_bytes: Option<usize>,
}

fn default_port() -> u16 {
    3000
}

/// Where receipt images are kept.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Storage {
    Local {
        path: String,
        public_url: String,
        /// Serve `path` under this route, e.g. `/receipts`.
        mount: Option<String>,
    },
    Cloud {
        bucket: String,
        token: String,
        api_url: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Server,
    pub storage: Storage,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::build(Config::builder().add_source(File::with_name("settings").required(false)))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
