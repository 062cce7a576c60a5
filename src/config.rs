//! Configuration loader and validator for the trivia API server.
use axum::http::HeaderValue;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    pub server: Server,
    #[serde(default)]
    pub cors: Cors,
    #[serde(default)]
    pub quiz: Quiz,
}

/// App-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    pub data_dir: String,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Server {
    pub listen: String,
}

/// Cross-origin policy. `"*"` allows any origin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cors {
    pub allowed_origins: Vec<String>,
}

impl Default for Cors {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Quiz {
    /// Fixed seed for question draws; entropy-seeded when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Config {
    /// Ensure required directories exist (creates `app.data_dir` if missing).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        if self.app.data_dir.trim().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(&self.app.data_dir)
    }

    /// `DATABASE_URL` when set, otherwise a SQLite file under `app.data_dir`.
    pub fn database_url(&self) -> String {
        std::env::var("DATABASE_URL").unwrap_or_else(|_| self.default_database_url())
    }

    pub fn default_database_url(&self) -> String {
        format!(
            "sqlite://{}/trivia.db",
            self.app.data_dir.trim_end_matches('/')
        )
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .listen
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid("server.listen must be a socket address"))
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors.allows_any()
    }
}

impl Cors {
    pub fn allows_any(&self) -> bool {
        self.allowed_origins.iter().any(|o| o.trim() == "*")
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.data_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("app.data_dir must be non-empty"));
    }
    cfg.listen_addr()?;

    if cfg.cors.allowed_origins.is_empty() {
        return Err(ConfigError::Invalid("cors.allowed_origins must list at least one origin"));
    }
    if cfg.cors.allowed_origins.iter().any(|o| o.trim().is_empty()) {
        return Err(ConfigError::Invalid("cors.allowed_origins entries must be non-empty"));
    }
    if cfg
        .cors
        .allowed_origins
        .iter()
        .any(|o| HeaderValue::from_str(o.trim()).is_err())
    {
        return Err(ConfigError::Invalid("cors.allowed_origins entries must be valid header values"));
    }

    Ok(())
}

/// Sample configuration, printed by `trivia-api --print-example`.
pub fn example() -> &'static str {
    r#"app:
  data_dir: "./data"

server:
  listen: "127.0.0.1:5000"

cors:
  allowed_origins:
    - "*"

quiz:
  seed: null
"#
}
