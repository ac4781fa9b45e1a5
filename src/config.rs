//! Configuration loading with layered overrides.
//!
//! Config is loaded in order (each layer overrides the previous):
//! 1. Default values
//! 2. Config file (TOML)
//! 3. Environment variables
//! 4. CLI arguments
//!
//! JWT secret is never read from config files - it must come from an
//! environment variable or CLI argument.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::Error;
use crate::auth::MIN_SECRET_LENGTH;

/// Config shared by every request context.
pub type SharedConfig = Arc<Config>;

/// Server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub database: Database,
    #[serde(default)]
    pub auth: Auth,
    #[serde(default)]
    pub mail: Mail,
}

/// Deployment posture. Decides how much error detail reaches callers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Posture {
    #[default]
    Production,
    Development,
}

impl std::str::FromStr for Posture {
    type Err = Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Posture::Production),
            "development" | "dev" => Ok(Posture::Development),
            other => Err(Error::Config(format!("Unknown posture: {other}"))),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub posture: Posture,
    /// Origins allowed to call the API from a browser. `"*"` allows any.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            posture: Posture::default(),
            cors_origins: Vec::new(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5002
}

/// Database connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "roster.db".to_string()
}

/// Session token settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Auth {
    /// JWT secret for session token signing/verification.
    /// Must be provided via environment variable or CLI - never from config file.
    #[serde(default)]
    pub jwt_secret: String,

    /// Session token lifetime in hours.
    #[serde(default = "default_token_expiry_hours")]
    pub token_expiry_hours: u32,
}

impl Default for Auth {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_expiry_hours: default_token_expiry_hours(),
        }
    }
}

fn default_token_expiry_hours() -> u32 {
    12
}

/// Outbound notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mail {
    /// Organization name used in welcome messages.
    #[serde(default = "default_organization")]
    pub organization: String,
    /// Sender address shown on outgoing notifications.
    #[serde(default = "default_sender")]
    pub sender: String,
}

impl Default for Mail {
    fn default() -> Self {
        Self {
            organization: default_organization(),
            sender: default_sender(),
        }
    }
}

fn default_organization() -> String {
    "Roster".to_string()
}

fn default_sender() -> String {
    "admin@localhost".to_string()
}

/// Values supplied on the command line. `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database_url: Option<String>,
    pub jwt_secret: Option<String>,
    pub posture: Option<Posture>,
}

/// Builder for loading configuration with customizable options.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Environment variable prefix (e.g., "ROSTER" -> ROSTER_HOST, ROSTER_PORT)
    pub env_prefix: String,
    /// Name of the JWT secret environment variable (without prefix)
    pub jwt_secret_env: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self {
            env_prefix: "ROSTER".to_string(),
            jwt_secret_env: "JWT_SECRET".to_string(),
        }
    }
}

impl ConfigLoader {
    /// Create a new config loader with the given environment prefix.
    pub fn new(env_prefix: impl Into<String>) -> Self {
        Self {
            env_prefix: env_prefix.into(),
            ..Default::default()
        }
    }

    /// Load configuration from file, environment, and CLI overrides.
    pub fn load(&self, config_path: Option<&Path>, cli: &Overrides) -> crate::Result<Config> {
        let mut config: Config = if let Some(path) = config_path {
            let content = std::fs::read_to_string(path)
                .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;
            toml::from_str(&content)
                .map_err(|e| Error::Config(format!("Failed to parse config: {e}")))?
        } else {
            Config::default()
        };

        // Secrets never come from the file.
        config.auth.jwt_secret = String::new();

        let prefix = &self.env_prefix;
        let env = |name: &str| std::env::var(format!("{prefix}_{name}")).ok();

        if let Some(host) = env("HOST") {
            config.server.host = host;
        }
        if let Some(port) = env("PORT")
            && let Ok(p) = port.parse()
        {
            config.server.port = p;
        }
        if let Some(posture) = env("POSTURE") {
            config.server.posture = posture.parse()?;
        }
        if let Some(origins) = env("CORS_ORIGINS") {
            config.server.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(org) = env("ORGANIZATION") {
            config.mail.organization = org;
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database.url = url;
        }
        if let Some(secret) = env(&self.jwt_secret_env) {
            config.auth.jwt_secret = secret;
        }

        if let Some(host) = &cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }
        if let Some(url) = &cli.database_url {
            config.database.url = url.clone();
        }
        if let Some(secret) = &cli.jwt_secret {
            config.auth.jwt_secret = secret.clone();
        }
        if let Some(posture) = cli.posture {
            config.server.posture = posture;
        }

        if config.auth.jwt_secret.is_empty() {
            return Err(Error::Config(format!(
                "{}_{} must be set via environment variable or --jwt-secret flag",
                prefix, self.jwt_secret_env
            )));
        }
        if config.auth.jwt_secret.len() < MIN_SECRET_LENGTH {
            return Err(Error::Config(format!(
                "{}_{} must be at least {MIN_SECRET_LENGTH} bytes",
                prefix, self.jwt_secret_env
            )));
        }

        Ok(config)
    }
}
