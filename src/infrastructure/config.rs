use serde::Deserialize;
use std::path::Path;

use crate::application::ClientOptions;
use crate::domain::DomainError;

pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub firestore: FirestoreConfig,
    pub client: ClientOptions,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FirestoreConfig {
    pub project_id: Option<String>,
    pub database: String,
    pub base_url: String,
    /// `host:port` of a local emulator; bypasses credentials when set.
    pub emulator_host: Option<String>,
    /// Fixed bearer token. When unset, Application Default Credentials
    /// supply and refresh tokens.
    pub access_token: Option<String>,
    pub timeout_secs: u64,
    pub page_size: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for FirestoreConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            database: "(default)".to_string(),
            base_url: "https://firestore.googleapis.com/v1".to_string(),
            emulator_host: None,
            access_token: None,
            timeout_secs: 30,
            page_size: 300,
        }
    }
}

impl AppConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, DomainError> {
        serde_yaml::from_str(yaml).map_err(|e| DomainError::invalid_argument(e.to_string()))
    }

    /// Reads `DOCSTORE_CONFIG` (or `config.yaml` when present), then applies
    /// environment overrides.
    pub fn load() -> Result<Self, DomainError> {
        let path = std::env::var("DOCSTORE_CONFIG").ok();
        let path = path.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);

        let mut config = if Path::new(path).exists() {
            let yaml = std::fs::read_to_string(path)
                .map_err(|e| DomainError::internal(format!("reading {path}: {e}")))?;
            Self::from_yaml(&yaml)?
        } else {
            tracing::debug!(path, "no config file, using defaults");
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn apply_env<F>(&mut self, var: F) -> Result<(), DomainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(project) = var("FIRESTORE_PROJECT_ID").or_else(|| var("GOOGLE_CLOUD_PROJECT")) {
            self.firestore.project_id = Some(project);
        }
        if let Some(database) = var("FIRESTORE_DATABASE") {
            self.firestore.database = database;
        }
        if let Some(host) = var("FIRESTORE_EMULATOR_HOST") {
            self.firestore.emulator_host = Some(host);
        }
        if let Some(token) = var("GOOGLE_OAUTH_ACCESS_TOKEN") {
            self.firestore.access_token = Some(token);
        }
        if let Some(host) = var("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("SERVER_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| DomainError::invalid_argument(format!("invalid SERVER_PORT {port}")))?;
        }
        Ok(())
    }
}
