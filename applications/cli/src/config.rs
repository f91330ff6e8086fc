/// Player configuration
use crate::error::{CliError, Result};
use encore_client::ApiConfig;
use encore_playback::{HeadlessConfig, SessionConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerConfig {
    #[serde(default = "default_api")]
    pub api: ApiSettings,

    #[serde(default = "default_storage")]
    pub storage: StorageSettings,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub headless: HeadlessConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

impl PlayerConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `encore.toml` in the working
    /// directory is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from("encore.toml");
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Override with environment variables (e.g. ENCORE_API__BASE_URL)
        settings = settings.add_source(
            config::Environment::with_prefix("ENCORE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(CliError::Config(
                "API base URL is required (set ENCORE_API__BASE_URL)".to_string(),
            ));
        }

        if self.api.timeout_secs == 0 {
            return Err(CliError::Config(
                "API timeout must be at least one second".to_string(),
            ));
        }

        Ok(())
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            url: self.api.base_url.clone(),
            timeout: Duration::from_secs(self.api.timeout_secs),
        }
    }
}

// Default values
fn default_api() -> ApiSettings {
    ApiSettings {
        base_url: default_base_url(),
        timeout_secs: default_timeout_secs(),
    }
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_storage() -> StorageSettings {
    StorageSettings {
        path: default_storage_path(),
    }
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./data/encore.redb")
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            api: default_api(),
            storage: default_storage(),
            session: SessionConfig::default(),
            headless: HeadlessConfig::default(),
        }
    }
}
