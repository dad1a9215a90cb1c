//! Configuration structures for the folder watcher.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{InwatchError, Result};

/// Environment variable pointing at an explicit configuration file.
pub const CONFIG_ENV_VAR: &str = "INWATCH_CONFIG";

/// Environment variable selecting the deployment mode.
pub const MODE_ENV_VAR: &str = "ENV";

/// Main configuration for the inwatch daemon.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WatchConfig {
    /// Drive folder and API settings.
    pub drive: DriveConfig,

    /// Credential settings.
    pub auth: AuthConfig,

    /// Local file locations.
    pub storage: StorageConfig,

    /// Poll loop timing.
    pub poll: PollConfig,
}

/// Google Drive settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DriveConfig {
    /// ID of the folder to watch.
    pub folder_id: String,

    /// Base URL of the Drive v3 API.
    pub api_base: String,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            folder_id: "1NfBtWj3_vDIVaUgIhLAGSyackntZ6JII".to_string(),
            api_base: "https://www.googleapis.com/drive/v3".to_string(),
        }
    }
}

/// How credentials are obtained.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Interactive OAuth flow with a persisted, refreshable token.
    #[default]
    Installed,
    /// Service account key file, used in production.
    ServiceAccount,
}

/// Credential file locations and scopes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuthConfig {
    /// Credential mode.
    pub mode: AuthMode,

    /// Persisted user token (installed mode).
    pub token_file: PathBuf,

    /// OAuth client secrets (installed mode).
    pub credentials_file: PathBuf,

    /// Service account key (service account mode).
    pub service_account_key_file: PathBuf,

    /// OAuth scopes to request.
    pub scopes: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: AuthMode::Installed,
            token_file: PathBuf::from("auth/token.json"),
            credentials_file: PathBuf::from("auth/credentials.json"),
            service_account_key_file: PathBuf::from("service_account_key.json"),
            scopes: vec!["https://www.googleapis.com/auth/drive".to_string()],
        }
    }
}

/// Local files written by the watcher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Ledger of processed file IDs.
    pub known_files: PathBuf,

    /// CSV output table.
    pub output_csv: PathBuf,

    /// Directory for downloaded scratch files.
    pub scratch_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            known_files: PathBuf::from("known_files.txt"),
            output_csv: PathBuf::from("processed_files.csv"),
            scratch_dir: PathBuf::from("."),
        }
    }
}

/// Poll loop timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PollConfig {
    /// Seconds to sleep between cycles.
    pub interval_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { interval_secs: 30 }
    }
}

impl WatchConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| InwatchError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| InwatchError::Config(e.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Resolve and load the configuration.
    ///
    /// Lookup order: `path`, then `$INWATCH_CONFIG`, then the user config
    /// directory if a file exists there, then built-in defaults. The
    /// environment overrides from [`WatchConfig::apply_env`] are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));

        let mut config = match explicit {
            Some(p) => Self::from_file(&p)?,
            None => {
                let default_path = default_config_path();
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides. `ENV=production` selects the service account.
    pub fn apply_env(&mut self) {
        self.apply_mode(std::env::var(MODE_ENV_VAR).ok().as_deref());
    }

    fn apply_mode(&mut self, env: Option<&str>) {
        if env == Some("production") {
            self.auth.mode = AuthMode::ServiceAccount;
        }
    }

    /// Check the configuration for values the watcher cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.drive.folder_id.trim().is_empty() {
            return Err(InwatchError::Config("drive.folder_id is empty".to_string()));
        }
        if self.poll.interval_secs == 0 {
            return Err(InwatchError::Config(
                "poll.interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.auth.scopes.is_empty() {
            return Err(InwatchError::Config("auth.scopes is empty".to_string()));
        }
        Ok(())
    }

    /// Interval between poll cycles.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll.interval_secs)
    }

    /// Scratch path used while a single file is processed.
    pub fn scratch_path(&self, file_id: &str) -> PathBuf {
        self.storage.scratch_dir.join(format!("temp_{}.pdf", file_id))
    }
}

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("inwatch")
        .join("config.json")
}
