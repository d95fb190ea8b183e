//! CLI configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/micloud/config.toml`
//! - Windows: `%APPDATA%/micloud/config.toml`
//!
//! `MICLOUD_USER_ID` and `MICLOUD_SERVICE_TOKEN` override the stored
//! credentials without being written back.

use std::path::{Path, PathBuf};

use anyhow::bail;
use serde::{Deserialize, Serialize};

pub const USER_ID_ENV: &str = "MICLOUD_USER_ID";
pub const SERVICE_TOKEN_ENV: &str = "MICLOUD_SERVICE_TOKEN";

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Account id sent in the `userId` cookie.
    #[serde(default)]
    pub user_id: String,

    /// Service token of a signed-in session.
    #[serde(default)]
    pub service_token: String,

    /// Drive API host.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Folder uploads go to when `--parent` is not given.
    #[serde(default = "default_parent_id")]
    pub default_parent_id: String,

    /// Blocks uploaded in parallel (1 = sequential).
    #[serde(default = "default_concurrency")]
    pub upload_concurrency: usize,
}

fn default_base_url() -> String {
    micloud_drive::DEFAULT_BASE_URL.into()
}

fn default_parent_id() -> String {
    micloud_drive::ROOT_FOLDER_ID.into()
}

fn default_concurrency() -> usize {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_id: String::new(),
            service_token: String::new(),
            base_url: default_base_url(),
            default_parent_id: default_parent_id(),
            upload_concurrency: default_concurrency(),
        }
    }
}

impl Config {
    /// Loads configuration from `path`, or creates a default there if not found.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save(path)?;
            Ok(config)
        }
    }

    /// Saves the configuration to `path`.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // Holds a service token.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Applies `MICLOUD_*` environment overrides.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(user_id) = var(USER_ID_ENV).filter(|v| !v.is_empty()) {
            self.user_id = user_id;
        }
        if let Some(token) = var(SERVICE_TOKEN_ENV).filter(|v| !v.is_empty()) {
            self.service_token = token;
        }
    }

    /// Account id and service token, or an error naming what is missing.
    pub fn credentials(&self) -> anyhow::Result<(&str, &str)> {
        if self.user_id.is_empty() {
            bail!("no user id configured (set `user_id` or {USER_ID_ENV})");
        }
        if self.service_token.is_empty() {
            bail!("no service token configured (set `service_token` or {SERVICE_TOKEN_ENV})");
        }
        Ok((&self.user_id, &self.service_token))
    }
}

/// Returns the platform-specific configuration file path.
pub fn default_path() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".config")
            .join("micloud")
            .join("config.toml")
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("micloud").join("config.toml")
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        PathBuf::from("/tmp/micloud/config.toml")
    }
}
