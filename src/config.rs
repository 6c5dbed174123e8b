use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub database: DatabaseConfig,

    pub mail: MailConfig,

    pub maintenance: MaintenanceConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 0 lets tokio pick based on available cores.
    pub worker_threads: usize,

    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,

    pub port: u16,

    /// Externally reachable base URL, used when building links that go out
    /// in emails. No trailing slash.
    pub public_url: String,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            public_url: "http://localhost:8080".to_string(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,

    pub max_connections: u32,

    pub min_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:docuvault.db".to_string(),
            max_connections: 5,
            min_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// When disabled, notification emails are logged instead of sent.
    pub enabled: bool,

    /// Base URL of the HTTP email delivery API.
    pub api_base_url: String,

    /// Server token for the delivery API. Usually supplied through the
    /// `MAIL_SERVER_TOKEN` environment variable rather than the file.
    pub server_token: String,

    pub from_address: String,

    pub confirm_subject: String,

    pub confirm_message: String,

    /// Path appended to the public URL, followed by the token.
    pub confirm_path: String,

    pub reset_subject: String,

    pub reset_message: String,

    pub reset_path: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_base_url: "https://api.postmarkapp.com".to_string(),
            server_token: String::new(),
            from_address: "noreply@localhost".to_string(),
            confirm_subject: "Please confirm your account".to_string(),
            confirm_message: "To confirm your account, please click the link below:".to_string(),
            confirm_path: "/register/confirm?token=".to_string(),
            reset_subject: "Password reset request".to_string(),
            reset_message: "To reset your password, please click the link below:".to_string(),
            reset_path: "/user/changePassword?token=".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    /// How often expired confirmation tokens are swept away. 0 disables
    /// the sweep.
    pub token_sweep_interval_minutes: u64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            token_sweep_interval_minutes: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        if let Ok(token) = std::env::var("MAIL_SERVER_TOKEN") {
            config.mail.server_token = token;
        }

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("docuvault").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".docuvault").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.database.max_connections == 0 {
            anyhow::bail!("Database max_connections must be > 0");
        }

        if self.server.public_url.is_empty() {
            anyhow::bail!("Server public_url cannot be empty");
        }

        if self.mail.enabled {
            if self.mail.server_token.is_empty() {
                anyhow::bail!("Mail server token cannot be empty when mail is enabled");
            }
            if self.mail.from_address.is_empty() {
                anyhow::bail!("Mail from address cannot be empty when mail is enabled");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn mail_enabled_requires_token() {
        let mut config = Config::default();
        config.mail.enabled = true;
        config.mail.server_token = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 9999
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9999);
        assert_eq!(config.database.max_connections, 5);
        assert!(!config.mail.enabled);
    }
}
