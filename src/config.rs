use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    pub manager: ManagerConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ManagerConfig {
    /// Time allowed for the whole reverse-order shutdown
    #[serde(default = "default_shutdown_grace_seconds")]
    pub shutdown_grace_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServerConfig {
    /// IP address to bind to
    #[serde(default = "default_server_ip")]
    pub ip: String,

    /// Port to listen on (0 picks a free port)
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// How long the listener may take to bind before startup is aborted
    #[serde(default = "default_start_timeout_seconds")]
    pub start_timeout_seconds: u64,
}

impl ManagerConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_seconds)
    }
}

impl ServerConfig {
    pub fn start_timeout(&self) -> Duration {
        Duration::from_secs(self.start_timeout_seconds)
    }
}

impl AppConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("component-manager.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default(
                "manager.shutdown_grace_seconds",
                default_shutdown_grace_seconds() as i64,
            )?
            .set_default("server.ip", default_server_ip())?
            .set_default("server.port", i64::from(default_server_port()))?
            .set_default(
                "server.start_timeout_seconds",
                default_start_timeout_seconds() as i64,
            )?
            .add_source(File::with_name(&path_str).required(false))
            // COMPMGR_SERVER__PORT=8080 overrides server.port
            .add_source(
                Environment::with_prefix("COMPMGR")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> crate::error::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.manager.shutdown_grace_seconds == 0 {
            return Err(ConfigError::Message(
                "Shutdown grace period must be greater than 0".to_string(),
            ));
        }

        if self.server.start_timeout_seconds == 0 {
            return Err(ConfigError::Message(
                "Server start timeout must be greater than 0".to_string(),
            ));
        }

        if self.server.ip.parse::<IpAddr>().is_err() {
            return Err(ConfigError::Message(format!(
                "Server ip '{}' is not a valid IP address",
                self.server.ip
            )));
        }

        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            manager: ManagerConfig {
                shutdown_grace_seconds: default_shutdown_grace_seconds(),
            },
            server: ServerConfig {
                ip: default_server_ip(),
                port: default_server_port(),
                start_timeout_seconds: default_start_timeout_seconds(),
            },
        }
    }
}

// Default value functions
fn default_shutdown_grace_seconds() -> u64 {
    60
}

fn default_server_ip() -> String {
    "127.0.0.1".to_string()
}
fn default_server_port() -> u16 {
    0
}
fn default_start_timeout_seconds() -> u64 {
    5
}
