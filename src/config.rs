use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Web server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public base URL, used when printing the bookmarkable rescue URL.
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_public_url() -> String {
    "http://127.0.0.1:8080/".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: default_public_url(),
        }
    }
}

/// Filesystem layout of the host application.
///
/// The plugin and theme roots are fixed, configured directories. They are
/// never derived from request input.
#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    #[serde(default = "default_plugins_dir")]
    pub plugins_dir: PathBuf,
    #[serde(default = "default_themes_dir")]
    pub themes_dir: PathBuf,
    /// Directory holding the secret store and the rescue activity log.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
    /// The host application's error log, shown by the debug log viewer.
    #[serde(default = "default_debug_log")]
    pub debug_log: PathBuf,
}

fn default_plugins_dir() -> PathBuf {
    PathBuf::from("content/plugins")
}

fn default_themes_dir() -> PathBuf {
    PathBuf::from("content/themes")
}

fn default_state_dir() -> PathBuf {
    PathBuf::from("state")
}

fn default_debug_log() -> PathBuf {
    PathBuf::from("content/debug.log")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            plugins_dir: default_plugins_dir(),
            themes_dir: default_themes_dir(),
            state_dir: default_state_dir(),
            debug_log: default_debug_log(),
        }
    }
}

/// Root application configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RescueConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

impl RescueConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default config file
            .add_source(File::with_name("config/default").required(false))
            // Override with local config if present
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (prefix: BREAKGLASS_)
            // e.g., BREAKGLASS_PATHS__PLUGINS_DIR, BREAKGLASS_SERVER__PORT
            .add_source(
                Environment::with_prefix("BREAKGLASS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Socket address string the demo binary binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl PathsConfig {
    pub fn secret_store_file(&self) -> PathBuf {
        self.state_dir.join("rescue_state.json")
    }

    pub fn audit_log_file(&self) -> PathBuf {
        self.state_dir.join("rescue_log.txt")
    }
}
