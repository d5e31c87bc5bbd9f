//! Layered configuration for the dashboard server.
//!
//! Sources, later wins:
//! - built-in defaults
//! - `dashd.toml` in the current directory (or the `--config` path)
//! - environment variables prefixed with `DASHD_`, double underscores
//!   separating nested levels: `DASHD_REGEN__TTL_SECONDS=10` sets
//!   `regen.ttl_seconds`
//!
//! The CLI positionals (port, dashboard directory, regenerator, TTL)
//! override all of the above.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "dashd.toml";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Settings {
    /// Listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Staleness and regenerator settings
    #[serde(default)]
    pub regen: RegenConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Address the listener binds to; the port always comes from the CLI
    #[serde(default = "default_bind")]
    pub bind: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RegenConfig {
    /// Seconds generated data stays fresh
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,

    /// Upper bound on a single regenerator run, in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default log level when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module level overrides, e.g. `regen = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_ttl_seconds() -> u64 {
    5
}
fn default_timeout_seconds() -> u64 {
    30
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Default for RegenConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl_seconds(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources.
    ///
    /// `config_path` is the `--config` override; without it the default
    /// file is looked up in the current directory and silently skipped
    /// when absent.
    pub fn load(config_path: Option<&Path>) -> Result<Self, Box<figment::Error>> {
        let path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("DASHD_").map(|key| {
                key.as_str()
                    .to_lowercase()
                    .replace("__", ".") // Double underscore becomes dot
                    .into()
            }))
            .extract()
            .map_err(Box::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    // `load` always merges the process environment, so tests that call it
    // or mutate DASHD_ variables must serialize.
    static ENV_MUTEX: parking_lot::Mutex<()> = parking_lot::Mutex::new(());

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.bind, "0.0.0.0");
        assert_eq!(settings.regen.ttl_seconds, 5);
        assert_eq!(settings.regen.timeout_seconds, 30);
        assert_eq!(settings.logging.default, "warn");
        assert!(settings.logging.modules.is_empty());
    }

    #[test]
    fn test_load_from_toml() {
        let _env = ENV_MUTEX.lock();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("dashd.toml");

        let toml_content = r#"
[server]
bind = "127.0.0.1"

[regen]
ttl_seconds = 60

[logging]
default = "info"

[logging.modules]
regen = "debug"
"#;

        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load(Some(&config_path)).unwrap();
        assert_eq!(settings.server.bind, "127.0.0.1");
        assert_eq!(settings.regen.ttl_seconds, 60);
        // Unset fields keep their defaults
        assert_eq!(settings.regen.timeout_seconds, 30);
        assert_eq!(settings.logging.default, "info");
        assert_eq!(settings.logging.modules["regen"], "debug");
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let _env = ENV_MUTEX.lock();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("dashd.toml");

        fs::write(&config_path, "[regen]\ntimeout_seconds = 10\n").unwrap();

        let settings = Settings::load(Some(&config_path)).unwrap();
        assert_eq!(settings.regen.timeout_seconds, 10);
        assert_eq!(settings.regen.ttl_seconds, 5);
        assert_eq!(settings.server.bind, "0.0.0.0");
    }

    #[test]
    fn test_env_overrides_file() {
        let _env = ENV_MUTEX.lock();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("dashd.toml");

        fs::write(&config_path, "[regen]\nttl_seconds = 60\n").unwrap();

        unsafe {
            std::env::set_var("DASHD_REGEN__TTL_SECONDS", "11");
            std::env::set_var("DASHD_SERVER__BIND", "::1");
        }

        let settings = Settings::load(Some(&config_path)).unwrap();
        assert_eq!(settings.regen.ttl_seconds, 11);
        assert_eq!(settings.server.bind, "::1");

        unsafe {
            std::env::remove_var("DASHD_REGEN__TTL_SECONDS");
            std::env::remove_var("DASHD_SERVER__BIND");
        }
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let _env = ENV_MUTEX.lock();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nope.toml");

        let settings = Settings::load(Some(&config_path)).unwrap();
        assert_eq!(settings.regen.ttl_seconds, 5);
    }
}
