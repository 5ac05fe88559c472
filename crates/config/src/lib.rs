use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "frontdesk.toml",
    "config/frontdesk.toml",
    "crates/config/frontdesk.toml",
    "../frontdesk.toml",
    "../config/frontdesk.toml",
    "../crates/config/frontdesk.toml",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    pub realtime: RealtimeConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            database: DatabaseConfig::default(),
            realtime: RealtimeConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 8090,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://frontdesk.db".to_string(),
            max_connections: 10,
        }
    }
}

/// Tunables for the realtime subsystem.
///
/// ```
/// use frontdesk_config::RealtimeConfig;
///
/// let realtime = RealtimeConfig::default();
/// assert_eq!(realtime.send_buffer, 100);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Capacity of each client's outbound frame queue. When a client falls
    /// this many frames behind, further frames to it are dropped.
    #[serde(default = "RealtimeConfig::default_send_buffer")]
    pub send_buffer: usize,
}

impl RealtimeConfig {
    const fn default_send_buffer() -> usize {
        100
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            send_buffer: Self::default_send_buffer(),
        }
    }
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use frontdesk_config::load;
///
/// std::env::remove_var("FRONTDESK_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.http.address.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let mut builder = config::Config::builder();
    builder = builder
        .set_default("http.address", defaults.http.address.clone())
        .unwrap()
        .set_default("http.port", i64::from(defaults.http.port))
        .unwrap()
        .set_default("database.url", defaults.database.url.clone())
        .unwrap()
        .set_default(
            "database.max_connections",
            i64::from(defaults.database.max_connections),
        )
        .unwrap()
        .set_default(
            "realtime.send_buffer",
            i64::try_from(defaults.realtime.send_buffer).unwrap_or(i64::MAX),
        )
        .unwrap();

    let environment_overrides = config::Environment::with_prefix("FRONTDESK").separator("__");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("FRONTDESK_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via FRONTDESK_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    debug!(?config, "loaded backend configuration");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    #[serial]
    fn load_uses_defaults_without_file_or_env() {
        std::env::remove_var("FRONTDESK_CONFIG");

        let config = load().expect("defaults should load");
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.realtime.send_buffer, 100);
    }

    #[test]
    #[serial]
    fn load_reads_explicit_config_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("frontdesk.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[http]\naddress = \"0.0.0.0\"\nport = 9999").unwrap();

        std::env::set_var("FRONTDESK_CONFIG", &path);
        let config = load().expect("file config should load");
        std::env::remove_var("FRONTDESK_CONFIG");

        assert_eq!(config.http.address, "0.0.0.0");
        assert_eq!(config.http.port, 9999);
        // Sections absent from the file keep their defaults.
        assert_eq!(config.database.url, "sqlite://frontdesk.db");
    }
}
