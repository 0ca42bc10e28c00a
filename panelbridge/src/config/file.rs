//! INI-backed configuration file.

use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use crate::refresh::RefreshConfig;
use crate::transport::{StreamReceiverConfig, DEFAULT_MULTICAST_GROUP, DEFAULT_STREAM_PORT};

/// Default capacity of the receiver → dispatcher channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 4096;

/// Default refresh interval in milliseconds.
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 50;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Errors loading or saving the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(String),

    #[error("Invalid value '{value}' for {key}")]
    Invalid { key: String, value: String },
}

/// `[stream]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSettings {
    pub bind_address: Ipv4Addr,
    pub port: u16,
    /// Empty in the file disables multicast.
    pub multicast_group: Option<Ipv4Addr>,
    pub channel_capacity: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            bind_address: Ipv4Addr::UNSPECIFIED,
            port: DEFAULT_STREAM_PORT,
            multicast_group: Some(DEFAULT_MULTICAST_GROUP),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl StreamSettings {
    pub fn receiver_config(&self) -> StreamReceiverConfig {
        StreamReceiverConfig::default()
            .with_bind_address(self.bind_address)
            .with_port(self.port)
            .with_multicast_group(self.multicast_group)
    }
}

/// `[refresh]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshSettings {
    pub interval_ms: u64,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
        }
    }
}

impl RefreshSettings {
    pub fn refresh_config(&self) -> RefreshConfig {
        RefreshConfig::default().with_interval(Duration::from_millis(self.interval_ms))
    }
}

/// `[controls]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlsSettings {
    /// Control catalog files, comma separated in the file.
    pub definitions: Vec<PathBuf>,
}

/// `[bindings]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingsSettings {
    pub file: Option<PathBuf>,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Filter directive, e.g. `info` or `panelbridge=debug`.
    pub level: String,
    /// Directory for daily log files. Console only when unset.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            directory: None,
        }
    }
}

/// The whole configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub stream: StreamSettings,
    pub refresh: RefreshSettings,
    pub controls: ControlsSettings,
    pub bindings: BindingsSettings,
    pub logging: LoggingSettings,
}

/// Default location: `<config dir>/panelbridge/config.ini`.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("panelbridge")
        .join("config.ini")
}

impl ConfigFile {
    /// Load from the default path. A missing file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_file_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parse INI text. Missing keys keep their defaults.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut config = Self::default();

        for (section, properties) in ini.iter() {
            let Some(section) = section else {
                continue;
            };
            for (key, value) in properties.iter() {
                let name = format!("{}.{}", section, key);
                match name.parse::<super::ConfigKey>() {
                    Ok(config_key) => config_key.set(&mut config, value)?,
                    Err(_) => tracing::warn!(key = %name, "Ignoring unknown configuration key"),
                }
            }
        }

        Ok(config)
    }

    /// Save to the default path, creating the directory if needed.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        self.to_ini()
            .write_to_file(path)
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        for key in super::ConfigKey::all() {
            ini.with_section(Some(key.section()))
                .set(key.key_name(), key.get(self));
        }
        ini
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.stream.port = port;
        self
    }

    pub fn with_multicast_group(mut self, group: Option<Ipv4Addr>) -> Self {
        self.stream.multicast_group = group;
        self
    }

    pub fn with_definitions(mut self, definitions: Vec<PathBuf>) -> Self {
        self.controls.definitions = definitions;
        self
    }

    pub fn with_bindings_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.bindings.file = Some(file.into());
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.logging.level = level.into();
        self
    }
}

pub(super) fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
    })
}

pub(super) fn parse_optional_path(value: &str) -> Option<PathBuf> {
    let value = value.trim();
    (!value.is_empty()).then(|| PathBuf::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[stream]
bind_address = 127.0.0.1
port = 7778
multicast_group =

[refresh]
interval_ms = 20

[controls]
definitions = /etc/panelbridge/A-10C.json, /etc/panelbridge/CommonData.json

[bindings]
file = /home/pilot/pz69.bindings

[logging]
level = panelbridge=debug
"#;

    #[test]
    fn test_defaults() {
        let config = ConfigFile::default();
        assert_eq!(config.stream.port, 5010);
        assert_eq!(config.stream.channel_capacity, 4096);
        assert_eq!(config.refresh.interval_ms, 50);
        assert_eq!(config.logging.level, "info");
        assert!(config.controls.definitions.is_empty());
        assert!(config.bindings.file.is_none());
    }

    #[test]
    fn test_parse_sample() {
        let config = ConfigFile::parse(SAMPLE).unwrap();
        assert_eq!(config.stream.bind_address, Ipv4Addr::LOCALHOST);
        assert_eq!(config.stream.port, 7778);
        assert_eq!(config.stream.multicast_group, None);
        assert_eq!(config.refresh.interval_ms, 20);
        assert_eq!(
            config.controls.definitions,
            vec![
                PathBuf::from("/etc/panelbridge/A-10C.json"),
                PathBuf::from("/etc/panelbridge/CommonData.json"),
            ]
        );
        assert_eq!(
            config.bindings.file,
            Some(PathBuf::from("/home/pilot/pz69.bindings"))
        );
        assert_eq!(config.logging.level, "panelbridge=debug");
        assert_eq!(config.logging.directory, None);
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let config = ConfigFile::parse("[refresh]\ninterval_ms = 100\n").unwrap();
        assert_eq!(config.refresh.interval_ms, 100);
        assert_eq!(config.stream, StreamSettings::default());
    }

    #[test]
    fn test_invalid_value_names_key() {
        let err = ConfigFile::parse("[stream]\nport = lots\n").unwrap_err();
        match err {
            ConfigError::Invalid { key, value } => {
                assert_eq!(key, "stream.port");
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(matches!(
            ConfigFile::parse("[refresh]\ninterval_ms = 0\n"),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = ConfigFile::load_from(file.path()).unwrap();
        assert_eq!(config.stream.port, 7778);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigFile::load_from(&dir.path().join("absent.ini")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.ini");

        let config = ConfigFile::default()
            .with_port(6000)
            .with_multicast_group(None)
            .with_definitions(vec![PathBuf::from("a.json"), PathBuf::from("b.json")])
            .with_bindings_file("radio.bindings")
            .with_log_level("debug");
        config.save_to(&path).unwrap();

        assert_eq!(ConfigFile::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_settings_convert_to_runtime_configs() {
        let config = ConfigFile::parse(SAMPLE).unwrap();
        let receiver = config.stream.receiver_config();
        assert_eq!(receiver.port, 7778);
        assert_eq!(receiver.multicast_group, None);
        assert_eq!(
            config.refresh.refresh_config().interval,
            Duration::from_millis(20)
        );
    }

    #[test]
    fn test_config_file_path_name() {
        let path = config_file_path();
        assert!(path.ends_with("panelbridge/config.ini"));
    }
}
