//! Addressable configuration keys (`section.key`).

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::file::{parse_optional_path, parse_value, ConfigError, ConfigFile};

/// Every key the configuration file understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    StreamBindAddress,
    StreamPort,
    StreamMulticastGroup,
    StreamChannelCapacity,
    RefreshIntervalMs,
    ControlsDefinitions,
    BindingsFile,
    LoggingLevel,
    LoggingDirectory,
}

impl ConfigKey {
    /// All keys in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::StreamBindAddress,
            ConfigKey::StreamPort,
            ConfigKey::StreamMulticastGroup,
            ConfigKey::StreamChannelCapacity,
            ConfigKey::RefreshIntervalMs,
            ConfigKey::ControlsDefinitions,
            ConfigKey::BindingsFile,
            ConfigKey::LoggingLevel,
            ConfigKey::LoggingDirectory,
        ]
    }

    pub fn section(&self) -> &'static str {
        match self {
            ConfigKey::StreamBindAddress
            | ConfigKey::StreamPort
            | ConfigKey::StreamMulticastGroup
            | ConfigKey::StreamChannelCapacity => "stream",
            ConfigKey::RefreshIntervalMs => "refresh",
            ConfigKey::ControlsDefinitions => "controls",
            ConfigKey::BindingsFile => "bindings",
            ConfigKey::LoggingLevel | ConfigKey::LoggingDirectory => "logging",
        }
    }

    pub fn key_name(&self) -> &'static str {
        match self {
            ConfigKey::StreamBindAddress => "bind_address",
            ConfigKey::StreamPort => "port",
            ConfigKey::StreamMulticastGroup => "multicast_group",
            ConfigKey::StreamChannelCapacity => "channel_capacity",
            ConfigKey::RefreshIntervalMs => "interval_ms",
            ConfigKey::ControlsDefinitions => "definitions",
            ConfigKey::BindingsFile => "file",
            ConfigKey::LoggingLevel => "level",
            ConfigKey::LoggingDirectory => "directory",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as text. Unset optional values are empty.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::StreamBindAddress => config.stream.bind_address.to_string(),
            ConfigKey::StreamPort => config.stream.port.to_string(),
            ConfigKey::StreamMulticastGroup => config
                .stream
                .multicast_group
                .map(|g| g.to_string())
                .unwrap_or_default(),
            ConfigKey::StreamChannelCapacity => config.stream.channel_capacity.to_string(),
            ConfigKey::RefreshIntervalMs => config.refresh.interval_ms.to_string(),
            ConfigKey::ControlsDefinitions => config
                .controls
                .definitions
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
            ConfigKey::BindingsFile => display_optional(&config.bindings.file),
            ConfigKey::LoggingLevel => config.logging.level.clone(),
            ConfigKey::LoggingDirectory => display_optional(&config.logging.directory),
        }
    }

    /// Parse `value` and store it.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let name = self.name();
        match self {
            ConfigKey::StreamBindAddress => {
                config.stream.bind_address = parse_value(&name, value)?;
            }
            ConfigKey::StreamPort => config.stream.port = parse_value(&name, value)?,
            ConfigKey::StreamMulticastGroup => {
                config.stream.multicast_group = if value.trim().is_empty() {
                    None
                } else {
                    Some(parse_value(&name, value)?)
                };
            }
            ConfigKey::StreamChannelCapacity => {
                config.stream.channel_capacity = parse_positive(&name, value)?;
            }
            ConfigKey::RefreshIntervalMs => {
                config.refresh.interval_ms = parse_positive::<u64>(&name, value)?;
            }
            ConfigKey::ControlsDefinitions => {
                config.controls.definitions = value
                    .split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(PathBuf::from)
                    .collect();
            }
            ConfigKey::BindingsFile => config.bindings.file = parse_optional_path(value),
            ConfigKey::LoggingLevel => {
                let level = value.trim();
                if level.is_empty() {
                    return Err(ConfigError::Invalid {
                        key: name,
                        value: value.to_string(),
                    });
                }
                config.logging.level = level.to_string();
            }
            ConfigKey::LoggingDirectory => config.logging.directory = parse_optional_path(value),
        }
        Ok(())
    }
}

fn display_optional(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}

fn parse_positive<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default,
{
    let parsed: T = parse_value(key, value)?;
    if parsed <= T::default() {
        return Err(ConfigError::Invalid {
            key: key.to_string(),
            value: value.to_string(),
        });
    }
    Ok(parsed)
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section(), self.key_name())
    }
}

/// Error for an unrecognised `section.key`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown configuration key '{0}'")]
pub struct UnknownConfigKey(pub String);

impl FromStr for ConfigKey {
    type Err = UnknownConfigKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == s)
            .ok_or_else(|| UnknownConfigKey(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_keys() {
        for key in ConfigKey::all() {
            assert_eq!(key.name().parse::<ConfigKey>(), Ok(*key));
        }
        assert_eq!(
            "stream.port".parse::<ConfigKey>(),
            Ok(ConfigKey::StreamPort)
        );
    }

    #[test]
    fn test_unknown_key() {
        assert_eq!(
            "stream.speed".parse::<ConfigKey>(),
            Err(UnknownConfigKey("stream.speed".into()))
        );
    }

    #[test]
    fn test_get_set() {
        let mut config = ConfigFile::default();
        ConfigKey::StreamMulticastGroup.set(&mut config, "").unwrap();
        assert_eq!(ConfigKey::StreamMulticastGroup.get(&config), "");

        ConfigKey::StreamMulticastGroup
            .set(&mut config, "239.1.2.3")
            .unwrap();
        assert_eq!(ConfigKey::StreamMulticastGroup.get(&config), "239.1.2.3");

        ConfigKey::LoggingDirectory.set(&mut config, "/var/log/pb").unwrap();
        assert_eq!(ConfigKey::LoggingDirectory.get(&config), "/var/log/pb");
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = ConfigFile::default();
        assert!(ConfigKey::StreamBindAddress.set(&mut config, "localhost").is_err());
        assert!(ConfigKey::StreamChannelCapacity.set(&mut config, "0").is_err());
        assert!(ConfigKey::LoggingLevel.set(&mut config, "  ").is_err());
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_sections_grouped_in_order() {
        let sections: Vec<_> = ConfigKey::all().iter().map(|k| k.section()).collect();
        let mut deduped = sections.clone();
        deduped.dedup();
        assert_eq!(
            deduped,
            vec!["stream", "refresh", "controls", "bindings", "logging"]
        );
    }
}
