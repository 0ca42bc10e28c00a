//! Configuration file handling.
//!
//! Settings live in an INI file, by default at
//! `<config dir>/panelbridge/config.ini`:
//!
//! ```ini
//! [stream]
//! bind_address = 0.0.0.0
//! port = 5010
//! multicast_group = 239.255.50.10
//! channel_capacity = 4096
//!
//! [refresh]
//! interval_ms = 50
//!
//! [controls]
//! definitions = A-10C.json, CommonData.json
//!
//! [bindings]
//! file = pz69.bindings
//!
//! [logging]
//! level = info
//! directory =
//! ```
//!
//! Keys can be read and written individually through [`ConfigKey`].

mod file;
mod keys;

pub use file::{
    config_file_path, BindingsSettings, ConfigError, ConfigFile, ControlsSettings,
    LoggingSettings, RefreshSettings, StreamSettings, DEFAULT_CHANNEL_CAPACITY, DEFAULT_LOG_LEVEL,
    DEFAULT_REFRESH_INTERVAL_MS,
};
pub use keys::{ConfigKey, UnknownConfigKey};
