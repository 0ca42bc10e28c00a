//! Application configuration for PanelBridgeApp.

use std::path::PathBuf;

use crate::config::{ConfigFile, DEFAULT_CHANNEL_CAPACITY};
use crate::refresh::RefreshConfig;
use crate::transport::StreamReceiverConfig;

/// Everything needed to bootstrap a session.
///
/// This is the top-level configuration passed to `PanelBridgeApp::builder()`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Socket settings for the export stream.
    pub stream: StreamReceiverConfig,

    /// Capacity of the receiver → dispatcher channel.
    pub channel_capacity: usize,

    /// Refresh cadence.
    pub refresh: RefreshConfig,

    /// Control catalog files.
    pub definitions: Vec<PathBuf>,

    /// Binding file loaded at startup.
    pub bindings_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            stream: StreamReceiverConfig::default(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            refresh: RefreshConfig::default(),
            definitions: Vec::new(),
            bindings_file: None,
        }
    }
}

impl AppConfig {
    /// Translate the configuration file into an application config.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        Self {
            stream: config.stream.receiver_config(),
            channel_capacity: config.stream.channel_capacity,
            refresh: config.refresh.refresh_config(),
            definitions: config.controls.definitions.clone(),
            bindings_file: config.bindings.file.clone(),
        }
    }

    pub fn with_stream(mut self, stream: StreamReceiverConfig) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    pub fn with_refresh(mut self, refresh: RefreshConfig) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn with_definitions(mut self, definitions: Vec<PathBuf>) -> Self {
        self.definitions = definitions;
        self
    }

    pub fn with_bindings_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.bindings_file = Some(path.into());
        self
    }
}
