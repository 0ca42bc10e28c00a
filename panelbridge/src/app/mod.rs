//! Application bootstrap and lifecycle management.
//!
//! [`PanelBridgeApp`] starts a complete session in one call and shuts it
//! down cooperatively.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       PanelBridgeApp                          │
//! │                                                               │
//! │  UdpStreamReceiver ──mpsc──► StreamDispatcher                 │
//! │   (ProtocolParser)            │ OutputValue / FormulaState    │
//! │                               │ BindingState (dirty)          │
//! │                               ▼ Notify                        │
//! │                         RefreshScheduler ──► Surface/Renderer │
//! │                                                               │
//! │  one CancellationToken shared by all three tasks              │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use panelbridge::app::{AppConfig, PanelBridgeApp};
//! use panelbridge::config::ConfigFile;
//!
//! let config = AppConfig::from_config_file(&ConfigFile::load()?);
//! let app = PanelBridgeApp::start(config).await?;
//!
//! // Later: graceful shutdown
//! let summary = app.shutdown().await;
//! println!("{}", summary);
//! ```

mod bootstrap;
mod config;
mod error;

pub use bootstrap::{AppBuilder, PanelBridgeApp, DEFAULT_SURFACE};
pub use config::AppConfig;
pub use error::AppError;
