//! Configuration management for pairmux.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//!
//! # Example
//!
//! ```no_run
//! use pairmux_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new("pairmux.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Remote: {}", config.settings().remote.remote_name);
//!
//! config.settings_mut().pipeline.workers = 2;
//! config.update_section(ConfigSection::Pipeline).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, LoggingSettings, PathSettings, PipelineSettings, RemoteSettings, Settings,
    ToolSettings, ValidationSettings,
};
