//! Configuration management
//!
//! TOML-based configuration for the modal subsystem: registry behavior
//! (default exit delay, scroll restore), the class names applied by the
//! renderers, and the theme the classes resolve against.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{ModalError, ModalResult};

/// Main crate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Registry and renderer behavior
    pub behavior: BehaviorConfig,
    /// Class names applied by the renderers
    pub classes: ClassConfig,
    /// Theme the class names resolve against
    pub theme: ThemeConfig,
}

/// Registry and renderer behavior settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Fallback exit delay for mounts that do not specify their own
    pub default_out_delay_ms: u64,
    /// Capture the scroll offset when the first modal appears and restore
    /// it after the last one is gone
    pub restore_scroll: bool,
    /// Paint-frame interval used by the terminal host
    pub frame_interval_ms: u64,
}

/// Class names applied by the renderers when a mount does not override them
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassConfig {
    /// Applied to each set's container
    pub container: String,
    /// Applied to each modal
    pub modal: String,
    /// Applied to each backdrop
    pub backdrop: String,
    /// Document-level marker while any modal is shown
    pub body_open: String,
}

/// Theme selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Theme name resolved by `Theme::load`
    pub name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            behavior: BehaviorConfig::default(),
            classes: ClassConfig::default(),
            theme: ThemeConfig::default(),
        }
    }
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            default_out_delay_ms: 0,
            restore_scroll: true,
            frame_interval_ms: 16,
        }
    }
}

impl Default for ClassConfig {
    fn default() -> Self {
        Self {
            container: "modal-registry__container".to_string(),
            modal: "modal-registry__modal".to_string(),
            backdrop: "modal-registry__backdrop".to_string(),
            body_open: "modal-registry__modal-open".to_string(),
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./modal-registry.toml
    /// 2. ~/.config/modal-registry/config.toml
    /// 3. Default configuration
    pub async fn load() -> ModalResult<Self> {
        info!("Loading modal-registry configuration");

        if let Ok(config) = Self::load_from_file("./modal-registry.toml").await {
            info!("Loaded configuration from ./modal-registry.toml");
            return Ok(config);
        }

        if let Some(config_path) = Self::user_config_path() {
            if let Ok(config) = Self::load_from_file(&config_path).await {
                info!("Loaded configuration from {}", config_path.display());
                return Ok(config);
            }
        }

        info!("Using default configuration");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> ModalResult<Self> {
        let path = path.as_ref();
        debug!("Loading configuration from: {}", path.display());

        let content = fs::read_to_string(path).await?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> ModalResult<()> {
        if self.behavior.frame_interval_ms == 0 {
            return Err(ModalError::application("frame_interval_ms must be > 0"));
        }
        if self.behavior.default_out_delay_ms > 60_000 {
            return Err(ModalError::application(
                "default_out_delay_ms above 60s is almost certainly a unit mistake",
            ));
        }
        for (field, value) in [
            ("classes.container", &self.classes.container),
            ("classes.modal", &self.classes.modal),
            ("classes.backdrop", &self.classes.backdrop),
            ("classes.body_open", &self.classes.body_open),
        ] {
            if value.trim().is_empty() {
                return Err(ModalError::application(format!("{field} must not be empty")));
            }
        }
        Ok(())
    }

    /// The registry-wide fallback exit delay
    pub fn default_out_delay(&self) -> Duration {
        Duration::from_millis(self.behavior.default_out_delay_ms)
    }

    /// The terminal host's paint-frame interval
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.behavior.frame_interval_ms)
    }

    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("modal-registry").join("config.toml"))
    }
}
