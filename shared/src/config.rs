use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Persisted preference keys. The string form is what ends up in `config.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceKey {
    OverlayAlpha,
    ColorTemperature,
}

impl PreferenceKey {
    pub const ALL: [PreferenceKey; 2] = [PreferenceKey::OverlayAlpha, PreferenceKey::ColorTemperature];

    pub fn as_str(self) -> &'static str {
        match self {
            PreferenceKey::OverlayAlpha => "overlay_alpha",
            PreferenceKey::ColorTemperature => "color_temperature",
        }
    }

    pub fn default_value(self) -> f32 {
        match self {
            PreferenceKey::OverlayAlpha => DEFAULT_OVERLAY_ALPHA,
            PreferenceKey::ColorTemperature => DEFAULT_COLOR_TEMPERATURE,
        }
    }
}

pub const DEFAULT_OVERLAY_ALPHA: f32 = 0.5;
pub const DEFAULT_COLOR_TEMPERATURE: f32 = 0.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize preferences: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Application configuration stored in JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_overlay_alpha")]
    pub overlay_alpha: f32,
    #[serde(default)]
    pub color_temperature: f32,
    /// Whether the user switched the overlay service on
    #[serde(default)]
    pub service_enabled: bool,
    /// Draw-over-other-apps consent; `None` until the user has been asked
    #[serde(default)]
    pub overlay_permission: Option<bool>,
    #[serde(default)]
    pub debug_logging: bool,
}

fn default_overlay_alpha() -> f32 {
    DEFAULT_OVERLAY_ALPHA
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            overlay_alpha: DEFAULT_OVERLAY_ALPHA,
            color_temperature: DEFAULT_COLOR_TEMPERATURE,
            service_enabled: false,
            overlay_permission: None,
            debug_logging: false,
        }
    }
}

pub fn config_dir() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("SubDim")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Clamp a stored fraction into [0, 1]. NaN collapses to the lower bound.
fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Key/value store over `config.json`. Every write is persisted immediately.
#[derive(Debug)]
pub struct PreferenceStore {
    path: PathBuf,
    config: AppConfig,
}

impl PreferenceStore {
    /// Load the store at `path`. Missing or unreadable files yield defaults.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let config = load_config(&path);
        Self { path, config }
    }

    /// Like [`open`](Self::open), but an unreadable or corrupt file is an error
    /// instead of a logged fallback. A missing file still yields defaults.
    pub fn try_open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = read_config(&path)?;
        Ok(Self { path, config })
    }

    /// Defaults bound to `path`, without touching the file.
    pub fn with_defaults(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: AppConfig::default(),
        }
    }

    pub fn open_default() -> Self {
        Self::open(config_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn get(&self, key: PreferenceKey) -> f32 {
        let raw = match key {
            PreferenceKey::OverlayAlpha => self.config.overlay_alpha,
            PreferenceKey::ColorTemperature => self.config.color_temperature,
        };
        clamp_unit(raw)
    }

    pub fn set(&mut self, key: PreferenceKey, value: f32) -> Result<(), ConfigError> {
        let value = clamp_unit(value);
        match key {
            PreferenceKey::OverlayAlpha => self.config.overlay_alpha = value,
            PreferenceKey::ColorTemperature => self.config.color_temperature = value,
        }
        self.save()
    }

    pub fn overlay_alpha(&self) -> f32 {
        self.get(PreferenceKey::OverlayAlpha)
    }

    pub fn color_temperature(&self) -> f32 {
        self.get(PreferenceKey::ColorTemperature)
    }

    pub fn service_enabled(&self) -> bool {
        self.config.service_enabled
    }

    pub fn set_service_enabled(&mut self, enabled: bool) -> Result<(), ConfigError> {
        self.config.service_enabled = enabled;
        self.save()
    }

    pub fn overlay_permission(&self) -> Option<bool> {
        self.config.overlay_permission
    }

    pub fn set_overlay_permission(&mut self, granted: Option<bool>) -> Result<(), ConfigError> {
        self.config.overlay_permission = granted;
        self.save()
    }

    pub fn debug_logging(&self) -> bool {
        self.config.debug_logging
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        save_config(&self.path, &self.config)
    }
}

pub fn load_config(path: &Path) -> AppConfig {
    read_config(path).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "using default config");
        AppConfig::default()
    })
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let data = serde_json::to_string_pretty(config)?;
    fs::write(path, data).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}
