use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vantage_runtime::ViewSettings;

pub const CONFIG_FILE: &str = "vantage.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSection {
    pub title: String,
    pub fps: u32,
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            title: "Vantage".into(),
            fps: 120,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSection {
    pub background: [f32; 4],
    pub highlight: [f32; 3],
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSection {
    pub radius: f32,
    pub theta: f32,
    pub phi: f32,
    pub step: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSection {
    pub filter: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            filter: "warn".into(),
        }
    }
}

impl Default for RenderSection {
    fn default() -> Self {
        let view = ViewSettings::default();
        Self {
            background: view.background,
            highlight: view.highlight,
        }
    }
}

impl Default for CameraSection {
    fn default() -> Self {
        let view = ViewSettings::default();
        Self {
            radius: view.radius,
            theta: view.theta,
            phi: view.phi,
            step: view.step,
        }
    }
}

/// Viewer settings read from `vantage.toml`. Missing sections and keys fall
/// back to their defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: WindowSection,
    pub render: RenderSection,
    pub camera: CameraSection,
    pub log: LogSection,
}

impl ViewerConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads `path`, or returns the defaults when the file does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn write_default(path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = toml::to_string_pretty(&Self::default())?;
        std::fs::write(path, text).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn view_settings(&self) -> ViewSettings {
        ViewSettings {
            background: self.render.background,
            highlight: self.render.highlight,
            theta: self.camera.theta,
            phi: self.camera.phi,
            radius: self.camera.radius,
            step: self.camera.step,
        }
    }
}
