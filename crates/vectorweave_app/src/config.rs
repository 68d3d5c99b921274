// SPDX-License-Identifier: MIT OR Apache-2.0
//! Render settings.
//!
//! Settings are stored as RON. Every field has a default, so a settings file
//! only needs the values it changes.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use vectorweave_graph::Color;

/// Current settings format version
pub const SETTINGS_VERSION: u32 = 1;

/// How a scene is written as SVG
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Format version
    pub version: u32,
    /// Canvas width when the root is not a canvas node
    pub width: f64,
    /// Canvas height when the root is not a canvas node
    pub height: f64,
    /// Background painted behind non-canvas roots, none if unset
    pub background: Option<Color>,
    /// Decimal places of written coordinates
    pub precision: usize,
    /// Spaces per nesting level, zero for compact output
    pub indent: usize,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            width: 400.0,
            height: 400.0,
            background: None,
            precision: 2,
            indent: 2,
        }
    }
}

impl RenderSettings {
    /// Parse settings, rejecting newer versions
    pub fn from_ron(s: &str, path: &Path) -> Result<Self, AppError> {
        let settings: RenderSettings = ron::from_str(s).map_err(|source| AppError::SettingsParse {
            path: path.to_path_buf(),
            source,
        })?;

        if settings.version > SETTINGS_VERSION {
            return Err(AppError::UnsupportedSettingsVersion {
                found: settings.version,
                supported: SETTINGS_VERSION,
            });
        }

        Ok(settings)
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path).map_err(|source| AppError::SettingsIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron(&content, path)
    }

    /// Load from `path` if given, else defaults
    pub fn resolve(path: Option<&Path>) -> Result<Self, AppError> {
        match path {
            Some(path) => {
                let settings = Self::load(path)?;
                tracing::debug!(path = %path.display(), ?settings, "Loaded render settings");
                Ok(settings)
            }
            None => Ok(Self::default()),
        }
    }
}
