//! Persistent user settings, stored as JSON in the user's config directory.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::editor::{Color, ToolState};
use crate::output::OutputTarget;

pub const MAX_CAPTURE_DELAY_SECS: u32 = 10;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to access settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed settings file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub ready_timeout_ms: u64,
    pub focus_poll_ms: u64,
    pub min_selection_size: f64,
    pub handle_radius: f64,
    pub mosaic_block_size: u32,
    pub blur_radius: f32,
    pub stroke_width: f64,
    pub font_size: f64,
    pub color: Color,
    pub default_output: OutputTarget,
    pub save_directory: Option<PathBuf>,
    pub capture_delay_secs: u32,
    pub undo_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ready_timeout_ms: 2000,
            focus_poll_ms: 50,
            min_selection_size: 10.0,
            handle_radius: 12.0,
            mosaic_block_size: 12,
            blur_radius: 8.0,
            stroke_width: 3.0,
            font_size: 24.0,
            color: Color::RED,
            default_output: OutputTarget::Clipboard,
            save_directory: dirs::picture_dir(),
            capture_delay_secs: 0,
            undo_limit: 100,
        }
    }
}

impl Settings {
    /// `<config dir>/multishot/settings.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("multishot").join("settings.json"))
    }

    /// Loads from the default path, falling back to defaults on any problem.
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            warn!("No config directory; using default settings");
            return Self::default();
        };

        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(SettingsError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings file at {:?}; using defaults", path);
                Self::default()
            }
            Err(e) => {
                warn!("Ignoring settings at {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&text)?;
        Ok(settings.sanitized())
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        match Self::default_path() {
            Some(path) => self.save_to(&path),
            None => Err(SettingsError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no config directory",
            ))),
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("Settings saved to {:?}", path);
        Ok(())
    }

    /// Clamps out-of-range values read from disk.
    pub fn sanitized(mut self) -> Self {
        self.capture_delay_secs = self.capture_delay_secs.min(MAX_CAPTURE_DELAY_SECS);
        self.ready_timeout_ms = self.ready_timeout_ms.clamp(100, 30_000);
        self.focus_poll_ms = self.focus_poll_ms.clamp(10, 1000);
        self.min_selection_size = self.min_selection_size.max(1.0);
        self.handle_radius = self.handle_radius.max(1.0);
        self.mosaic_block_size = self.mosaic_block_size.clamp(2, 128);
        self.stroke_width = self.stroke_width.clamp(1.0, 50.0);
        self.font_size = self.font_size.clamp(8.0, 200.0);
        self.undo_limit = self.undo_limit.clamp(1, 1000);
        self
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    pub fn focus_poll_interval(&self) -> Duration {
        Duration::from_millis(self.focus_poll_ms)
    }

    pub fn save_directory(&self) -> PathBuf {
        self.save_directory
            .clone()
            .or_else(dirs::picture_dir)
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Initial tool settings for a new overlay.
    pub fn tool_state(&self) -> ToolState {
        ToolState {
            color: self.color,
            stroke_width: self.stroke_width,
            font_size: self.font_size,
            mosaic_block_size: self.mosaic_block_size,
            blur_radius: self.blur_radius,
            ..ToolState::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("multishot").join("settings.json");

        let settings = Settings {
            default_output: OutputTarget::Pin,
            capture_delay_secs: 3,
            color: Color::rgb(0, 128, 255),
            ..Settings::default()
        };
        settings.save_to(&path).unwrap();

        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "defaultOutput": "file", "mosaicBlockSize": 20 }"#).unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.default_output, OutputTarget::File);
        assert_eq!(settings.mosaic_block_size, 20);
        assert_eq!(settings.ready_timeout_ms, 2000);
    }

    #[test]
    fn test_out_of_range_values_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{ "captureDelaySecs": 60, "strokeWidth": 0.1, "undoLimit": 0 }"#,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.capture_delay_secs, MAX_CAPTURE_DELAY_SECS);
        assert_eq!(settings.stroke_width, 1.0);
        assert_eq!(settings.undo_limit, 1);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(Settings::load_from(&path), Err(SettingsError::Parse(_))));
    }
}
