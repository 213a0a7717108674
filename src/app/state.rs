//! Application state types
//!
//! State that outlives a single capture session: user settings, keyboard
//! shortcuts and the capture delay chosen in the header bar.

use std::path::PathBuf;

use super::config::ShortcutConfig;
use super::settings::{Settings, MAX_CAPTURE_DELAY_SECS};

/// Main application state
pub struct AppState {
    pub settings: Settings,
    pub shortcuts: ShortcutConfig,
    /// Screenshot delay in seconds
    pub delay_seconds: u32,
    /// Where the last file was saved, used as the next dialog's folder
    pub last_save_path: Option<PathBuf>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            delay_seconds: settings.capture_delay_secs.min(MAX_CAPTURE_DELAY_SECS),
            settings,
            shortcuts: ShortcutConfig::default(),
            last_save_path: None,
        }
    }

    /// Set the screenshot delay, capped at 10 seconds
    pub fn set_delay(&mut self, seconds: u32) {
        self.delay_seconds = seconds.min(MAX_CAPTURE_DELAY_SECS);
    }

    pub fn save_folder(&self) -> PathBuf {
        self.last_save_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| self.settings.save_directory())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_bounds() {
        let mut state = AppState::new(Settings {
            capture_delay_secs: 3,
            ..Settings::default()
        });
        assert_eq!(state.delay_seconds, 3);

        state.set_delay(0);
        assert_eq!(state.delay_seconds, 0);

        state.set_delay(60);
        assert_eq!(state.delay_seconds, MAX_CAPTURE_DELAY_SECS);
    }

    #[test]
    fn test_save_folder_follows_last_save() {
        let mut state = AppState::new(Settings {
            save_directory: Some(PathBuf::from("/tmp/shots")),
            ..Settings::default()
        });
        assert_eq!(state.save_folder(), PathBuf::from("/tmp/shots"));

        state.last_save_path = Some(PathBuf::from("/home/me/out/a.png"));
        assert_eq!(state.save_folder(), PathBuf::from("/home/me/out"));
    }
}
