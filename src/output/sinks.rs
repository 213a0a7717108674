//! Output destinations. The window-system implementations live in `ui`.

use log::info;
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::{SystemTime, UNIX_EPOCH};

use super::{OutputError, PinPlacement, PinnedImage};

pub type LocalFuture<T> = Pin<Box<dyn Future<Output = T>>>;

pub trait ClipboardSink {
    fn set_image(&self, png: &[u8]) -> Result<(), OutputError>;
}

pub trait FileSaveDialog {
    /// Resolves to `None` when the user dismisses the dialog.
    fn prompt(
        &self,
        default_name: &str,
        extensions: &[&str],
    ) -> LocalFuture<Result<Option<PathBuf>, OutputError>>;
}

pub trait PinnedWindowHost {
    fn create_pinned(&self, image: PinnedImage, placement: PinPlacement) -> Result<(), OutputError>;
}

/// `screenshot_<unix seconds>.png`
pub fn default_file_name(now: SystemTime) -> String {
    let secs = now.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
    format!("screenshot_{}.png", secs)
}

/// Writes PNG bytes, appending a `.png` extension if the path has none.
pub fn save_to_path(png: &[u8], path: &Path) -> Result<PathBuf, OutputError> {
    let path = if path.extension().is_none() {
        path.with_extension("png")
    } else {
        path.to_path_buf()
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, png)?;

    info!("Image saved to {:?}", path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_file_name() {
        let now = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        assert_eq!(default_file_name(now), "screenshot_1700000000.png");
    }

    #[test]
    fn test_save_to_path_adds_extension_and_parents() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("shot");

        let written = save_to_path(b"png-bytes", &target).unwrap();
        assert_eq!(written, dir.path().join("nested").join("shot.png"));
        assert_eq!(fs::read(&written).unwrap(), b"png-bytes");
    }
}
