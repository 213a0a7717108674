//! Calls made by an overlay frontend. Image payloads arrive as base64 PNG.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::output::{
    sinks, ClipboardSink, FileSaveDialog, OutputError, PinPlacement, PinnedImage,
    PinnedWindowHost,
};
use crate::session::{Orchestrator, OverlayHost, SessionError, SessionId};

const DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Accepts raw base64 or a `data:image/png;base64,` URL.
pub fn decode_base64_png(data: &str) -> Result<Vec<u8>, OutputError> {
    let data = data.trim();
    let data = data.strip_prefix(DATA_URL_PREFIX).unwrap_or(data);
    Ok(STANDARD.decode(data)?)
}

pub fn encode_base64_png(png: &[u8]) -> String {
    STANDARD.encode(png)
}

pub fn start_capture<H: OverlayHost>(
    orchestrator: &mut Orchestrator<H>,
) -> Result<SessionId, SessionError> {
    orchestrator.start_capture()
}

pub fn frontend_ready<H: OverlayHost>(orchestrator: &Orchestrator<H>, display_index: usize) {
    orchestrator.frontend_ready(display_index);
}

pub fn focus_display_window<H: OverlayHost>(
    orchestrator: &mut Orchestrator<H>,
    display_index: usize,
) -> Result<(), SessionError> {
    orchestrator.focus_display_window(display_index)
}

pub fn cancel_capture<H: OverlayHost>(orchestrator: &mut Orchestrator<H>) {
    orchestrator.cancel_capture();
}

pub fn copy_to_clipboard(sink: &dyn ClipboardSink, base64_png: &str) -> Result<(), OutputError> {
    let png = decode_base64_png(base64_png)?;
    sink.set_image(&png)?;
    info!("Copied {} bytes to clipboard", png.len());
    Ok(())
}

pub fn save_image(base64_png: &str, path: &Path) -> Result<PathBuf, OutputError> {
    let png = decode_base64_png(base64_png)?;
    sinks::save_to_path(&png, path)
}

/// Returns `None` when the user dismissed the dialog.
pub async fn save_image_with_dialog(
    dialog: &dyn FileSaveDialog,
    base64_png: &str,
    default_name: &str,
) -> Result<Option<PathBuf>, OutputError> {
    let png = decode_base64_png(base64_png)?;
    match dialog.prompt(default_name, &["png"]).await? {
        Some(path) => sinks::save_to_path(&png, &path).map(Some),
        None => {
            debug!("Save dialog dismissed");
            Ok(None)
        }
    }
}

pub fn pin_image(
    host: &dyn PinnedWindowHost,
    base64_png: &str,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
) -> Result<(), OutputError> {
    let image = PinnedImage::from_png(decode_base64_png(base64_png)?)?;
    host.create_pinned(
        image,
        PinPlacement {
            x,
            y,
            width,
            height,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{encode_png, sinks::LocalFuture};
    use gtk4::glib;
    use image::{Rgba, RgbaImage};
    use std::cell::RefCell;

    fn sample_png() -> Vec<u8> {
        encode_png(&RgbaImage::from_pixel(4, 3, Rgba([1, 2, 3, 255]))).unwrap()
    }

    struct FailingClipboard;

    impl ClipboardSink for FailingClipboard {
        fn set_image(&self, _png: &[u8]) -> Result<(), OutputError> {
            Err(OutputError::Clipboard("no owner".to_string()))
        }
    }

    struct FixedDialog(Option<PathBuf>);

    impl FileSaveDialog for FixedDialog {
        fn prompt(
            &self,
            default_name: &str,
            extensions: &[&str],
        ) -> LocalFuture<Result<Option<PathBuf>, OutputError>> {
            assert_eq!(extensions, ["png"]);
            assert!(default_name.ends_with(".png"));
            let path = self.0.clone();
            Box::pin(async move { Ok(path) })
        }
    }

    #[derive(Default)]
    struct RecordingPins {
        pins: RefCell<Vec<(PinnedImage, PinPlacement)>>,
    }

    impl PinnedWindowHost for RecordingPins {
        fn create_pinned(
            &self,
            image: PinnedImage,
            placement: PinPlacement,
        ) -> Result<(), OutputError> {
            self.pins.borrow_mut().push((image, placement));
            Ok(())
        }
    }

    #[test]
    fn test_data_url_prefix_accepted() {
        let png = sample_png();
        let url = format!("{}{}", DATA_URL_PREFIX, encode_base64_png(&png));
        assert_eq!(decode_base64_png(&url).unwrap(), png);
    }

    #[test]
    fn test_invalid_base64_rejected() {
        assert!(matches!(
            decode_base64_png("not base64!"),
            Err(OutputError::Decode(_))
        ));
    }

    #[test]
    fn test_clipboard_failure_surfaces() {
        let b64 = encode_base64_png(&sample_png());
        assert!(matches!(
            copy_to_clipboard(&FailingClipboard, &b64),
            Err(OutputError::Clipboard(_))
        ));
    }

    #[test]
    fn test_save_image_writes_decoded_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let png = sample_png();

        let path = save_image(&encode_base64_png(&png), &dir.path().join("shot.png")).unwrap();
        assert_eq!(std::fs::read(path).unwrap(), png);
    }

    #[test]
    fn test_dialog_cancel_is_not_an_error() {
        let b64 = encode_base64_png(&sample_png());
        let result = glib::MainContext::new().block_on(save_image_with_dialog(
            &FixedDialog(None),
            &b64,
            "screenshot_1.png",
        ));
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn test_dialog_path_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("picked");
        let b64 = encode_base64_png(&sample_png());

        let result = glib::MainContext::new()
            .block_on(save_image_with_dialog(
                &FixedDialog(Some(target)),
                &b64,
                "screenshot_1.png",
            ))
            .unwrap();
        assert_eq!(result, Some(dir.path().join("picked.png")));
    }

    #[test]
    fn test_pin_image_reads_dimensions() {
        let host = RecordingPins::default();
        let b64 = encode_base64_png(&sample_png());

        pin_image(&host, &b64, 10, 20, 4, 3).unwrap();

        let pins = host.pins.borrow();
        assert_eq!(pins.len(), 1);
        assert_eq!((pins[0].0.original_width, pins[0].0.original_height), (4, 3));
        assert_eq!(
            pins[0].1,
            PinPlacement {
                x: 10,
                y: 20,
                width: 4,
                height: 3
            }
        );
    }
}
