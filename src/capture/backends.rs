//! Frame grabber implementations.

use image::RgbaImage;
use log::{info, warn};
use std::process::Command;
use xcap::Monitor;

use super::desktop::{CaptureBackend, DesktopSession};
use super::{CaptureError, DisplayInfo, FrameGrabber};

/// Captures through xcap. Monitors are re-enumerated per call because xcap
/// handles are not shared across capture threads.
pub struct XcapGrabber;

impl FrameGrabber for XcapGrabber {
    fn name(&self) -> &'static str {
        "xcap"
    }

    fn capture_display(&self, display: &DisplayInfo) -> Result<RgbaImage, CaptureError> {
        let failed = |reason: String| CaptureError::CaptureFailed {
            index: display.index,
            reason,
        };

        let monitors = Monitor::all().map_err(|e| failed(e.to_string()))?;
        let by_name = monitors
            .iter()
            .position(|m| m.name().map(|n| n == display.name).unwrap_or(false));
        let monitor = by_name
            .or((display.index < monitors.len()).then_some(display.index))
            .and_then(|i| monitors.get(i))
            .ok_or_else(|| failed(format!("monitor '{}' disappeared", display.name)))?;

        monitor.capture_image().map_err(|e| failed(e.to_string()))
    }
}

/// Captures one wlroots output with `grim -o <name> -`, reading PNG from stdout.
pub struct GrimGrabber;

impl FrameGrabber for GrimGrabber {
    fn name(&self) -> &'static str {
        "grim"
    }

    fn capture_display(&self, display: &DisplayInfo) -> Result<RgbaImage, CaptureError> {
        let failed = |reason: String| CaptureError::CaptureFailed {
            index: display.index,
            reason,
        };

        let output = Command::new("grim")
            .args(["-t", "png", "-o", &display.name, "-"])
            .output()
            .map_err(|e| failed(format!("failed to run grim: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(failed(format!("grim exited with {}: {}", output.status, stderr.trim())));
        }

        let image = image::load_from_memory(&output.stdout).map_err(|e| failed(e.to_string()))?;
        Ok(image.to_rgba8())
    }
}

/// Tries `primary` first and falls back on any error.
pub struct FallbackGrabber<P, F> {
    primary: P,
    fallback: F,
}

impl<P: FrameGrabber, F: FrameGrabber> FallbackGrabber<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P: FrameGrabber, F: FrameGrabber> FrameGrabber for FallbackGrabber<P, F> {
    fn name(&self) -> &'static str {
        self.primary.name()
    }

    fn capture_display(&self, display: &DisplayInfo) -> Result<RgbaImage, CaptureError> {
        match self.primary.capture_display(display) {
            Ok(image) => Ok(image),
            Err(e) => {
                warn!(
                    "{} failed for display {} ({}), trying {}",
                    self.primary.name(),
                    display.index,
                    e,
                    self.fallback.name()
                );
                self.fallback.capture_display(display)
            }
        }
    }
}

pub fn grabber_for_session(session: &DesktopSession) -> Box<dyn FrameGrabber> {
    let backend = session.capture_backend();
    info!("Capture backend for {}: {}", session, backend);

    match backend {
        CaptureBackend::Grim => Box::new(FallbackGrabber::new(GrimGrabber, XcapGrabber)),
        CaptureBackend::Xcap => Box::new(XcapGrabber),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    struct Failing;

    impl FrameGrabber for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn capture_display(&self, display: &DisplayInfo) -> Result<RgbaImage, CaptureError> {
            Err(CaptureError::CaptureFailed {
                index: display.index,
                reason: "unsupported".to_string(),
            })
        }
    }

    struct Solid;

    impl FrameGrabber for Solid {
        fn name(&self) -> &'static str {
            "solid"
        }

        fn capture_display(&self, _display: &DisplayInfo) -> Result<RgbaImage, CaptureError> {
            Ok(RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255])))
        }
    }

    #[test]
    fn test_fallback_used_on_primary_failure() {
        let grabber = FallbackGrabber::new(Failing, Solid);
        let display = DisplayInfo {
            index: 0,
            logical_x: 0,
            logical_y: 0,
            logical_width: 2,
            logical_height: 2,
            scale_factor: 1.0,
            is_primary: true,
            name: "eDP-1".to_string(),
        };

        let image = grabber.capture_display(&display).unwrap();
        assert_eq!(image.get_pixel(1, 1), &Rgba([1, 2, 3, 255]));
        assert_eq!(grabber.name(), "failing");
    }
}
