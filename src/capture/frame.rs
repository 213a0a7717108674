//! Parallel per-display frame capture.

use image::{ImageFormat, RgbaImage};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Instant;

use super::{CaptureError, DisplayInfo};

/// A frozen frame of one display, in physical pixels, plus its PNG encoding.
pub struct CaptureResult {
    pub display_index: usize,
    pub image: RgbaImage,
    pub encoded: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl CaptureResult {
    pub fn from_image(display_index: usize, image: RgbaImage) -> Result<Self, CaptureError> {
        let mut encoded = Vec::new();
        image.write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)?;

        Ok(Self {
            display_index,
            width: image.width(),
            height: image.height(),
            image,
            encoded,
        })
    }
}

impl std::fmt::Debug for CaptureResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureResult")
            .field("display_index", &self.display_index)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("encoded_len", &self.encoded.len())
            .finish()
    }
}

/// Grabs the current contents of a single display.
///
/// Implementations are called from one thread per display at the same time.
pub trait FrameGrabber: Send + Sync {
    fn name(&self) -> &'static str;

    fn capture_display(&self, display: &DisplayInfo) -> Result<RgbaImage, CaptureError>;
}

/// Captures every display concurrently and encodes each frame.
///
/// A display whose capture fails (or whose thread panics) is logged and left
/// out of the map. Only when nothing was captured does this return an error.
pub fn capture_all(
    grabber: &dyn FrameGrabber,
    displays: &[DisplayInfo],
) -> Result<BTreeMap<usize, Arc<CaptureResult>>, CaptureError> {
    let started = Instant::now();
    let results = Mutex::new(BTreeMap::new());

    thread::scope(|scope| {
        let handles: Vec<_> = displays
            .iter()
            .map(|display| {
                let results = &results;
                scope.spawn(move || {
                    let captured = grabber
                        .capture_display(display)
                        .and_then(|image| CaptureResult::from_image(display.index, image));

                    match captured {
                        Ok(result) => {
                            debug!(
                                "Captured display {} ({}x{})",
                                display.index, result.width, result.height
                            );
                            results
                                .lock()
                                .unwrap_or_else(PoisonError::into_inner)
                                .insert(display.index, Arc::new(result));
                        }
                        Err(e) => warn!("Display {} not captured: {}", display.index, e),
                    }
                })
            })
            .collect();

        for (display, handle) in displays.iter().zip(handles) {
            if handle.join().is_err() {
                warn!("Capture thread for display {} panicked", display.index);
            }
        }
    });

    let results = results.into_inner().unwrap_or_else(PoisonError::into_inner);
    if results.is_empty() {
        return Err(CaptureError::NoCaptures);
    }

    info!(
        "Captured {}/{} displays with {} in {:.0?}",
        results.len(),
        displays.len(),
        grabber.name(),
        started.elapsed()
    );
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    struct FakeGrabber {
        failing: Option<usize>,
        panicking: Option<usize>,
    }

    impl FrameGrabber for FakeGrabber {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn capture_display(&self, display: &DisplayInfo) -> Result<RgbaImage, CaptureError> {
            if self.panicking == Some(display.index) {
                panic!("grabber exploded");
            }
            if self.failing == Some(display.index) {
                return Err(CaptureError::CaptureFailed {
                    index: display.index,
                    reason: "permission denied".to_string(),
                });
            }
            let shade = (display.index * 40) as u8;
            Ok(RgbaImage::from_pixel(
                display.physical_width(),
                display.physical_height(),
                Rgba([shade, shade, shade, 255]),
            ))
        }
    }

    fn displays(count: usize) -> Vec<DisplayInfo> {
        (0..count)
            .map(|index| DisplayInfo {
                index,
                logical_x: index as i32 * 16,
                logical_y: 0,
                logical_width: 16,
                logical_height: 8,
                scale_factor: 1.0 + index as f64,
                is_primary: index == 0,
                name: format!("OUT-{}", index),
            })
            .collect()
    }

    #[test]
    fn test_capture_all_displays() {
        let grabber = FakeGrabber {
            failing: None,
            panicking: None,
        };
        let results = capture_all(&grabber, &displays(3)).unwrap();

        assert_eq!(results.len(), 3);
        let second = &results[&1];
        assert_eq!((second.width, second.height), (32, 16));
        assert_eq!(&second.encoded[..4], &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_one_failure_yields_subset() {
        let grabber = FakeGrabber {
            failing: Some(1),
            panicking: None,
        };
        let results = capture_all(&grabber, &displays(3)).unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.contains_key(&0));
        assert!(!results.contains_key(&1));
        assert!(results.contains_key(&2));
    }

    #[test]
    fn test_panicking_grabber_is_tolerated() {
        let grabber = FakeGrabber {
            failing: None,
            panicking: Some(0),
        };
        let results = capture_all(&grabber, &displays(2)).unwrap();
        assert_eq!(results.keys().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_all_failures_is_an_error() {
        let grabber = FakeGrabber {
            failing: Some(0),
            panicking: None,
        };
        let err = capture_all(&grabber, &displays(1)).unwrap_err();
        assert!(matches!(err, CaptureError::NoCaptures));
    }
}
