//! Pinned image state: what is shown and at what size.

use image::ImageReader;
use std::io::Cursor;
use std::sync::atomic::{AtomicU64, Ordering};

use super::OutputError;

/// Longest side of a pinned window when it first appears.
pub const MAX_INITIAL_SIDE: u32 = 400;
pub const MIN_SIDE: u32 = 200;

static NEXT_PIN_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Debug)]
pub struct PinnedImage {
    pub id: u64,
    pub encoded: Vec<u8>,
    pub original_width: u32,
    pub original_height: u32,
}

impl PinnedImage {
    pub fn from_png(encoded: Vec<u8>) -> Result<Self, OutputError> {
        let (original_width, original_height) = ImageReader::new(Cursor::new(&encoded))
            .with_guessed_format()?
            .into_dimensions()?;

        Ok(Self {
            id: NEXT_PIN_ID.fetch_add(1, Ordering::Relaxed),
            encoded,
            original_width,
            original_height,
        })
    }
}

/// Requested screen rectangle for a pinned window, in logical units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PinPlacement {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Size bookkeeping for a pinned window.
///
/// Double-click toggles between the size the user last chose and the
/// image's original size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PinGeometry {
    original: (u32, u32),
    current: (u32, u32),
    previous: Option<(u32, u32)>,
}

impl PinGeometry {
    pub fn new(original_width: u32, original_height: u32) -> Self {
        let original = (original_width.max(1), original_height.max(1));
        Self {
            original,
            current: initial_size(original),
            previous: None,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        self.current
    }

    pub fn original(&self) -> (u32, u32) {
        self.original
    }

    pub fn is_original(&self) -> bool {
        self.current == self.original
    }

    /// Flips between the original size and the size before the last toggle.
    pub fn toggle(&mut self) -> (u32, u32) {
        if self.is_original() {
            if let Some(previous) = self.previous.take() {
                self.current = previous;
            }
        } else {
            self.previous = Some(self.current);
            self.current = self.original;
        }
        self.current
    }

    /// A user resize, clamped to the minimum window size.
    ///
    /// Reporting back the size this geometry last produced is not a resize,
    /// so a toggled or initial size below the minimum survives the window's
    /// size notification.
    pub fn resize(&mut self, width: u32, height: u32) -> (u32, u32) {
        if (width, height) != self.current {
            self.current = (width.max(MIN_SIDE), height.max(MIN_SIDE));
        }
        self.current
    }
}

fn initial_size((width, height): (u32, u32)) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= MAX_INITIAL_SIDE {
        return (width, height);
    }
    let scale = MAX_INITIAL_SIDE as f64 / longest as f64;
    (
        ((width as f64 * scale).round() as u32).max(1),
        ((height as f64 * scale).round() as u32).max(1),
    )
}
