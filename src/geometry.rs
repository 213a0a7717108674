//! Coordinate algebra shared by capture, overlays and output.
//!
//! Three spaces are in play:
//! - logical: the unit the OS reports monitor geometry in,
//! - physical: device pixels, `logical * scale_factor`,
//! - virtual desktop: the bounding box of every display's physical rectangle.
//!
//! Everything here is pure so it can be tested without a window system.

use image::{imageops, RgbaImage};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::capture::{CaptureResult, DisplayInfo};
use crate::selection::{HandleType, Selection};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A rectangle in physical (device) pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PhysicalRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PhysicalRect {
    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }
}

/// Where an overlay window for a display goes.
///
/// The window manager maps logical window geometry to physical pixels
/// itself, so the window is placed at the physical origin but sized in
/// logical units. The drawing surface inside it works in physical pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayPlacement {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub scale_factor: f64,
}

pub fn logical_to_physical(value: f64, scale_factor: f64) -> f64 {
    value * scale_factor
}

pub fn physical_to_logical(value: f64, scale_factor: f64) -> f64 {
    if scale_factor <= 0.0 {
        return value;
    }
    value / scale_factor
}

/// Converts a point in an overlay widget (logical units) to the physical
/// pixel space of the frozen frame shown in that overlay.
pub fn window_to_physical(point: Point, scale_factor: f64) -> Point {
    Point::new(
        logical_to_physical(point.x, scale_factor),
        logical_to_physical(point.y, scale_factor),
    )
}

pub fn physical_to_window(point: Point, scale_factor: f64) -> Point {
    Point::new(
        physical_to_logical(point.x, scale_factor),
        physical_to_logical(point.y, scale_factor),
    )
}

pub fn physical_rect(display: &DisplayInfo) -> PhysicalRect {
    let scale = display.scale_factor;
    PhysicalRect {
        x: logical_to_physical(display.logical_x as f64, scale).round() as i32,
        y: logical_to_physical(display.logical_y as f64, scale).round() as i32,
        width: logical_to_physical(display.logical_width as f64, scale).round() as u32,
        height: logical_to_physical(display.logical_height as f64, scale).round() as u32,
    }
}

pub fn overlay_placement(display: &DisplayInfo) -> OverlayPlacement {
    let physical = physical_rect(display);
    OverlayPlacement {
        x: physical.x,
        y: physical.y,
        width: display.logical_width,
        height: display.logical_height,
        scale_factor: display.scale_factor,
    }
}

/// Bounding box of all displays' physical rectangles.
pub fn virtual_bounds(displays: &[DisplayInfo]) -> Option<PhysicalRect> {
    let mut rects = displays.iter().map(physical_rect);
    let first = rects.next()?;

    let (mut min_x, mut min_y) = (first.x, first.y);
    let (mut max_x, mut max_y) = (first.right(), first.bottom());

    for rect in rects {
        min_x = min_x.min(rect.x);
        min_y = min_y.min(rect.y);
        max_x = max_x.max(rect.right());
        max_y = max_y.max(rect.bottom());
    }

    Some(PhysicalRect {
        x: min_x,
        y: min_y,
        width: (max_x - min_x) as u32,
        height: (max_y - min_y) as u32,
    })
}

/// Blits every captured frame into one canvas covering the virtual desktop.
///
/// Each frame lands at `physical_origin - virtual_origin`. Displays without
/// a capture stay transparent.
pub fn merge_captures(
    displays: &[DisplayInfo],
    results: &BTreeMap<usize, Arc<CaptureResult>>,
) -> Option<(PhysicalRect, RgbaImage)> {
    let bounds = virtual_bounds(displays)?;
    let mut canvas = RgbaImage::new(bounds.width, bounds.height);

    for display in displays {
        let Some(result) = results.get(&display.index) else {
            continue;
        };
        let origin = physical_rect(display);
        imageops::replace(
            &mut canvas,
            &result.image,
            (origin.x - bounds.x) as i64,
            (origin.y - bounds.y) as i64,
        );
    }

    Some((bounds, canvas))
}

/// The 8 resize anchors of a selection, in `HandleType::ALL` order.
pub fn handle_anchors(selection: &Selection) -> [(HandleType, Point); 8] {
    let Selection {
        x,
        y,
        width: w,
        height: h,
    } = *selection;

    [
        (HandleType::NW, Point::new(x, y)),
        (HandleType::N, Point::new(x + w / 2.0, y)),
        (HandleType::NE, Point::new(x + w, y)),
        (HandleType::E, Point::new(x + w, y + h / 2.0)),
        (HandleType::SE, Point::new(x + w, y + h)),
        (HandleType::S, Point::new(x + w / 2.0, y + h)),
        (HandleType::SW, Point::new(x, y + h)),
        (HandleType::W, Point::new(x, y + h / 2.0)),
    ]
}

/// Index of the display whose logical rectangle contains the point.
pub fn display_at_logical(displays: &[DisplayInfo], x: f64, y: f64) -> Option<usize> {
    displays
        .iter()
        .find(|d| d.contains_logical(x, y))
        .map(|d| d.index)
}
