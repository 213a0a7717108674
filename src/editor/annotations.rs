use serde::{Deserialize, Serialize};

use crate::geometry::Point;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const RED: Color = Color::rgb(255, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Channels as cairo wants them, each in `0.0..=1.0`.
    pub fn to_cairo(self) -> (f64, f64, f64, f64) {
        (
            self.r as f64 / 255.0,
            self.g as f64 / 255.0,
            self.b as f64 / 255.0,
            self.a as f64 / 255.0,
        )
    }

    pub fn from_unit(r: f32, g: f32, b: f32, a: f32) -> Self {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::rgba(channel(r), channel(g), channel(b), channel(a))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::RED
    }
}

/// Outline used by both rectangles and ellipses; the ellipse is inscribed.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeAnnotation {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: Color,
    pub stroke_width: f64,
}

impl ShapeAnnotation {
    pub fn from_corners(a: Point, b: Point, color: Color, stroke_width: f64) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
            color,
            stroke_width,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArrowAnnotation {
    pub start: Point,
    pub end: Point,
    pub color: Color,
    pub stroke_width: f64,
}

impl ArrowAnnotation {
    pub fn length(&self) -> f64 {
        self.start.distance_to(self.end)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BrushAnnotation {
    pub points: Vec<Point>,
    pub color: Color,
    pub stroke_width: f64,
}

impl BrushAnnotation {
    pub fn add_point(&mut self, point: Point) {
        if self.points.last() != Some(&point) {
            self.points.push(point);
        }
    }

    pub fn bounding_box(&self) -> Option<(f64, f64, f64, f64)> {
        let first = self.points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &self.points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some((min_x, min_y, max_x - min_x, max_y - min_y))
    }
}

/// Pixelation of a region of the frozen frame.
#[derive(Clone, Debug, PartialEq)]
pub struct MosaicAnnotation {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub block_size: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BlurAnnotation {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub radius: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextAnnotation {
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub color: Color,
    pub font_size: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Annotation {
    Rect(ShapeAnnotation),
    Ellipse(ShapeAnnotation),
    Arrow(ArrowAnnotation),
    Brush(BrushAnnotation),
    Mosaic(MosaicAnnotation),
    Blur(BlurAnnotation),
    Text(TextAnnotation),
}

impl Annotation {
    pub fn kind(&self) -> &'static str {
        match self {
            Annotation::Rect(_) => "rect",
            Annotation::Ellipse(_) => "ellipse",
            Annotation::Arrow(_) => "arrow",
            Annotation::Brush(_) => "brush",
            Annotation::Mosaic(_) => "mosaic",
            Annotation::Blur(_) => "blur",
            Annotation::Text(_) => "text",
        }
    }

    /// Axis-aligned extent as `(x, y, width, height)`.
    ///
    /// Text has no measured extent without a font backend, so its box is
    /// estimated from the font size.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        match self {
            Annotation::Rect(s) | Annotation::Ellipse(s) => (s.x, s.y, s.width, s.height),
            Annotation::Arrow(a) => (
                a.start.x.min(a.end.x),
                a.start.y.min(a.end.y),
                (a.end.x - a.start.x).abs(),
                (a.end.y - a.start.y).abs(),
            ),
            Annotation::Brush(b) => b.bounding_box().unwrap_or_default(),
            Annotation::Mosaic(m) => (m.x, m.y, m.width, m.height),
            Annotation::Blur(b) => (b.x, b.y, b.width, b.height),
            Annotation::Text(t) => {
                let width = t.text.chars().count() as f64 * t.font_size * 0.6;
                (t.x, t.y - t.font_size, width, t.font_size * 1.2)
            }
        }
    }

    /// Too small to be worth keeping once the drag ends.
    pub fn is_degenerate(&self) -> bool {
        match self {
            Annotation::Rect(s) | Annotation::Ellipse(s) => s.width < 2.0 && s.height < 2.0,
            Annotation::Mosaic(m) => m.width < 2.0 || m.height < 2.0,
            Annotation::Blur(b) => b.width < 2.0 || b.height < 2.0,
            Annotation::Arrow(a) => a.length() < 5.0,
            Annotation::Brush(b) => b.points.len() < 2,
            Annotation::Text(t) => t.text.trim().is_empty(),
        }
    }

    pub fn move_by(&mut self, dx: f64, dy: f64) {
        match self {
            Annotation::Rect(s) | Annotation::Ellipse(s) => {
                s.x += dx;
                s.y += dy;
            }
            Annotation::Arrow(a) => {
                a.start.x += dx;
                a.start.y += dy;
                a.end.x += dx;
                a.end.y += dy;
            }
            Annotation::Brush(b) => {
                for p in &mut b.points {
                    p.x += dx;
                    p.y += dy;
                }
            }
            Annotation::Mosaic(m) => {
                m.x += dx;
                m.y += dy;
            }
            Annotation::Blur(b) => {
                b.x += dx;
                b.y += dy;
            }
            Annotation::Text(t) => {
                t.x += dx;
                t.y += dy;
            }
        }
    }
}
