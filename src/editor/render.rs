//! Cairo rendering of annotations.
//!
//! The same code paints the live overlay and the exported image, so what the
//! user sees is what gets copied, saved or pinned.

use gtk4::cairo::{self, Context, Format, ImageSurface};
use image::{imageops, RgbaImage};
use std::f64::consts::PI;

use super::sampling::mosaic_blocks;
use super::{Annotation, ArrowAnnotation, Color, ShapeAnnotation};
use crate::geometry::Point;

/// 35 degrees between the shaft and each side of the arrow head.
const ARROW_HEAD_ANGLE: f64 = 0.610_865_2;

fn set_color(cr: &Context, color: Color) {
    let (r, g, b, a) = color.to_cairo();
    cr.set_source_rgba(r, g, b, a);
}

/// Draws annotations in order, later ones on top.
///
/// `source` is the frozen frame in the same coordinate space as the
/// annotations; mosaic and blur read their pixels from it.
pub fn draw_annotations(
    cr: &Context,
    annotations: &[Annotation],
    source: Option<&RgbaImage>,
) -> Result<(), cairo::Error> {
    for annotation in annotations {
        draw_annotation(cr, annotation, source)?;
    }
    Ok(())
}

pub fn draw_annotation(
    cr: &Context,
    annotation: &Annotation,
    source: Option<&RgbaImage>,
) -> Result<(), cairo::Error> {
    cr.save()?;
    let result = match annotation {
        Annotation::Rect(shape) => draw_rect(cr, shape),
        Annotation::Ellipse(shape) => draw_ellipse(cr, shape),
        Annotation::Arrow(arrow) => draw_arrow(cr, arrow),
        Annotation::Brush(brush) => {
            set_color(cr, brush.color);
            cr.set_line_width(brush.stroke_width);
            cr.set_line_cap(cairo::LineCap::Round);
            cr.set_line_join(cairo::LineJoin::Round);

            if let Some(first) = brush.points.first() {
                cr.move_to(first.x, first.y);
                for point in &brush.points[1..] {
                    cr.line_to(point.x, point.y);
                }
            }
            cr.stroke()
        }
        Annotation::Mosaic(mosaic) => {
            for block in mosaic_blocks(
                mosaic.x,
                mosaic.y,
                mosaic.width,
                mosaic.height,
                mosaic.block_size,
                source,
            ) {
                set_color(cr, block.color);
                cr.rectangle(block.x, block.y, block.width, block.height);
                cr.fill()?;
            }
            Ok(())
        }
        Annotation::Blur(blur) => draw_blur(
            cr,
            blur.x,
            blur.y,
            blur.width,
            blur.height,
            blur.radius,
            source,
        ),
        Annotation::Text(text) => {
            set_color(cr, text.color);
            cr.select_font_face("Sans", cairo::FontSlant::Normal, cairo::FontWeight::Bold);
            cr.set_font_size(text.font_size);
            cr.move_to(text.x, text.y);
            cr.show_text(&text.text)
        }
    };
    cr.restore()?;
    result
}

fn draw_rect(cr: &Context, shape: &ShapeAnnotation) -> Result<(), cairo::Error> {
    set_color(cr, shape.color);
    cr.set_line_width(shape.stroke_width);
    cr.rectangle(shape.x, shape.y, shape.width, shape.height);
    cr.stroke()
}

fn draw_ellipse(cr: &Context, shape: &ShapeAnnotation) -> Result<(), cairo::Error> {
    let rx = shape.width / 2.0;
    let ry = shape.height / 2.0;
    if rx <= 0.0 || ry <= 0.0 {
        // Flat ellipse: a line along the non-zero axis.
        set_color(cr, shape.color);
        cr.set_line_width(shape.stroke_width);
        cr.move_to(shape.x, shape.y);
        cr.line_to(shape.x + shape.width, shape.y + shape.height);
        return cr.stroke();
    }

    cr.save()?;
    cr.translate(shape.x + rx, shape.y + ry);
    cr.scale(rx, ry);
    cr.arc(0.0, 0.0, 1.0, 0.0, 2.0 * PI);
    cr.restore()?;

    set_color(cr, shape.color);
    cr.set_line_width(shape.stroke_width);
    cr.stroke()
}

/// The two barb endpoints of an arrow head, or `None` for arrows too short to draw.
pub fn arrow_head_points(start: Point, end: Point, head_size: f64) -> Option<(Point, Point)> {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let length = (dx * dx + dy * dy).sqrt();
    if length < 5.0 {
        return None;
    }

    let nx = dx / length;
    let ny = dy / length;
    let (sin_a, cos_a) = ARROW_HEAD_ANGLE.sin_cos();

    let left = Point::new(
        end.x + (-nx * cos_a + ny * sin_a) * head_size,
        end.y + (-nx * sin_a - ny * cos_a) * head_size,
    );
    let right = Point::new(
        end.x + (-nx * cos_a - ny * sin_a) * head_size,
        end.y + (nx * sin_a - ny * cos_a) * head_size,
    );
    Some((left, right))
}

fn draw_arrow(cr: &Context, arrow: &ArrowAnnotation) -> Result<(), cairo::Error> {
    let head_size = (arrow.stroke_width * 4.0).max(12.0);
    let Some((left, right)) = arrow_head_points(arrow.start, arrow.end, head_size) else {
        return Ok(());
    };

    set_color(cr, arrow.color);
    cr.set_line_width(arrow.stroke_width);
    cr.set_line_cap(cairo::LineCap::Round);
    cr.move_to(arrow.start.x, arrow.start.y);
    cr.line_to(arrow.end.x, arrow.end.y);
    cr.stroke()?;

    cr.move_to(arrow.end.x, arrow.end.y);
    cr.line_to(left.x, left.y);
    cr.line_to(right.x, right.y);
    cr.close_path();
    cr.fill()
}

fn draw_blur(
    cr: &Context,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    radius: f32,
    source: Option<&RgbaImage>,
) -> Result<(), cairo::Error> {
    let (x, width) = if width < 0.0 { (x + width, -width) } else { (x, width) };
    let (y, height) = if height < 0.0 { (y + height, -height) } else { (y, height) };

    let Some(source) = source else {
        cr.set_source_rgba(0.5, 0.5, 0.5, 0.8);
        cr.rectangle(x, y, width, height);
        return cr.fill();
    };

    let left = x.floor().max(0.0) as u32;
    let top = y.floor().max(0.0) as u32;
    let right = ((x + width).ceil().max(0.0) as u32).min(source.width());
    let bottom = ((y + height).ceil().max(0.0) as u32).min(source.height());
    if right <= left || bottom <= top {
        return Ok(());
    }

    let region = imageops::crop_imm(source, left, top, right - left, bottom - top).to_image();
    let blurred = imageops::blur(&region, radius.max(0.1));
    let surface = image_to_surface(&blurred)?;

    cr.set_source_surface(&surface, left as f64, top as f64)?;
    cr.rectangle(left as f64, top as f64, (right - left) as f64, (bottom - top) as f64);
    cr.fill()
}

/// Copies straight-alpha RGBA into a premultiplied ARGB32 cairo surface.
pub fn image_to_surface(image: &RgbaImage) -> Result<ImageSurface, cairo::Error> {
    let (width, height) = image.dimensions();
    let stride = width as usize * 4;
    let mut data = vec![0u8; stride * height as usize];

    for (src, dst) in image.pixels().zip(data.chunks_exact_mut(4)) {
        let [r, g, b, a] = src.0;
        let premultiply = |c: u8| ((c as u32 * a as u32 + 127) / 255) as u32;
        let argb = (a as u32) << 24 | premultiply(r) << 16 | premultiply(g) << 8 | premultiply(b);
        dst.copy_from_slice(&argb.to_ne_bytes());
    }

    ImageSurface::create_for_data(data, Format::ARgb32, width as i32, height as i32, stride as i32)
}

/// Reads a premultiplied ARGB32 surface back into straight-alpha RGBA.
///
/// The surface must not be referenced by any live cairo context.
pub fn surface_to_image(mut surface: ImageSurface) -> Result<RgbaImage, RenderError> {
    surface.flush();
    let width = surface.width().max(0) as u32;
    let height = surface.height().max(0) as u32;
    let stride = surface.stride().max(0) as usize;
    let data = surface.data()?;

    let mut image = RgbaImage::new(width, height);
    for (y, row) in data.chunks_exact(stride).take(height as usize).enumerate() {
        for (x, px) in row.chunks_exact(4).take(width as usize).enumerate() {
            let argb = u32::from_ne_bytes([px[0], px[1], px[2], px[3]]);
            let a = (argb >> 24) & 0xFF;
            let unpremultiply = |c: u32| {
                if a == 0 {
                    0
                } else {
                    ((c * 255 + a / 2) / a).min(255) as u8
                }
            };
            image.put_pixel(
                x as u32,
                y as u32,
                image::Rgba([
                    unpremultiply((argb >> 16) & 0xFF),
                    unpremultiply((argb >> 8) & 0xFF),
                    unpremultiply(argb & 0xFF),
                    a as u8,
                ]),
            );
        }
    }
    Ok(image)
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("cairo: {0}")]
    Cairo(#[from] cairo::Error),

    #[error("surface still borrowed: {0}")]
    Borrow(#[from] cairo::BorrowError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::MosaicAnnotation;
    use image::Rgba;

    fn render(
        width: u32,
        height: u32,
        annotations: &[Annotation],
        source: Option<&RgbaImage>,
    ) -> RgbaImage {
        let surface = ImageSurface::create(Format::ARgb32, width as i32, height as i32).unwrap();
        {
            let cr = Context::new(&surface).unwrap();
            draw_annotations(&cr, annotations, source).unwrap();
        }
        surface_to_image(surface).unwrap()
    }

    #[test]
    fn test_surface_round_trip_keeps_opaque_pixels() {
        let mut image = RgbaImage::from_pixel(3, 2, Rgba([12, 200, 99, 255]));
        image.put_pixel(2, 1, Rgba([0, 0, 0, 0]));

        let back = surface_to_image(image_to_surface(&image).unwrap()).unwrap();
        assert_eq!(back, image);
    }

    #[test]
    fn test_rect_stroke_is_painted() {
        let rect = Annotation::Rect(ShapeAnnotation {
            x: 5.0,
            y: 5.0,
            width: 10.0,
            height: 10.0,
            color: Color::RED,
            stroke_width: 4.0,
        });
        let image = render(20, 20, &[rect], None);

        assert_eq!(image.get_pixel(5, 5), &Rgba([255, 0, 0, 255]));
        assert_eq!(image.get_pixel(10, 10)[3], 0);
    }

    #[test]
    fn test_mosaic_paints_sampled_blocks() {
        let mut source = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 255, 255]));
        source.put_pixel(2, 2, Rgba([0, 255, 0, 255]));

        let mosaic = Annotation::Mosaic(MosaicAnnotation {
            x: 0.0,
            y: 0.0,
            width: 8.0,
            height: 8.0,
            block_size: 4,
        });
        let image = render(8, 8, &[mosaic], Some(&source));

        assert_eq!(image.get_pixel(0, 0), &Rgba([0, 255, 0, 255]));
        assert_eq!(image.get_pixel(3, 3), &Rgba([0, 255, 0, 255]));
        assert_eq!(image.get_pixel(6, 6), &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_arrow_head_is_symmetric() {
        let (left, right) =
            arrow_head_points(Point::new(0.0, 0.0), Point::new(100.0, 0.0), 10.0).unwrap();
        assert!(left.x < 100.0 && right.x < 100.0);
        assert!((left.y + right.y).abs() < 1e-9);
        assert!(arrow_head_points(Point::new(0.0, 0.0), Point::new(2.0, 2.0), 10.0).is_none());
    }
}
