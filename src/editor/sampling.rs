//! Pixel sampling from the frozen frame.

use image::RgbaImage;
use log::trace;
use thiserror::Error;

use super::Color;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SampleError {
    #[error("pixel ({x}, {y}) is outside the {width}x{height} frame")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    },
}

pub fn sample_pixel(image: &RgbaImage, x: i64, y: i64) -> Result<Color, SampleError> {
    let (width, height) = image.dimensions();
    if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
        return Err(SampleError::OutOfBounds {
            x,
            y,
            width,
            height,
        });
    }

    let [r, g, b, a] = image.get_pixel(x as u32, y as u32).0;
    Ok(Color::rgba(r, g, b, a))
}

/// Alternating light and dark gray by block position.
pub fn checkerboard_gray(col: u32, row: u32) -> Color {
    if (col + row) % 2 == 0 {
        Color::rgb(0xC0, 0xC0, 0xC0)
    } else {
        Color::rgb(0x80, 0x80, 0x80)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MosaicBlock {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: Color,
}

/// Splits a region into `block_size` squares, each colored by the frame pixel
/// under its center. Blocks whose center cannot be sampled get a checkerboard
/// gray so the region stays obscured.
pub fn mosaic_blocks(
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    block_size: u32,
    source: Option<&RgbaImage>,
) -> Vec<MosaicBlock> {
    let (x, width) = if width < 0.0 { (x + width, -width) } else { (x, width) };
    let (y, height) = if height < 0.0 { (y + height, -height) } else { (y, height) };
    let block = block_size.max(1) as f64;

    let cols = (width / block).ceil() as u32;
    let rows = (height / block).ceil() as u32;
    let mut blocks = Vec::with_capacity((cols * rows) as usize);

    for row in 0..rows {
        for col in 0..cols {
            let bx = x + col as f64 * block;
            let by = y + row as f64 * block;
            let bw = block.min(x + width - bx);
            let bh = block.min(y + height - by);

            let cx = (bx + bw / 2.0).floor() as i64;
            let cy = (by + bh / 2.0).floor() as i64;
            let color = match source.map(|image| sample_pixel(image, cx, cy)) {
                Some(Ok(color)) => color,
                Some(Err(e)) => {
                    trace!("Mosaic block falls back to checkerboard: {}", e);
                    checkerboard_gray(col, row)
                }
                None => checkerboard_gray(col, row),
            };

            blocks.push(MosaicBlock {
                x: bx,
                y: by,
                width: bw,
                height: bh,
                color,
            });
        }
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_sample_pixel_bounds() {
        let image = RgbaImage::from_pixel(4, 4, Rgba([9, 8, 7, 255]));
        assert_eq!(sample_pixel(&image, 3, 3), Ok(Color::rgb(9, 8, 7)));
        assert!(matches!(
            sample_pixel(&image, 4, 0),
            Err(SampleError::OutOfBounds { width: 4, .. })
        ));
        assert!(sample_pixel(&image, -1, 0).is_err());
    }

    #[test]
    fn test_mosaic_samples_block_centers() {
        let mut image = RgbaImage::new(24, 24);
        image.put_pixel(6, 6, Rgba([10, 0, 0, 255]));
        image.put_pixel(18, 6, Rgba([20, 0, 0, 255]));
        image.put_pixel(6, 18, Rgba([30, 0, 0, 255]));
        image.put_pixel(18, 18, Rgba([40, 0, 0, 255]));

        let blocks = mosaic_blocks(0.0, 0.0, 24.0, 24.0, 12, Some(&image));
        let reds: Vec<u8> = blocks.iter().map(|b| b.color.r).collect();
        assert_eq!(reds, vec![10, 20, 30, 40]);
        assert_eq!((blocks[3].x, blocks[3].y), (12.0, 12.0));
    }

    #[test]
    fn test_mosaic_partial_edge_blocks() {
        let image = RgbaImage::from_pixel(30, 30, Rgba([1, 1, 1, 255]));
        let blocks = mosaic_blocks(0.0, 0.0, 20.0, 12.0, 12, Some(&image));
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].width, 8.0);
    }

    #[test]
    fn test_mosaic_falls_back_to_checkerboard() {
        let image = RgbaImage::from_pixel(4, 4, Rgba([1, 1, 1, 255]));
        let blocks = mosaic_blocks(100.0, 100.0, 24.0, 12.0, 12, Some(&image));
        assert_eq!(blocks[0].color, Color::rgb(0xC0, 0xC0, 0xC0));
        assert_eq!(blocks[1].color, Color::rgb(0x80, 0x80, 0x80));

        let unsourced = mosaic_blocks(0.0, 0.0, 12.0, 12.0, 12, None);
        assert_eq!(unsourced[0].color, checkerboard_gray(0, 0));
    }
}
