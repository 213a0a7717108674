//! Renders a selection plus its annotations into a standalone image and
//! hands it to a sink: clipboard, file or pinned window.

pub mod pin;
pub mod sinks;

pub use pin::{PinGeometry, PinPlacement, PinnedImage};
pub use sinks::{ClipboardSink, FileSaveDialog, PinnedWindowHost};

use gtk4::cairo::{self, Context, Format, ImageSurface};
use image::{imageops, ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use thiserror::Error;

use crate::editor::render::{self, RenderError};
use crate::editor::Annotation;
use crate::selection::Selection;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputTarget {
    #[default]
    Clipboard,
    File,
    Pin,
}

impl OutputTarget {
    pub const ALL: [OutputTarget; 3] = [
        OutputTarget::Clipboard,
        OutputTarget::File,
        OutputTarget::Pin,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            OutputTarget::Clipboard => "Copy to Clipboard",
            OutputTarget::File => "Save to File",
            OutputTarget::Pin => "Pin to Screen",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|target| target.to_string() == name)
    }
}

impl std::fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputTarget::Clipboard => write!(f, "clipboard"),
            OutputTarget::File => write!(f, "file"),
            OutputTarget::Pin => write!(f, "pin"),
        }
    }
}

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("selection is empty")]
    EmptySelection,

    #[error("no frame to render from")]
    NoFrame,

    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("invalid base64 image data: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("clipboard error: {0}")]
    Clipboard(String),

    #[error("file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("save dialog failed: {0}")]
    Dialog(String),

    #[error("pinned window failed: {0}")]
    Pin(String),
}

impl From<cairo::Error> for OutputError {
    fn from(e: cairo::Error) -> Self {
        OutputError::Render(RenderError::Cairo(e))
    }
}

/// Composes the selected sub-rectangle of `frame` with the annotations drawn
/// on top. The result is exactly the selection's size; annotations keep
/// their frame coordinates and are shifted by the selection origin.
pub fn render_selection(
    frame: &RgbaImage,
    selection: &Selection,
    annotations: &[Annotation],
) -> Result<RgbaImage, OutputError> {
    let (sx, sy, width, height) = selection.pixel_rect();
    if width == 0 || height == 0 {
        return Err(OutputError::EmptySelection);
    }

    let surface = ImageSurface::create(Format::ARgb32, width as i32, height as i32)?;
    {
        let cr = Context::new(&surface)?;

        let left = sx.clamp(0, frame.width() as i64);
        let top = sy.clamp(0, frame.height() as i64);
        let right = (sx + width as i64).clamp(0, frame.width() as i64);
        let bottom = (sy + height as i64).clamp(0, frame.height() as i64);
        if right > left && bottom > top {
            let region = imageops::crop_imm(
                frame,
                left as u32,
                top as u32,
                (right - left) as u32,
                (bottom - top) as u32,
            )
            .to_image();
            let source = render::image_to_surface(&region)?;
            cr.set_source_surface(&source, (left - sx) as f64, (top - sy) as f64)?;
            cr.paint()?;
        }

        cr.translate(-sx as f64, -sy as f64);
        render::draw_annotations(&cr, annotations, Some(frame))?;
    }

    Ok(render::surface_to_image(surface)?)
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, OutputError> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

pub fn decode_png(bytes: &[u8]) -> Result<RgbaImage, OutputError> {
    Ok(image::load_from_memory_with_format(bytes, ImageFormat::Png)?.to_rgba8())
}

pub fn render_png(
    frame: &RgbaImage,
    selection: &Selection,
    annotations: &[Annotation],
) -> Result<Vec<u8>, OutputError> {
    encode_png(&render_selection(frame, selection, annotations)?)
}
