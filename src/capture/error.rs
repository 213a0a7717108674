use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no displays are connected")]
    NoDisplay,

    #[error("failed to enumerate displays: {0}")]
    Enumeration(String),

    #[error("capture of display {index} failed: {reason}")]
    CaptureFailed { index: usize, reason: String },

    #[error("every display capture failed")]
    NoCaptures,

    #[error("failed to encode frame: {0}")]
    Encode(#[from] image::ImageError),
}
