//! Display enumeration and frame capture.
//!
//! Displays are listed through a [`DisplaySource`], then every display is
//! captured on its own thread by a [`FrameGrabber`] chosen once per process
//! from the desktop session.

pub mod backends;
pub mod desktop;
pub mod display;
mod error;
pub mod frame;

pub use backends::grabber_for_session;
pub use desktop::DesktopSession;
pub use display::{list_displays, DisplayInfo, DisplaySource, XcapDisplays};
pub use error::CaptureError;
pub use frame::{capture_all, CaptureResult, FrameGrabber};
