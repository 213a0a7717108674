//! Display enumeration.

use log::{debug, warn};
use serde::Serialize;
use xcap::Monitor;

use super::CaptureError;

/// One physical output as seen by the OS, in logical units.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayInfo {
    pub index: usize,
    pub logical_x: i32,
    pub logical_y: i32,
    pub logical_width: u32,
    pub logical_height: u32,
    pub scale_factor: f64,
    pub is_primary: bool,
    pub name: String,
}

impl DisplayInfo {
    pub fn physical_width(&self) -> u32 {
        (self.logical_width as f64 * self.scale_factor).round() as u32
    }

    pub fn physical_height(&self) -> u32 {
        (self.logical_height as f64 * self.scale_factor).round() as u32
    }

    pub fn contains_logical(&self, x: f64, y: f64) -> bool {
        let left = self.logical_x as f64;
        let top = self.logical_y as f64;
        x >= left
            && x < left + self.logical_width as f64
            && y >= top
            && y < top + self.logical_height as f64
    }
}

pub trait DisplaySource {
    fn displays(&self) -> Result<Vec<DisplayInfo>, CaptureError>;
}

/// Enumerates monitors through xcap.
pub struct XcapDisplays;

impl DisplaySource for XcapDisplays {
    fn displays(&self) -> Result<Vec<DisplayInfo>, CaptureError> {
        let monitors = Monitor::all().map_err(|e| CaptureError::Enumeration(e.to_string()))?;

        let mut displays = Vec::with_capacity(monitors.len());
        for (index, monitor) in monitors.iter().enumerate() {
            match display_from_monitor(index, monitor) {
                Ok(info) => displays.push(info),
                Err(e) => warn!("Skipping monitor {}: {}", index, e),
            }
        }
        Ok(displays)
    }
}

fn display_from_monitor(index: usize, monitor: &Monitor) -> Result<DisplayInfo, xcap::XCapError> {
    Ok(DisplayInfo {
        index,
        logical_x: monitor.x()?,
        logical_y: monitor.y()?,
        logical_width: monitor.width()?,
        logical_height: monitor.height()?,
        scale_factor: monitor.scale_factor()? as f64,
        is_primary: monitor.is_primary()?,
        name: monitor.name()?,
    })
}

/// Lists the connected displays. An empty list is an error, never a session.
pub fn list_displays(source: &dyn DisplaySource) -> Result<Vec<DisplayInfo>, CaptureError> {
    let displays = source.displays()?;
    if displays.is_empty() {
        return Err(CaptureError::NoDisplay);
    }

    for display in &displays {
        debug!(
            "Display {} '{}': {}x{} at ({}, {}) scale {}{}",
            display.index,
            display.name,
            display.logical_width,
            display.logical_height,
            display.logical_x,
            display.logical_y,
            display.scale_factor,
            if display.is_primary { " (primary)" } else { "" }
        );
    }
    Ok(displays)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoMonitors;

    impl DisplaySource for NoMonitors {
        fn displays(&self) -> Result<Vec<DisplayInfo>, CaptureError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_zero_displays_is_an_error() {
        let err = list_displays(&NoMonitors).unwrap_err();
        assert!(matches!(err, CaptureError::NoDisplay));
    }

    #[test]
    fn test_physical_size_and_hit_testing() {
        let display = DisplayInfo {
            index: 1,
            logical_x: 1920,
            logical_y: 0,
            logical_width: 1920,
            logical_height: 1080,
            scale_factor: 2.0,
            is_primary: false,
            name: "HDMI-1".to_string(),
        };
        assert_eq!(display.physical_width(), 3840);
        assert_eq!(display.physical_height(), 2160);
        assert!(display.contains_logical(1920.0, 0.0));
        assert!(!display.contains_logical(3840.0, 0.0));
    }

    #[test]
    fn test_serializes_camel_case() {
        let display = DisplayInfo {
            index: 0,
            logical_x: 0,
            logical_y: 0,
            logical_width: 800,
            logical_height: 600,
            scale_factor: 1.0,
            is_primary: true,
            name: "eDP-1".to_string(),
        };
        let value = serde_json::to_value(&display).unwrap();
        assert_eq!(value["logicalWidth"], 800);
        assert_eq!(value["isPrimary"], true);
        assert_eq!(value["scaleFactor"], 1.0);
    }
}
