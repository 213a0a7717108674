use crate::capture::DisplayInfo;
use crate::geometry;

/// Tracks which display the pointer is on and reports only changes.
#[derive(Clone, Debug)]
pub struct FocusFollower {
    displays: Vec<DisplayInfo>,
    focused: Option<usize>,
}

impl FocusFollower {
    pub fn new(displays: Vec<DisplayInfo>, focused: Option<usize>) -> Self {
        Self { displays, focused }
    }

    pub fn focused(&self) -> Option<usize> {
        self.focused
    }

    pub fn set_focused(&mut self, index: usize) {
        self.focused = Some(index);
    }

    /// Feeds a pointer position in global logical coordinates. Returns the
    /// display to focus when the pointer moved onto a different display.
    pub fn observe(&mut self, x: f64, y: f64) -> Option<usize> {
        let hit = geometry::display_at_logical(&self.displays, x, y)?;
        if self.focused == Some(hit) {
            return None;
        }
        self.focused = Some(hit);
        Some(hit)
    }

    /// Global logical position of a point local to a display's overlay.
    pub fn to_global(&self, display_index: usize, x: f64, y: f64) -> Option<(f64, f64)> {
        self.displays
            .iter()
            .find(|d| d.index == display_index)
            .map(|d| (d.logical_x as f64 + x, d.logical_y as f64 + y))
    }
}
