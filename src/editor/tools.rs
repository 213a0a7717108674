use serde::{Deserialize, Serialize};

use super::Color;
use crate::geometry::Point;

/// The active annotation tool
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Rectangle,
    Ellipse,
    Arrow,
    Brush,
    Text,
    Mosaic,
    Blur,
}

impl Tool {
    /// Get the icon name for this tool
    pub fn icon_name(&self) -> &'static str {
        match self {
            Tool::Rectangle => "media-playback-stop-symbolic",
            Tool::Ellipse => "media-record-symbolic",
            Tool::Arrow => "go-next-symbolic",
            Tool::Brush => "document-edit-symbolic",
            Tool::Text => "insert-text-symbolic",
            Tool::Mosaic => "view-grid-symbolic",
            Tool::Blur => "weather-fog-symbolic",
        }
    }

    /// Get the tooltip text for this tool
    pub fn tooltip(&self) -> &'static str {
        match self {
            Tool::Rectangle => "Rectangle",
            Tool::Ellipse => "Ellipse",
            Tool::Arrow => "Arrow",
            Tool::Brush => "Brush",
            Tool::Text => "Add Text",
            Tool::Mosaic => "Mosaic",
            Tool::Blur => "Blur",
        }
    }

    pub fn all() -> &'static [Tool] {
        &[
            Tool::Rectangle,
            Tool::Ellipse,
            Tool::Arrow,
            Tool::Brush,
            Tool::Text,
            Tool::Mosaic,
            Tool::Blur,
        ]
    }

    /// Pointer positions for these tools are pinned to the selection while dragging.
    pub fn clamps_to_selection(&self) -> bool {
        matches!(self, Tool::Brush | Tool::Mosaic | Tool::Blur)
    }
}

/// State for the editor tools
#[derive(Clone, Debug)]
pub struct ToolState {
    pub active_tool: Option<Tool>,
    pub color: Color,
    pub stroke_width: f64,
    pub font_size: f64,
    pub mosaic_block_size: u32,
    pub blur_radius: f32,
    /// Whether the user is currently dragging out an annotation
    pub is_drawing: bool,
    pub drag_start: Option<Point>,
    pub drag_current: Option<Point>,
}

impl Default for ToolState {
    fn default() -> Self {
        Self {
            active_tool: None,
            color: Color::RED,
            stroke_width: 3.0,
            font_size: 24.0,
            mosaic_block_size: 12,
            blur_radius: 8.0,
            is_drawing: false,
            drag_start: None,
            drag_current: None,
        }
    }
}

impl ToolState {
    pub fn set_tool(&mut self, tool: Option<Tool>) {
        self.active_tool = tool;
        self.reset_drag();
    }

    pub fn start_drag(&mut self, point: Point) {
        self.is_drawing = true;
        self.drag_start = Some(point);
        self.drag_current = Some(point);
    }

    pub fn update_drag(&mut self, point: Point) {
        if self.is_drawing {
            self.drag_current = Some(point);
        }
    }

    pub fn reset_drag(&mut self) {
        self.is_drawing = false;
        self.drag_start = None;
        self.drag_current = None;
    }
}
