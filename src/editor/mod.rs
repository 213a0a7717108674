pub mod annotations;
pub mod history;
pub mod render;
pub mod sampling;
pub mod tools;

pub use annotations::{
    Annotation, ArrowAnnotation, BlurAnnotation, BrushAnnotation, Color, MosaicAnnotation,
    ShapeAnnotation, TextAnnotation,
};
pub use history::History;
pub use tools::{Tool, ToolState};

use log::debug;

use crate::geometry::Point;
use crate::selection::Selection;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PendingText {
    pub at: Point,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EditorResponse {
    Ignored,
    Drawing,
    TextRequested(Point),
}

/// Annotation editing inside a committed selection.
///
/// Coordinates are physical pixels of the overlay's frame, same as the
/// selection. Pointer input outside the selection is ignored.
#[derive(Clone, Debug, Default)]
pub struct EditorState {
    pub tool_state: ToolState,
    annotations: Vec<Annotation>,
    current: Option<Annotation>,
    history: History,
    pending_text: Option<PendingText>,
}

impl EditorState {
    pub fn new(tool_state: ToolState, undo_limit: usize) -> Self {
        Self {
            tool_state,
            history: History::with_limit(undo_limit),
            ..Self::default()
        }
    }

    pub fn set_tool(&mut self, tool: Option<Tool>) {
        debug!("Setting tool to {:?}", tool);
        self.tool_state.set_tool(tool);
        self.current = None;
        self.pending_text = None;
    }

    pub fn active_tool(&self) -> Option<Tool> {
        self.tool_state.active_tool
    }

    pub fn set_color(&mut self, color: Color) {
        self.tool_state.color = color;
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// The annotation being dragged out, not yet committed.
    pub fn current(&self) -> Option<&Annotation> {
        self.current.as_ref()
    }

    pub fn pending_text(&self) -> Option<PendingText> {
        self.pending_text
    }

    pub fn is_drawing(&self) -> bool {
        self.tool_state.is_drawing
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn pointer_down(&mut self, point: Point, selection: &Selection) -> EditorResponse {
        let Some(tool) = self.tool_state.active_tool else {
            return EditorResponse::Ignored;
        };
        if !selection.contains(point) {
            return EditorResponse::Ignored;
        }

        if tool == Tool::Text {
            self.pending_text = Some(PendingText { at: point });
            return EditorResponse::TextRequested(point);
        }

        self.tool_state.start_drag(point);
        self.current = Some(self.shape_for(tool, point, point));
        EditorResponse::Drawing
    }

    /// Returns true when the in-progress annotation changed.
    pub fn pointer_move(&mut self, point: Point, selection: &Selection) -> bool {
        let state = &self.tool_state;
        let (Some(tool), Some(start)) = (state.active_tool, state.drag_start) else {
            return false;
        };
        if !self.tool_state.is_drawing {
            return false;
        }

        let point = if tool.clamps_to_selection() {
            selection.clamp_point(point)
        } else {
            point
        };
        self.tool_state.update_drag(point);

        if tool == Tool::Brush {
            if let Some(Annotation::Brush(brush)) = self.current.as_mut() {
                brush.add_point(point);
            }
        } else {
            self.current = Some(self.shape_for(tool, start, point));
        }
        true
    }

    /// Finishes the drag. Returns true when an annotation was committed.
    pub fn pointer_up(&mut self, point: Point, selection: &Selection) -> bool {
        if !self.tool_state.is_drawing {
            return false;
        }
        self.pointer_move(point, selection);
        self.tool_state.reset_drag();

        match self.current.take() {
            Some(annotation) if !annotation.is_degenerate() => {
                debug!("Committing {} annotation", annotation.kind());
                self.push(annotation);
                true
            }
            Some(annotation) => {
                debug!("Dropping degenerate {} annotation", annotation.kind());
                false
            }
            None => false,
        }
    }

    pub fn commit_text(&mut self, text: &str) -> bool {
        let Some(pending) = self.pending_text.take() else {
            return false;
        };
        if text.trim().is_empty() {
            return false;
        }

        debug!("Committing text: {}", text);
        self.push(Annotation::Text(TextAnnotation {
            x: pending.at.x,
            y: pending.at.y,
            text: text.to_string(),
            color: self.tool_state.color,
            font_size: self.tool_state.font_size,
        }));
        true
    }

    pub fn cancel_text(&mut self) -> bool {
        self.pending_text.take().is_some()
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo(&self.annotations) {
            Some(previous) => {
                self.annotations = previous;
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo(&self.annotations) {
            Some(next) => {
                self.annotations = next;
                true
            }
            None => false,
        }
    }

    /// Removes every annotation. Undo steps back to the list as it was
    /// before the last annotation.
    pub fn clear(&mut self) -> bool {
        if self.annotations.is_empty() {
            return false;
        }
        self.history.record_clear(&self.annotations);
        self.annotations.clear();
        true
    }

    /// Drops annotations and history, used when a new selection starts.
    pub fn reset(&mut self) {
        self.annotations.clear();
        self.current = None;
        self.pending_text = None;
        self.history.reset();
        self.tool_state.reset_drag();
    }

    fn push(&mut self, annotation: Annotation) {
        self.history.record(&self.annotations);
        self.annotations.push(annotation);
    }

    fn shape_for(&self, tool: Tool, start: Point, end: Point) -> Annotation {
        let state = &self.tool_state;
        let corners = ShapeAnnotation::from_corners(start, end, state.color, state.stroke_width);

        match tool {
            Tool::Rectangle => Annotation::Rect(corners),
            Tool::Ellipse => Annotation::Ellipse(corners),
            Tool::Arrow => Annotation::Arrow(ArrowAnnotation {
                start,
                end,
                color: state.color,
                stroke_width: state.stroke_width,
            }),
            Tool::Brush => Annotation::Brush(BrushAnnotation {
                points: vec![start],
                color: state.color,
                stroke_width: state.stroke_width,
            }),
            Tool::Mosaic => Annotation::Mosaic(MosaicAnnotation {
                x: corners.x,
                y: corners.y,
                width: corners.width,
                height: corners.height,
                block_size: state.mosaic_block_size,
            }),
            Tool::Blur => Annotation::Blur(BlurAnnotation {
                x: corners.x,
                y: corners.y,
                width: corners.width,
                height: corners.height,
                radius: state.blur_radius,
            }),
            Tool::Text => Annotation::Text(TextAnnotation {
                x: start.x,
                y: start.y,
                text: String::new(),
                color: state.color,
                font_size: state.font_size,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selection() -> Selection {
        Selection::new(100.0, 100.0, 200.0, 200.0)
    }

    fn draw(editor: &mut EditorState, tool: Tool, from: (f64, f64), to: (f64, f64)) -> bool {
        let sel = selection();
        editor.set_tool(Some(tool));
        editor.pointer_down(Point::new(from.0, from.1), &sel);
        editor.pointer_move(Point::new(to.0, to.1), &sel);
        editor.pointer_up(Point::new(to.0, to.1), &sel)
    }

    #[test]
    fn test_input_without_tool_or_outside_selection_is_ignored() {
        let mut editor = EditorState::default();
        let sel = selection();
        assert_eq!(editor.pointer_down(Point::new(150.0, 150.0), &sel), EditorResponse::Ignored);

        editor.set_tool(Some(Tool::Rectangle));
        assert_eq!(editor.pointer_down(Point::new(10.0, 10.0), &sel), EditorResponse::Ignored);
        assert!(!editor.is_drawing());
    }

    #[test]
    fn test_brush_points_clamped_to_selection() {
        let mut editor = EditorState::default();
        assert!(draw(&mut editor, Tool::Brush, (150.0, 150.0), (500.0, 120.0)));

        let Annotation::Brush(brush) = &editor.annotations()[0] else {
            panic!("expected a brush stroke");
        };
        assert_eq!(brush.points.last(), Some(&Point::new(300.0, 120.0)));
    }

    #[test]
    fn test_arrow_not_clamped() {
        let mut editor = EditorState::default();
        assert!(draw(&mut editor, Tool::Arrow, (150.0, 150.0), (500.0, 150.0)));
        let Annotation::Arrow(arrow) = &editor.annotations()[0] else {
            panic!("expected an arrow");
        };
        assert_eq!(arrow.end, Point::new(500.0, 150.0));
    }

    #[test]
    fn test_degenerate_drag_not_committed() {
        let mut editor = EditorState::default();
        assert!(!draw(&mut editor, Tool::Rectangle, (150.0, 150.0), (151.0, 150.5)));
        assert!(!draw(&mut editor, Tool::Arrow, (150.0, 150.0), (152.0, 152.0)));
        assert!(editor.annotations().is_empty());
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_text_tool_requests_text() {
        let mut editor = EditorState::default();
        editor.set_tool(Some(Tool::Text));
        let at = Point::new(120.0, 130.0);
        assert_eq!(editor.pointer_down(at, &selection()), EditorResponse::TextRequested(at));

        assert!(!editor.commit_text("   "));
        editor.pointer_down(at, &selection());
        assert!(editor.commit_text("hello"));
        assert_eq!(editor.annotations()[0].kind(), "text");
    }

    #[test]
    fn test_undo_redo_annotations() {
        let mut editor = EditorState::default();
        draw(&mut editor, Tool::Rectangle, (110.0, 110.0), (150.0, 150.0));
        draw(&mut editor, Tool::Ellipse, (160.0, 160.0), (200.0, 200.0));

        assert!(editor.undo());
        assert_eq!(editor.annotations().len(), 1);
        assert_eq!(editor.annotations()[0].kind(), "rect");

        assert!(editor.redo());
        assert_eq!(editor.annotations().len(), 2);
    }

    #[test]
    fn test_undo_after_clear_restores_one_rect() {
        let mut editor = EditorState::default();
        draw(&mut editor, Tool::Rectangle, (110.0, 110.0), (150.0, 150.0));
        draw(&mut editor, Tool::Rectangle, (160.0, 160.0), (200.0, 200.0));

        assert!(editor.clear());
        assert!(editor.annotations().is_empty());

        assert!(editor.undo());
        assert_eq!(editor.annotations().len(), 1);
        assert_eq!(editor.annotations()[0].kind(), "rect");

        assert!(editor.redo());
        assert!(editor.annotations().is_empty());

        assert!(editor.undo());
        draw(&mut editor, Tool::Ellipse, (160.0, 160.0), (200.0, 200.0));
        assert!(!editor.can_redo());
        assert_eq!(editor.annotations().len(), 2);
    }

    #[test]
    fn test_new_annotation_after_undo_clears_redo() {
        let mut editor = EditorState::default();
        draw(&mut editor, Tool::Rectangle, (110.0, 110.0), (150.0, 150.0));
        editor.undo();
        assert!(editor.can_redo());

        draw(&mut editor, Tool::Mosaic, (110.0, 110.0), (150.0, 150.0));
        assert!(!editor.can_redo());
        assert!(!editor.redo());
    }

    #[test]
    fn test_undo_limit_from_settings() {
        let mut editor = EditorState::new(ToolState::default(), 1);
        draw(&mut editor, Tool::Rectangle, (110.0, 110.0), (150.0, 150.0));
        draw(&mut editor, Tool::Ellipse, (160.0, 160.0), (200.0, 200.0));

        assert!(editor.undo());
        assert_eq!(editor.annotations().len(), 1);
        assert!(!editor.undo());
    }

    #[test]
    fn test_reset_drops_history() {
        let mut editor = EditorState::default();
        draw(&mut editor, Tool::Blur, (110.0, 110.0), (150.0, 150.0));
        editor.reset();
        assert!(editor.annotations().is_empty());
        assert!(!editor.can_undo());
    }
}
