//! Per-display overlay logic, independent of any window toolkit.
//!
//! The controller owns the frozen frame, the selection and the annotation
//! editor for one display. Pointer positions are physical pixels of that
//! display. It answers each input with an [`OverlayCommand`] that the
//! window layer carries out.

use log::debug;
use std::sync::Arc;

use super::{SessionEvent, SessionId};
use crate::app::{Action, Settings};
use crate::capture::{CaptureResult, DisplayInfo};
use crate::editor::{EditorResponse, EditorState};
use crate::geometry::{self, Point};
use crate::output::{self, OutputError, OutputTarget, PinPlacement};
use crate::selection::{Selection, SelectionEvent, SelectionMachine};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OverlayCommand {
    Nothing,
    Redraw,
    /// A fresh selection began here; every other overlay must drop theirs.
    SelectionStarted,
    Commit(OutputTarget),
    CancelSession,
    /// Ask the user for text to place at this physical point.
    RequestText(Point),
}

pub struct OverlayController {
    display: DisplayInfo,
    session_id: Option<SessionId>,
    frame: Option<Arc<CaptureResult>>,
    selection: SelectionMachine,
    editor: EditorState,
    settings: Settings,
}

impl OverlayController {
    pub fn new(display: DisplayInfo, settings: &Settings) -> Self {
        Self {
            display,
            session_id: None,
            frame: None,
            selection: SelectionMachine::new(settings.min_selection_size, settings.handle_radius),
            editor: EditorState::new(settings.tool_state(), settings.undo_limit),
            settings: settings.clone(),
        }
    }

    pub fn display(&self) -> &DisplayInfo {
        &self.display
    }

    pub fn display_index(&self) -> usize {
        self.display.index
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn frame(&self) -> Option<&Arc<CaptureResult>> {
        self.frame.as_ref()
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection.selection()
    }

    pub fn selection_machine(&self) -> &SelectionMachine {
        &self.selection
    }

    /// The selection once released, which is what tools and output act on.
    pub fn committed_selection(&self) -> Option<Selection> {
        self.selection.committed()
    }

    pub fn editor(&self) -> &EditorState {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut EditorState {
        &mut self.editor
    }

    /// Toolbars are offered only over a settled selection.
    pub fn wants_toolbar(&self) -> bool {
        self.committed_selection().is_some() && !self.editor.is_drawing()
    }

    /// Applies a broadcast event. Returns true when the overlay must redraw.
    pub fn handle_event(&mut self, event: &SessionEvent) -> bool {
        match event {
            SessionEvent::SessionStart { session_id } => {
                self.session_id = Some(session_id.clone());
                self.clear_selection();
                true
            }
            SessionEvent::DisplaysInfo { displays } => {
                if let Some(info) = displays.iter().find(|d| d.index == self.display.index) {
                    self.display = info.clone();
                }
                false
            }
            SessionEvent::ImageData {
                display_index,
                session_id,
                frame,
            } => {
                if *display_index != self.display.index {
                    return false;
                }
                self.session_id = Some(session_id.clone());
                self.selection
                    .set_bounds(frame.width as f64, frame.height as f64);
                self.frame = Some(Arc::clone(frame));
                true
            }
            SessionEvent::SelectionStarted {
                source_display_index,
            } => {
                if *source_display_index == self.display.index {
                    return false;
                }
                let had_selection = self.selection.selection().is_some();
                self.clear_selection();
                had_selection
            }
            SessionEvent::SessionEnd => {
                self.clear_selection();
                self.frame = None;
                self.session_id = None;
                true
            }
            SessionEvent::Error { .. } => false,
        }
    }

    pub fn pointer_down(&mut self, point: Point) -> OverlayCommand {
        if self.frame.is_none() {
            return OverlayCommand::Nothing;
        }

        if let (Some(_), Some(sel)) = (self.editor.active_tool(), self.committed_selection()) {
            if sel.contains(point) {
                return match self.editor.pointer_down(point, &sel) {
                    EditorResponse::TextRequested(at) => OverlayCommand::RequestText(at),
                    EditorResponse::Drawing => OverlayCommand::Redraw,
                    EditorResponse::Ignored => OverlayCommand::Nothing,
                };
            }
        }

        match self.selection.pointer_down(point) {
            SelectionEvent::Started => {
                self.editor.reset();
                self.editor.set_tool(None);
                OverlayCommand::SelectionStarted
            }
            SelectionEvent::Ignored => OverlayCommand::Nothing,
            _ => OverlayCommand::Redraw,
        }
    }

    pub fn pointer_move(&mut self, point: Point) -> OverlayCommand {
        if self.editor.is_drawing() {
            let Some(sel) = self.committed_selection() else {
                return OverlayCommand::Nothing;
            };
            return redraw_if(self.editor.pointer_move(point, &sel));
        }
        redraw_if(self.selection.pointer_move(point))
    }

    pub fn pointer_up(&mut self, point: Point) -> OverlayCommand {
        if self.editor.is_drawing() {
            if let Some(sel) = self.committed_selection() {
                self.editor.pointer_up(point, &sel);
            }
            return OverlayCommand::Redraw;
        }

        match self.selection.pointer_up(point) {
            SelectionEvent::Ignored => OverlayCommand::Nothing,
            SelectionEvent::Discarded => {
                self.editor.reset();
                OverlayCommand::Redraw
            }
            event => {
                debug!("Display {} selection: {:?}", self.display.index, event);
                OverlayCommand::Redraw
            }
        }
    }

    /// Double-click inside a settled selection commits with the default target.
    pub fn double_click(&mut self, point: Point) -> OverlayCommand {
        match self.committed_selection() {
            Some(sel) if sel.contains(point) && !self.editor.is_drawing() => {
                OverlayCommand::Commit(self.settings.default_output)
            }
            _ => OverlayCommand::Nothing,
        }
    }

    pub fn perform(&mut self, action: Action) -> OverlayCommand {
        let has_selection = self.committed_selection().is_some();

        match action {
            Action::Cancel => {
                if self.editor.cancel_text() {
                    OverlayCommand::Redraw
                } else if self.editor.active_tool().is_some() {
                    self.editor.set_tool(None);
                    OverlayCommand::Redraw
                } else {
                    OverlayCommand::CancelSession
                }
            }
            Action::Confirm if has_selection => {
                OverlayCommand::Commit(self.settings.default_output)
            }
            Action::Copy if has_selection => OverlayCommand::Commit(OutputTarget::Clipboard),
            Action::Save if has_selection => OverlayCommand::Commit(OutputTarget::File),
            Action::Pin if has_selection => OverlayCommand::Commit(OutputTarget::Pin),
            Action::Undo => redraw_if(self.editor.undo()),
            Action::Redo => redraw_if(self.editor.redo()),
            Action::ClearAnnotations => redraw_if(self.editor.clear()),
            Action::Tool(tool) if has_selection => {
                let next = if self.editor.active_tool() == Some(tool) {
                    None
                } else {
                    Some(tool)
                };
                self.editor.set_tool(next);
                OverlayCommand::Redraw
            }
            _ => OverlayCommand::Nothing,
        }
    }

    pub fn commit_text(&mut self, text: &str) -> OverlayCommand {
        redraw_if(self.editor.commit_text(text))
    }

    pub fn cancel_text(&mut self) -> OverlayCommand {
        redraw_if(self.editor.cancel_text())
    }

    /// Encodes the selection with its annotations as PNG.
    pub fn render_output(&self) -> Result<Vec<u8>, OutputError> {
        let frame = self.frame.as_ref().ok_or(OutputError::NoFrame)?;
        let sel = self
            .committed_selection()
            .ok_or(OutputError::EmptySelection)?;
        output::render_png(&frame.image, &sel, self.editor.annotations())
    }

    /// The selection's rectangle in global logical coordinates.
    pub fn pin_placement(&self) -> Option<PinPlacement> {
        let sel = self.committed_selection()?;
        let scale = self.display.scale_factor;
        let origin = geometry::physical_to_window(Point::new(sel.x, sel.y), scale);
        let size = geometry::physical_to_window(Point::new(sel.width, sel.height), scale);

        Some(PinPlacement {
            x: self.display.logical_x + origin.x.round() as i32,
            y: self.display.logical_y + origin.y.round() as i32,
            width: size.x.round().max(1.0) as u32,
            height: size.y.round().max(1.0) as u32,
        })
    }

    fn clear_selection(&mut self) {
        self.selection.clear();
        self.editor.reset();
        self.editor.set_tool(None);
    }
}

fn redraw_if(changed: bool) -> OverlayCommand {
    if changed {
        OverlayCommand::Redraw
    } else {
        OverlayCommand::Nothing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::Tool;
    use image::{Rgba, RgbaImage};

    fn display(index: usize, scale: f64) -> DisplayInfo {
        DisplayInfo {
            index,
            logical_x: 1000 * index as i32,
            logical_y: 0,
            logical_width: 200,
            logical_height: 100,
            scale_factor: scale,
            is_primary: index == 0,
            name: format!("DP-{}", index),
        }
    }

    fn ready_controller(index: usize, scale: f64) -> OverlayController {
        let info = display(index, scale);
        let mut controller = OverlayController::new(info.clone(), &Settings::default());
        let image = RgbaImage::from_pixel(
            info.physical_width(),
            info.physical_height(),
            Rgba([0, 0, 255, 255]),
        );
        controller.handle_event(&SessionEvent::ImageData {
            display_index: index,
            session_id: SessionId::generate(),
            frame: Arc::new(CaptureResult::from_image(index, image).unwrap()),
        });
        controller
    }

    fn select(
        controller: &mut OverlayController,
        from: (f64, f64),
        to: (f64, f64),
    ) -> OverlayCommand {
        let started = controller.pointer_down(Point::new(from.0, from.1));
        controller.pointer_move(Point::new(to.0, to.1));
        controller.pointer_up(Point::new(to.0, to.1));
        started
    }

    #[test]
    fn test_input_ignored_until_frame_arrives() {
        let mut controller = OverlayController::new(display(0, 1.0), &Settings::default());
        assert_eq!(controller.pointer_down(Point::new(5.0, 5.0)), OverlayCommand::Nothing);
    }

    #[test]
    fn test_new_selection_announces_itself() {
        let mut controller = ready_controller(0, 1.0);
        assert_eq!(
            select(&mut controller, (10.0, 10.0), (60.0, 50.0)),
            OverlayCommand::SelectionStarted
        );
        assert_eq!(
            controller.committed_selection(),
            Some(Selection::new(10.0, 10.0, 50.0, 40.0))
        );
    }

    #[test]
    fn test_selection_elsewhere_clears_this_one() {
        let mut controller = ready_controller(0, 1.0);
        select(&mut controller, (10.0, 10.0), (60.0, 50.0));

        let own = SessionEvent::SelectionStarted {
            source_display_index: 0,
        };
        assert!(!controller.handle_event(&own));
        assert!(controller.selection().is_some());

        let other = SessionEvent::SelectionStarted {
            source_display_index: 1,
        };
        assert!(controller.handle_event(&other));
        assert!(controller.selection().is_none());
        // Idempotent.
        assert!(!controller.handle_event(&other));
    }

    #[test]
    fn test_escape_clears_tool_before_cancelling() {
        let mut controller = ready_controller(0, 1.0);
        select(&mut controller, (10.0, 10.0), (60.0, 50.0));
        controller.perform(Action::Tool(Tool::Arrow));

        assert_eq!(controller.perform(Action::Cancel), OverlayCommand::Redraw);
        assert_eq!(controller.editor().active_tool(), None);
        assert_eq!(controller.perform(Action::Cancel), OverlayCommand::CancelSession);
    }

    #[test]
    fn test_commit_requires_selection() {
        let mut controller = ready_controller(0, 1.0);
        assert_eq!(controller.perform(Action::Confirm), OverlayCommand::Nothing);
        assert_eq!(controller.perform(Action::Copy), OverlayCommand::Nothing);

        select(&mut controller, (10.0, 10.0), (60.0, 50.0));
        assert_eq!(
            controller.perform(Action::Confirm),
            OverlayCommand::Commit(OutputTarget::Clipboard)
        );
        assert_eq!(
            controller.perform(Action::Pin),
            OverlayCommand::Commit(OutputTarget::Pin)
        );
        assert_eq!(
            controller.double_click(Point::new(20.0, 20.0)),
            OverlayCommand::Commit(OutputTarget::Clipboard)
        );
        assert_eq!(controller.double_click(Point::new(150.0, 90.0)), OverlayCommand::Nothing);
    }

    #[test]
    fn test_collapsed_resize_cannot_be_committed() {
        let mut controller = ready_controller(0, 1.0);
        select(&mut controller, (10.0, 10.0), (60.0, 50.0));

        assert_eq!(controller.pointer_down(Point::new(60.0, 30.0)), OverlayCommand::Redraw);
        controller.pointer_move(Point::new(12.0, 30.0));
        assert_eq!(controller.pointer_up(Point::new(12.0, 30.0)), OverlayCommand::Redraw);

        assert!(controller.committed_selection().is_none());
        assert_eq!(controller.perform(Action::Confirm), OverlayCommand::Nothing);
        assert_eq!(controller.double_click(Point::new(11.0, 30.0)), OverlayCommand::Nothing);
    }

    #[test]
    fn test_text_tool_round_trip() {
        let mut controller = ready_controller(0, 1.0);
        select(&mut controller, (10.0, 10.0), (110.0, 90.0));
        controller.perform(Action::Tool(Tool::Text));

        let at = Point::new(30.0, 40.0);
        assert_eq!(controller.pointer_down(at), OverlayCommand::RequestText(at));
        assert_eq!(controller.commit_text("note"), OverlayCommand::Redraw);
        assert_eq!(controller.editor().annotations().len(), 1);
    }

    #[test]
    fn test_pin_placement_in_global_logical_units() {
        let mut controller = ready_controller(1, 2.0);
        select(&mut controller, (40.0, 20.0), (140.0, 80.0));

        assert_eq!(
            controller.pin_placement(),
            Some(PinPlacement {
                x: 1020,
                y: 10,
                width: 50,
                height: 30
            })
        );
    }

    #[test]
    fn test_session_end_drops_frame() {
        let mut controller = ready_controller(0, 1.0);
        select(&mut controller, (10.0, 10.0), (60.0, 50.0));
        assert!(controller.handle_event(&SessionEvent::SessionEnd));
        assert!(controller.frame().is_none());
        assert!(matches!(controller.render_output(), Err(OutputError::NoFrame)));
    }
}
