//! Rectangular region selection on one overlay.
//!
//! All coordinates are physical pixels of the display's frozen frame.

use serde::Serialize;

use crate::geometry::{self, Point};

pub const MIN_SELECTION_SIZE: f64 = 10.0;
pub const HANDLE_RADIUS: f64 = 12.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Selection {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Selection {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The rectangle spanned by two corners, in either order.
    pub fn from_points(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    /// Flips negative extents so that width and height are non-negative.
    pub fn normalized(self) -> Self {
        let mut sel = self;
        if sel.width < 0.0 {
            sel.x += sel.width;
            sel.width = -sel.width;
        }
        if sel.height < 0.0 {
            sel.y += sel.height;
            sel.height = -sel.height;
        }
        sel
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    pub fn clamp_point(&self, point: Point) -> Point {
        Point::new(
            point.x.clamp(self.x, self.x + self.width),
            point.y.clamp(self.y, self.y + self.height),
        )
    }

    pub fn is_at_least(&self, min_size: f64) -> bool {
        self.width >= min_size && self.height >= min_size
    }

    pub fn translated(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    /// Applies a pointer delta to the edges owned by `handle`.
    pub fn resized(self, handle: HandleType, dx: f64, dy: f64) -> Self {
        let mut sel = self;
        match handle {
            HandleType::NW => {
                sel.x += dx;
                sel.y += dy;
                sel.width -= dx;
                sel.height -= dy;
            }
            HandleType::N => {
                sel.y += dy;
                sel.height -= dy;
            }
            HandleType::NE => {
                sel.y += dy;
                sel.width += dx;
                sel.height -= dy;
            }
            HandleType::E => sel.width += dx,
            HandleType::SE => {
                sel.width += dx;
                sel.height += dy;
            }
            HandleType::S => sel.height += dy,
            HandleType::SW => {
                sel.x += dx;
                sel.width -= dx;
                sel.height += dy;
            }
            HandleType::W => {
                sel.x += dx;
                sel.width -= dx;
            }
            HandleType::None => {}
        }
        sel.normalized()
    }

    /// Integer pixel rectangle `(x, y, width, height)`.
    pub fn pixel_rect(&self) -> (i64, i64, u32, u32) {
        let sel = self.normalized();
        (
            sel.x.round() as i64,
            sel.y.round() as i64,
            sel.width.round().max(0.0) as u32,
            sel.height.round().max(0.0) as u32,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleType {
    None,
    NW,
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
}

impl HandleType {
    pub const ALL: [HandleType; 8] = [
        HandleType::NW,
        HandleType::N,
        HandleType::NE,
        HandleType::E,
        HandleType::SE,
        HandleType::S,
        HandleType::SW,
        HandleType::W,
    ];

    /// Named cursor for hover feedback.
    pub fn cursor_name(&self) -> &'static str {
        match self {
            HandleType::NW => "nw-resize",
            HandleType::N => "n-resize",
            HandleType::NE => "ne-resize",
            HandleType::E => "e-resize",
            HandleType::SE => "se-resize",
            HandleType::S => "s-resize",
            HandleType::SW => "sw-resize",
            HandleType::W => "w-resize",
            HandleType::None => "crosshair",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SelectionPhase {
    None,
    Drawing {
        anchor: Point,
    },
    Idle,
    Resizing {
        handle: HandleType,
        origin: Selection,
        down: Point,
    },
    Moving {
        origin: Selection,
        down: Point,
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SelectionEvent {
    Ignored,
    /// A fresh selection began on this overlay.
    Started,
    ResizeStarted(HandleType),
    MoveStarted,
    Committed(Selection),
    /// Released below the minimum size.
    Discarded,
}

#[derive(Clone, Debug)]
pub struct SelectionMachine {
    phase: SelectionPhase,
    selection: Option<Selection>,
    min_size: f64,
    handle_radius: f64,
    bounds: Option<(f64, f64)>,
}

impl Default for SelectionMachine {
    fn default() -> Self {
        Self::new(MIN_SELECTION_SIZE, HANDLE_RADIUS)
    }
}

impl SelectionMachine {
    pub fn new(min_size: f64, handle_radius: f64) -> Self {
        Self {
            phase: SelectionPhase::None,
            selection: None,
            min_size,
            handle_radius,
            bounds: None,
        }
    }

    /// Keeps moved selections inside a `width x height` frame.
    pub fn set_bounds(&mut self, width: f64, height: f64) {
        self.bounds = Some((width, height));
    }

    pub fn phase(&self) -> SelectionPhase {
        self.phase
    }

    /// The current rectangle, including one still being drawn.
    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// The selection once the pointer has been released on it.
    pub fn committed(&self) -> Option<Selection> {
        match self.phase {
            SelectionPhase::Idle => self.selection,
            _ => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(
            self.phase,
            SelectionPhase::Drawing { .. }
                | SelectionPhase::Resizing { .. }
                | SelectionPhase::Moving { .. }
        )
    }

    /// The closest handle anchor within the hit radius.
    pub fn handle_at(&self, point: Point) -> HandleType {
        let Some(sel) = self.committed() else {
            return HandleType::None;
        };

        geometry::handle_anchors(&sel)
            .iter()
            .map(|(handle, anchor)| (*handle, anchor.distance_to(point)))
            .filter(|(_, distance)| *distance <= self.handle_radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(handle, _)| handle)
            .unwrap_or(HandleType::None)
    }

    pub fn pointer_down(&mut self, point: Point) -> SelectionEvent {
        if self.is_dragging() {
            return SelectionEvent::Ignored;
        }

        if let Some(sel) = self.committed() {
            let handle = self.handle_at(point);
            if handle != HandleType::None {
                self.phase = SelectionPhase::Resizing {
                    handle,
                    origin: sel,
                    down: point,
                };
                return SelectionEvent::ResizeStarted(handle);
            }
            if sel.contains(point) {
                self.phase = SelectionPhase::Moving {
                    origin: sel,
                    down: point,
                };
                return SelectionEvent::MoveStarted;
            }
        }

        self.selection = Some(Selection::new(point.x, point.y, 0.0, 0.0));
        self.phase = SelectionPhase::Drawing { anchor: point };
        SelectionEvent::Started
    }

    /// Returns true when the selection changed.
    pub fn pointer_move(&mut self, point: Point) -> bool {
        let next = match self.phase {
            SelectionPhase::Drawing { anchor } => Selection::from_points(anchor, point),
            SelectionPhase::Resizing {
                handle,
                origin,
                down,
            } => origin.resized(handle, point.x - down.x, point.y - down.y),
            SelectionPhase::Moving { origin, down } => {
                self.keep_inside(origin.translated(point.x - down.x, point.y - down.y))
            }
            SelectionPhase::None | SelectionPhase::Idle => return false,
        };

        let changed = self.selection != Some(next);
        self.selection = Some(next);
        changed
    }

    pub fn pointer_up(&mut self, point: Point) -> SelectionEvent {
        self.pointer_move(point);

        match self.phase {
            SelectionPhase::Drawing { .. } | SelectionPhase::Resizing { .. } => {
                let sel = self.selection.unwrap_or_default();
                if sel.is_at_least(self.min_size) {
                    self.phase = SelectionPhase::Idle;
                    SelectionEvent::Committed(sel)
                } else {
                    self.clear();
                    SelectionEvent::Discarded
                }
            }
            SelectionPhase::Moving { .. } => {
                self.phase = SelectionPhase::Idle;
                match self.selection {
                    Some(sel) => SelectionEvent::Committed(sel),
                    None => SelectionEvent::Ignored,
                }
            }
            SelectionPhase::None | SelectionPhase::Idle => SelectionEvent::Ignored,
        }
    }

    pub fn clear(&mut self) {
        self.phase = SelectionPhase::None;
        self.selection = None;
    }

    fn keep_inside(&self, sel: Selection) -> Selection {
        let Some((width, height)) = self.bounds else {
            return sel;
        };
        Selection {
            x: sel.x.clamp(0.0, (width - sel.width).max(0.0)),
            y: sel.y.clamp(0.0, (height - sel.height).max(0.0)),
            ..sel
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn committed(x: f64, y: f64, w: f64, h: f64) -> SelectionMachine {
        let mut machine = SelectionMachine::default();
        machine.pointer_down(Point::new(x, y));
        machine.pointer_up(Point::new(x + w, y + h));
        machine
    }

    #[test]
    fn test_drag_in_any_direction() {
        let mut machine = SelectionMachine::default();
        assert_eq!(machine.pointer_down(Point::new(200.0, 150.0)), SelectionEvent::Started);
        machine.pointer_move(Point::new(120.0, 100.0));

        let sel = machine.selection().unwrap();
        assert_eq!(sel, Selection::new(120.0, 100.0, 80.0, 50.0));
        assert_eq!(
            machine.pointer_up(Point::new(120.0, 100.0)),
            SelectionEvent::Committed(sel)
        );
        assert_eq!(machine.committed(), Some(sel));
    }

    #[test]
    fn test_tiny_selection_discarded() {
        let mut machine = SelectionMachine::default();
        machine.pointer_down(Point::new(10.0, 10.0));
        assert_eq!(machine.pointer_up(Point::new(40.0, 15.0)), SelectionEvent::Discarded);
        assert!(machine.selection().is_none());
        assert_eq!(machine.phase(), SelectionPhase::None);
    }

    #[test]
    fn test_handle_hit_testing() {
        let machine = committed(100.0, 100.0, 50.0, 50.0);
        assert_eq!(machine.handle_at(Point::new(101.0, 99.0)), HandleType::NW);
        assert_eq!(machine.handle_at(Point::new(150.0, 125.0)), HandleType::E);
        assert_eq!(machine.handle_at(Point::new(125.0, 160.0)), HandleType::S);
        assert_eq!(machine.handle_at(Point::new(125.0, 125.0)), HandleType::None);
    }

    #[test]
    fn test_resize_west_handle() {
        let mut machine = committed(100.0, 100.0, 50.0, 50.0);
        assert_eq!(
            machine.pointer_down(Point::new(100.0, 125.0)),
            SelectionEvent::ResizeStarted(HandleType::W)
        );
        machine.pointer_move(Point::new(80.0, 140.0));

        assert_eq!(machine.selection().unwrap(), Selection::new(80.0, 100.0, 70.0, 50.0));
    }

    #[test]
    fn test_resize_past_opposite_edge_flips() {
        let mut machine = committed(100.0, 100.0, 50.0, 50.0);
        machine.pointer_down(Point::new(150.0, 150.0));
        machine.pointer_move(Point::new(90.0, 150.0));

        let sel = machine.selection().unwrap();
        assert_eq!(sel, Selection::new(90.0, 100.0, 10.0, 50.0));
        assert!(sel.width >= 0.0 && sel.height >= 0.0);
    }

    #[test]
    fn test_resize_below_minimum_is_discarded() {
        let mut machine = committed(100.0, 100.0, 50.0, 50.0);
        assert_eq!(
            machine.pointer_down(Point::new(150.0, 125.0)),
            SelectionEvent::ResizeStarted(HandleType::E)
        );

        assert_eq!(machine.pointer_up(Point::new(100.0, 125.0)), SelectionEvent::Discarded);
        assert!(machine.selection().is_none());
        assert!(machine.committed().is_none());
        assert_eq!(machine.phase(), SelectionPhase::None);
    }

    #[test]
    fn test_resize_never_inverts_on_any_frame() {
        let deltas = [-120.0, -60.0, -50.0, -49.0, -25.0, -1.0, 0.0, 1.0, 25.0, 60.0, 120.0];

        for handle in HandleType::ALL {
            for dx in deltas {
                for dy in deltas {
                    let mut machine = committed(100.0, 100.0, 50.0, 50.0);
                    let anchor = geometry::handle_anchors(&machine.committed().unwrap())
                        .into_iter()
                        .find(|(h, _)| *h == handle)
                        .map(|(_, p)| p)
                        .unwrap();
                    assert_eq!(
                        machine.pointer_down(anchor),
                        SelectionEvent::ResizeStarted(handle)
                    );

                    for step in 1..=4 {
                        let t = step as f64 / 4.0;
                        machine.pointer_move(Point::new(anchor.x + dx * t, anchor.y + dy * t));
                        let sel = machine.selection().unwrap();
                        assert!(
                            sel.width >= 0.0 && sel.height >= 0.0,
                            "{:?} by ({}, {}) at step {}: {:?}",
                            handle,
                            dx,
                            dy,
                            step,
                            sel
                        );
                    }

                    match machine.pointer_up(Point::new(anchor.x + dx, anchor.y + dy)) {
                        SelectionEvent::Committed(sel) => {
                            assert!(sel.is_at_least(MIN_SELECTION_SIZE));
                        }
                        SelectionEvent::Discarded => assert!(machine.selection().is_none()),
                        other => panic!("unexpected release event {:?}", other),
                    }
                }
            }
        }
    }

    #[test]
    fn test_resize_deltas_per_handle() {
        let base = Selection::new(100.0, 100.0, 50.0, 50.0);
        assert_eq!(
            base.resized(HandleType::NE, 10.0, -10.0),
            Selection::new(100.0, 90.0, 60.0, 60.0)
        );
        assert_eq!(
            base.resized(HandleType::SW, -5.0, 5.0),
            Selection::new(95.0, 100.0, 55.0, 55.0)
        );
        assert_eq!(
            base.resized(HandleType::N, 30.0, 20.0),
            Selection::new(100.0, 120.0, 50.0, 30.0)
        );
    }

    #[test]
    fn test_move_stays_inside_bounds() {
        let mut machine = committed(100.0, 100.0, 50.0, 50.0);
        machine.set_bounds(300.0, 200.0);

        assert_eq!(machine.pointer_down(Point::new(125.0, 125.0)), SelectionEvent::MoveStarted);
        machine.pointer_move(Point::new(500.0, 0.0));

        assert_eq!(machine.selection().unwrap(), Selection::new(250.0, 0.0, 50.0, 50.0));
        assert!(matches!(machine.pointer_up(Point::new(500.0, 0.0)), SelectionEvent::Committed(_)));
    }

    #[test]
    fn test_press_outside_starts_new_selection() {
        let mut machine = committed(100.0, 100.0, 50.0, 50.0);
        assert_eq!(machine.pointer_down(Point::new(400.0, 400.0)), SelectionEvent::Started);
        assert!(machine.committed().is_none());
    }
}
