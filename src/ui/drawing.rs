use gtk4 as gtk;

use gtk::cairo::{self, Context, FillRule, FontSlant, FontWeight, ImageSurface};

use crate::editor::render;
use crate::geometry::{self, Point};
use crate::selection::{Selection, SelectionPhase};
use crate::session::OverlayController;

const DIM_ALPHA: f64 = 0.5;
const BORDER_WIDTH: f64 = 2.0;
const HANDLE_SIZE: f64 = 8.0;
const LABEL_FONT_SIZE: f64 = 12.0;
const LABEL_PADDING: f64 = 4.0;

/// Paints one overlay: the frozen frame, annotations, then selection chrome.
///
/// `frame` is the frame as a cairo surface in physical pixels; the widget is
/// in logical units, so the frame and annotations are drawn scaled down.
pub fn draw_overlay(
    cr: &Context,
    width: i32,
    height: i32,
    controller: &OverlayController,
    frame: Option<&ImageSurface>,
) -> Result<(), cairo::Error> {
    let da_width = width as f64;
    let da_height = height as f64;

    cr.set_source_rgb(0.0, 0.0, 0.0);
    cr.paint()?;

    let Some(surface) = frame else {
        return Ok(());
    };
    let scale = controller.display().scale_factor.max(f64::EPSILON);
    let editor = controller.editor();
    let source = controller.frame().map(|f| &f.image);

    cr.save()?;
    cr.scale(1.0 / scale, 1.0 / scale);
    cr.set_source_surface(surface, 0.0, 0.0)?;
    cr.paint()?;
    render::draw_annotations(cr, editor.annotations(), source)?;
    if let Some(current) = editor.current() {
        render::draw_annotation(cr, current, source)?;
    }
    cr.restore()?;

    match controller.selection() {
        Some(sel) => {
            let drawing = matches!(
                controller.selection_machine().phase(),
                SelectionPhase::Drawing { .. }
            );
            draw_selection_overlay(cr, da_width, da_height, &sel, scale, !drawing)?;
        }
        None => {
            cr.set_source_rgba(0.0, 0.0, 0.0, DIM_ALPHA);
            cr.paint()?;
        }
    }

    if let Some(pending) = editor.pending_text() {
        draw_pending_text_cursor(cr, pending.at, scale)?;
    }

    Ok(())
}

fn to_window(sel: &Selection, scale: f64) -> (f64, f64, f64, f64) {
    let origin = geometry::physical_to_window(Point::new(sel.x, sel.y), scale);
    let size = geometry::physical_to_window(Point::new(sel.width, sel.height), scale);
    (origin.x, origin.y, size.x, size.y)
}

fn draw_selection_overlay(
    cr: &Context,
    da_width: f64,
    da_height: f64,
    sel: &Selection,
    scale: f64,
    with_handles: bool,
) -> Result<(), cairo::Error> {
    let (rx, ry, rw, rh) = to_window(sel, scale);

    cr.set_source_rgba(0.0, 0.0, 0.0, DIM_ALPHA);
    cr.set_fill_rule(FillRule::EvenOdd);
    cr.rectangle(0.0, 0.0, da_width, da_height);
    cr.rectangle(rx, ry, rw, rh);
    cr.fill()?;
    cr.set_fill_rule(FillRule::Winding);

    cr.set_source_rgb(1.0, 1.0, 1.0);
    cr.set_line_width(BORDER_WIDTH);
    cr.rectangle(rx, ry, rw, rh);
    cr.stroke()?;

    if with_handles {
        for (_, anchor) in geometry::handle_anchors(sel) {
            let p = geometry::physical_to_window(anchor, scale);
            cr.rectangle(
                p.x - HANDLE_SIZE / 2.0,
                p.y - HANDLE_SIZE / 2.0,
                HANDLE_SIZE,
                HANDLE_SIZE,
            );
        }
        cr.set_source_rgb(1.0, 1.0, 1.0);
        cr.fill_preserve()?;
        cr.set_source_rgba(0.0, 0.0, 0.0, 0.6);
        cr.set_line_width(1.0);
        cr.stroke()?;
    }

    draw_size_label(cr, sel, rx, ry)
}

/// `W × H` in physical pixels, above the selection or inside it at the top
/// edge of the screen.
fn draw_size_label(cr: &Context, sel: &Selection, rx: f64, ry: f64) -> Result<(), cairo::Error> {
    let (_, _, width, height) = sel.pixel_rect();
    let text = format!("{} × {}", width, height);

    cr.select_font_face("Sans", FontSlant::Normal, FontWeight::Bold);
    cr.set_font_size(LABEL_FONT_SIZE);
    let extents = cr.text_extents(&text)?;

    let box_w = extents.width() + LABEL_PADDING * 2.0;
    let box_h = LABEL_FONT_SIZE + LABEL_PADDING * 2.0;
    let box_y = if ry - box_h - LABEL_PADDING >= 0.0 {
        ry - box_h - LABEL_PADDING
    } else {
        ry + LABEL_PADDING
    };
    let box_x = rx.max(0.0);

    cr.set_source_rgba(0.0, 0.0, 0.0, 0.7);
    cr.rectangle(box_x, box_y, box_w, box_h);
    cr.fill()?;

    cr.set_source_rgb(1.0, 1.0, 1.0);
    cr.move_to(
        box_x + LABEL_PADDING - extents.x_bearing(),
        box_y + LABEL_PADDING + LABEL_FONT_SIZE * 0.8,
    );
    cr.show_text(&text)?;
    Ok(())
}

fn draw_pending_text_cursor(cr: &Context, at: Point, scale: f64) -> Result<(), cairo::Error> {
    let p = geometry::physical_to_window(at, scale);
    cr.set_source_rgba(1.0, 1.0, 1.0, 0.8);
    cr.set_line_width(2.0);
    cr.move_to(p.x, p.y - 20.0);
    cr.line_to(p.x, p.y + 5.0);
    cr.stroke()
}
