//! Floating windows that keep a result on screen after the session ends.

use gtk4 as gtk;
use libadwaita as adw;
use log::{debug, info};

use gtk::gdk::{self, Texture};
use gtk::glib;
use gtk4::prelude::*;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::output::{OutputError, PinGeometry, PinPlacement, PinnedImage, PinnedWindowHost};

/// Pointer travel before a press turns into a window move.
const MOVE_THRESHOLD: f64 = 4.0;

pub struct GtkPinHost {
    app: adw::Application,
}

impl GtkPinHost {
    pub fn new(app: &adw::Application) -> Self {
        Self { app: app.clone() }
    }
}

impl PinnedWindowHost for GtkPinHost {
    fn create_pinned(
        &self,
        image: PinnedImage,
        placement: PinPlacement,
    ) -> Result<(), OutputError> {
        let texture = Texture::from_bytes(&glib::Bytes::from(&image.encoded))
            .map_err(|e| OutputError::Pin(e.to_string()))?;

        let geometry = Rc::new(RefCell::new(PinGeometry::new(
            image.original_width,
            image.original_height,
        )));
        let (width, height) = geometry.borrow().size();

        // Toplevels cannot be positioned from GTK4; the compositor places them.
        debug!(
            "Pin {} requested at ({}, {}) {}x{}",
            image.id, placement.x, placement.y, placement.width, placement.height
        );

        let picture = gtk::Picture::for_paintable(&texture);
        picture.set_content_fit(gtk::ContentFit::Fill);
        picture.set_can_shrink(true);

        let window = gtk::Window::builder()
            .application(&self.app)
            .title(format!("Pinned screenshot {}", image.id))
            .decorated(false)
            .default_width(width as i32)
            .default_height(height as i32)
            .child(&picture)
            .build();
        window.add_css_class("multishot-pin");

        let toggling = Rc::new(Cell::new(false));
        connect_resize_clamp(&window, &geometry, &toggling);
        connect_toggle_size(&window, &picture, &geometry, &toggling);
        connect_move(&window, &picture);
        connect_close(&window, &picture);

        window.present();
        info!("Pinned {}x{} image", image.original_width, image.original_height);
        Ok(())
    }
}

fn connect_resize_clamp(
    window: &gtk::Window,
    geometry: &Rc<RefCell<PinGeometry>>,
    toggling: &Rc<Cell<bool>>,
) {
    let on_resize = {
        let geometry = geometry.clone();
        let toggling = toggling.clone();
        move |window: &gtk::Window| {
            // The toggled size is not clamped.
            if toggling.get() {
                return;
            }
            let (width, height) = window.default_size();
            let clamped = geometry
                .borrow_mut()
                .resize(width.max(0) as u32, height.max(0) as u32);
            if clamped != (width.max(0) as u32, height.max(0) as u32) {
                window.set_default_size(clamped.0 as i32, clamped.1 as i32);
            }
        }
    };
    window.connect_default_width_notify(on_resize.clone());
    window.connect_default_height_notify(on_resize);
}

fn connect_toggle_size(
    window: &gtk::Window,
    picture: &gtk::Picture,
    geometry: &Rc<RefCell<PinGeometry>>,
    toggling: &Rc<Cell<bool>>,
) {
    let click = gtk::GestureClick::new();
    click.set_button(1);
    click.connect_pressed({
        let window = window.clone();
        let geometry = geometry.clone();
        let toggling = toggling.clone();
        move |_, n_press, _, _| {
            if n_press != 2 {
                return;
            }
            let (width, height) = geometry.borrow_mut().toggle();
            toggling.set(true);
            window.set_default_size(width as i32, height as i32);
            toggling.set(false);
        }
    });
    picture.add_controller(click);
}

fn connect_move(window: &gtk::Window, picture: &gtk::Picture) {
    let drag = gtk::GestureDrag::new();
    drag.set_button(1);
    let moving = Rc::new(Cell::new(false));

    drag.connect_drag_begin({
        let moving = moving.clone();
        move |_, _, _| moving.set(false)
    });

    drag.connect_drag_update({
        let window = window.clone();
        move |gesture, offset_x, offset_y| {
            if moving.get() || offset_x.hypot(offset_y) < MOVE_THRESHOLD {
                return;
            }
            let (Some(device), Some((x, y))) = (gesture.device(), gesture.start_point()) else {
                return;
            };
            let Some(toplevel) = window
                .surface()
                .and_then(|s| s.downcast::<gdk::Toplevel>().ok())
            else {
                return;
            };
            moving.set(true);
            toplevel.begin_move(
                &device,
                gesture.current_button() as i32,
                x,
                y,
                gesture.current_event_time(),
            );
        }
    });

    picture.add_controller(drag);
}

fn connect_close(window: &gtk::Window, picture: &gtk::Picture) {
    let right_click = gtk::GestureClick::new();
    right_click.set_button(3);
    right_click.connect_pressed({
        let window = window.clone();
        move |_, _, _, _| window.close()
    });
    picture.add_controller(right_click);

    let keys = gtk::EventControllerKey::new();
    keys.connect_key_pressed({
        let window = window.clone();
        move |_, key, _, _| {
            if key == gdk::Key::Escape {
                window.close();
                glib::Propagation::Stop
            } else {
                glib::Propagation::Proceed
            }
        }
    });
    window.add_controller(keys);
}
