//! GTK side of a capture session: overlay windows, kiosk inhibit and the
//! focus-follows-mouse poll.

use gtk4 as gtk;
use libadwaita as adw;
use log::{debug, info};

use gtk::{gdk, glib};
use gtk4::prelude::*;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};
use std::time::Duration;

use super::handlers::CaptureContext;
use super::overlay::OverlayWindow;
use crate::capture::DisplayInfo;
use crate::geometry::OverlayPlacement;
use crate::session::{FocusFollower, OverlayHost, ReadySignal, SessionError, SessionEvent};

/// Open overlays by display index, shared with the focus poll.
pub type OverlayRegistry = Rc<RefCell<BTreeMap<usize, Rc<OverlayWindow>>>>;

pub struct GtkOverlayHost {
    app: adw::Application,
    host_window: adw::ApplicationWindow,
    ctx: Weak<CaptureContext>,
    overlays: OverlayRegistry,
    inhibit_cookie: Option<u32>,
    focus_source: Option<glib::SourceId>,
}

impl GtkOverlayHost {
    pub fn new(
        app: &adw::Application,
        host_window: &adw::ApplicationWindow,
        ctx: Weak<CaptureContext>,
    ) -> Self {
        Self {
            app: app.clone(),
            host_window: host_window.clone(),
            ctx,
            overlays: Rc::new(RefCell::new(BTreeMap::new())),
            inhibit_cookie: None,
            focus_source: None,
        }
    }

    pub fn overlay(&self, display_index: usize) -> Option<Rc<OverlayWindow>> {
        self.overlays.borrow().get(&display_index).cloned()
    }

    fn snapshot(&self) -> Vec<Rc<OverlayWindow>> {
        self.overlays.borrow().values().cloned().collect()
    }
}

/// The GDK monitor for a display: by connector name, else by logical origin.
fn find_monitor(display: &DisplayInfo) -> Option<gdk::Monitor> {
    let monitors = gdk::Display::default()?.monitors();
    let all: Vec<gdk::Monitor> = (0..monitors.n_items())
        .filter_map(|i| monitors.item(i).and_downcast::<gdk::Monitor>())
        .collect();

    all.iter()
        .find(|m| m.connector().is_some_and(|c| c.as_str() == display.name))
        .or_else(|| {
            all.iter().find(|m| {
                let geometry = m.geometry();
                geometry.x() == display.logical_x && geometry.y() == display.logical_y
            })
        })
        .cloned()
}

impl OverlayHost for GtkOverlayHost {
    type Window = Rc<OverlayWindow>;

    fn hide_host(&mut self) {
        self.host_window.set_visible(false);
    }

    fn show_host(&mut self) {
        self.host_window.set_visible(true);
        self.host_window.present();
    }

    fn set_kiosk(&mut self, enabled: bool) {
        match (enabled, self.inhibit_cookie.take()) {
            (true, None) => {
                let cookie = self.app.inhibit(
                    None::<&gtk::Window>,
                    gtk::ApplicationInhibitFlags::IDLE | gtk::ApplicationInhibitFlags::SWITCH,
                    Some("Taking a screenshot"),
                );
                if cookie == 0 {
                    debug!("Session inhibit not granted");
                } else {
                    self.inhibit_cookie = Some(cookie);
                }
            }
            (true, Some(cookie)) => self.inhibit_cookie = Some(cookie),
            (false, Some(cookie)) => self.app.uninhibit(cookie),
            (false, None) => {}
        }
    }

    fn create_overlay(
        &mut self,
        display: &DisplayInfo,
        placement: OverlayPlacement,
        ready: ReadySignal,
    ) -> Result<Self::Window, SessionError> {
        let ctx = self.ctx.upgrade().ok_or_else(|| SessionError::Window {
            index: display.index,
            reason: "application is shutting down".to_string(),
        })?;
        let (settings, shortcuts) = {
            let state = ctx.state.borrow();
            (state.settings.clone(), state.shortcuts.clone())
        };

        let overlay = OverlayWindow::new(
            &self.app,
            display,
            placement,
            &settings,
            shortcuts,
            self.ctx.clone(),
            ready,
        );
        self.overlays
            .borrow_mut()
            .insert(display.index, overlay.clone());

        overlay.present_on(find_monitor(display).as_ref());
        debug!(
            "Overlay for display {} at ({}, {}) {}x{} scale {}",
            display.index,
            placement.x,
            placement.y,
            placement.width,
            placement.height,
            placement.scale_factor
        );
        Ok(overlay)
    }

    fn close_overlay(&mut self, display_index: usize, window: Self::Window) {
        self.overlays.borrow_mut().remove(&display_index);
        window.destroy();
    }

    fn focus_overlay(&mut self, display_index: usize, window: &Self::Window) {
        debug!("Focusing overlay {}", display_index);
        window.window.present();
    }

    fn broadcast(&mut self, event: &SessionEvent) {
        debug!("Broadcasting {}", event.name());
        for overlay in self.snapshot() {
            overlay.handle_event(event);
        }
    }

    fn start_focus_tracking(&mut self, mut follower: FocusFollower, interval: Duration) {
        self.stop_focus_tracking();

        let overlays = self.overlays.clone();
        let source = glib::timeout_add_local(interval, move || {
            poll_pointer(&overlays, &mut follower);
            glib::ControlFlow::Continue
        });
        self.focus_source = Some(source);
        info!("Focus tracking every {:?}", interval);
    }

    fn stop_focus_tracking(&mut self) {
        if let Some(source) = self.focus_source.take() {
            source.remove();
            debug!("Focus tracking stopped");
        }
    }
}

/// One tick of focus-follows-mouse. Overlays cover their whole display, so
/// the surface under the pointer identifies the display.
fn poll_pointer(overlays: &OverlayRegistry, follower: &mut FocusFollower) {
    let Some(pointer) = gdk::Display::default()
        .and_then(|d| d.default_seat())
        .and_then(|s| s.pointer())
    else {
        return;
    };
    let (Some(surface), x, y) = pointer.surface_at_position() else {
        return;
    };

    let target = {
        let overlays = overlays.borrow();
        let Some(index) = overlays
            .iter()
            .find(|(_, o)| o.window.surface().as_ref() == Some(&surface))
            .map(|(index, _)| *index)
        else {
            return;
        };
        let Some((gx, gy)) = follower.to_global(index, x, y) else {
            return;
        };
        match follower.observe(gx, gy) {
            Some(next) => overlays.get(&next).cloned(),
            None => None,
        }
    };

    if let Some(overlay) = target {
        debug!("Pointer moved to display {}", overlay.display_index());
        overlay.window.present();
    }
}
