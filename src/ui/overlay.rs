//! One fullscreen overlay window per display.

use gtk4 as gtk;
use libadwaita as adw;
use log::{debug, warn};

use gtk::cairo::ImageSurface;
use gtk::{gdk, glib, DrawingArea, GestureClick, GestureDrag};
use gtk4::prelude::*;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::dialogs::{self, TextPopoverComponents};
use super::drawing;
use super::handlers::CaptureContext;
use super::toolbar::{self, ToolbarComponents};
use crate::app::{Action, Settings, ShortcutConfig};
use crate::capture::DisplayInfo;
use crate::editor::render;
use crate::geometry::{self, OverlayPlacement, Point};
use crate::output::{OutputError, PinPlacement};
use crate::selection::HandleType;
use crate::session::{OverlayCommand, OverlayController, ReadySignal, SessionEvent};

pub struct OverlayWindow {
    display_index: usize,
    scale: f64,
    pub window: gtk::Window,
    drawing_area: DrawingArea,
    toasts: adw::ToastOverlay,
    toolbar: ToolbarComponents,
    text_popover: TextPopoverComponents,
    controller: RefCell<OverlayController>,
    frame_surface: RefCell<Option<ImageSurface>>,
    shortcuts: ShortcutConfig,
    ctx: Weak<CaptureContext>,
}

impl OverlayWindow {
    pub fn new(
        app: &adw::Application,
        display: &DisplayInfo,
        placement: OverlayPlacement,
        settings: &Settings,
        shortcuts: ShortcutConfig,
        ctx: Weak<CaptureContext>,
        ready: ReadySignal,
    ) -> Rc<Self> {
        let drawing_area = DrawingArea::builder().hexpand(true).vexpand(true).build();
        let toolbar = toolbar::create_toolbar(&shortcuts, settings.color);
        let text_popover = dialogs::create_text_popover(&drawing_area);

        let overlay = gtk::Overlay::builder().child(&drawing_area).build();
        overlay.add_overlay(&toolbar.tools_box);

        let toasts = adw::ToastOverlay::new();
        toasts.set_child(Some(&overlay));

        let window = gtk::Window::builder()
            .application(app)
            .title(format!("Multishot: {}", display.name))
            .decorated(false)
            .resizable(false)
            .default_width(placement.width as i32)
            .default_height(placement.height as i32)
            .child(&toasts)
            .build();
        window.add_css_class("multishot-overlay");

        let this = Rc::new(Self {
            display_index: display.index,
            scale: placement.scale_factor,
            window,
            drawing_area,
            toasts,
            toolbar,
            text_popover,
            controller: RefCell::new(OverlayController::new(display.clone(), settings)),
            frame_surface: RefCell::new(None),
            shortcuts,
            ctx,
        });

        this.setup_draw_function();
        this.connect_pointer_handlers();
        this.connect_key_handler();
        this.connect_toolbar();
        this.connect_text_popover();
        this.connect_lifecycle(ready);
        this
    }

    pub fn display_index(&self) -> usize {
        self.display_index
    }

    pub fn present_on(&self, monitor: Option<&gdk::Monitor>) {
        self.window.present();
        match monitor {
            Some(monitor) => self.window.fullscreen_on_monitor(monitor),
            None => {
                warn!("No monitor matched display {}; using fullscreen", self.display_index);
                self.window.fullscreen();
            }
        }
    }

    pub fn destroy(&self) {
        dialogs::detach_text_popover(&self.text_popover);
        self.window.destroy();
    }

    pub fn toast(&self, message: &str) {
        self.toasts.add_toast(adw::Toast::new(message));
    }

    pub fn render_output(&self) -> Result<Vec<u8>, OutputError> {
        self.controller.borrow().render_output()
    }

    pub fn pin_placement(&self) -> Option<PinPlacement> {
        self.controller.borrow().pin_placement()
    }

    pub fn handle_event(&self, event: &SessionEvent) {
        let redraw = self.controller.borrow_mut().handle_event(event);

        match event {
            SessionEvent::ImageData { display_index, .. }
                if *display_index == self.display_index =>
            {
                let surface = self
                    .controller
                    .borrow()
                    .frame()
                    .map(|frame| render::image_to_surface(&frame.image));
                match surface {
                    Some(Ok(surface)) => *self.frame_surface.borrow_mut() = Some(surface),
                    Some(Err(e)) => warn!("Display {} frame unusable: {}", self.display_index, e),
                    None => {}
                }
            }
            SessionEvent::SessionEnd => {
                self.frame_surface.borrow_mut().take();
            }
            SessionEvent::Error { message } => self.toast(message),
            _ => {}
        }

        if redraw {
            self.refresh();
        }
    }

    fn refresh(&self) {
        self.drawing_area.queue_draw();
        let (visible, tool, can_undo, can_redo) = {
            let controller = self.controller.borrow();
            let editor = controller.editor();
            (
                controller.wants_toolbar(),
                editor.active_tool(),
                editor.can_undo(),
                editor.can_redo(),
            )
        };
        self.toolbar.sync(visible, tool, can_undo, can_redo);
    }

    /// Carries out a controller decision. Local effects stay here, session
    /// effects go to the capture context.
    fn dispatch(&self, command: OverlayCommand) {
        match command {
            OverlayCommand::Nothing => {}
            OverlayCommand::Redraw => self.refresh(),
            OverlayCommand::RequestText(at) => {
                self.refresh();
                let p = geometry::physical_to_window(at, self.scale);
                self.text_popover.show_at(p.x, p.y);
            }
            command => {
                self.refresh();
                if let Some(ctx) = self.ctx.upgrade() {
                    ctx.handle_command(self.display_index, command);
                }
            }
        }
    }

    fn perform(&self, action: Action) {
        let command = self.controller.borrow_mut().perform(action);
        self.dispatch(command);
    }

    fn to_physical(&self, x: f64, y: f64) -> Point {
        geometry::window_to_physical(Point::new(x, y), self.scale)
    }

    fn setup_draw_function(self: &Rc<Self>) {
        let weak = Rc::downgrade(self);
        self.drawing_area.set_draw_func(move |_, cr, width, height| {
            let Some(this) = weak.upgrade() else {
                return;
            };
            let controller = this.controller.borrow();
            let frame = this.frame_surface.borrow();
            if let Err(e) = drawing::draw_overlay(cr, width, height, &controller, frame.as_ref()) {
                warn!("Overlay {} draw failed: {}", this.display_index, e);
            }
        });
    }

    fn connect_pointer_handlers(self: &Rc<Self>) {
        let drag = GestureDrag::new();
        drag.set_button(1);

        drag.connect_drag_begin({
            let weak = Rc::downgrade(self);
            move |_, x, y| {
                if let Some(this) = weak.upgrade() {
                    let p = this.to_physical(x, y);
                    let command = this.controller.borrow_mut().pointer_down(p);
                    this.dispatch(command);
                }
            }
        });

        drag.connect_drag_update({
            let weak = Rc::downgrade(self);
            move |gesture, offset_x, offset_y| {
                let (Some(this), Some((x, y))) = (weak.upgrade(), gesture.start_point()) else {
                    return;
                };
                let p = this.to_physical(x + offset_x, y + offset_y);
                let command = this.controller.borrow_mut().pointer_move(p);
                this.dispatch(command);
            }
        });

        drag.connect_drag_end({
            let weak = Rc::downgrade(self);
            move |gesture, offset_x, offset_y| {
                let (Some(this), Some((x, y))) = (weak.upgrade(), gesture.start_point()) else {
                    return;
                };
                let p = this.to_physical(x + offset_x, y + offset_y);
                let command = this.controller.borrow_mut().pointer_up(p);
                this.dispatch(command);
            }
        });

        self.drawing_area.add_controller(drag);

        let click = GestureClick::new();
        click.set_button(1);
        click.connect_pressed({
            let weak = Rc::downgrade(self);
            move |_, n_press, x, y| {
                if n_press != 2 {
                    return;
                }
                if let Some(this) = weak.upgrade() {
                    let p = this.to_physical(x, y);
                    let command = this.controller.borrow_mut().double_click(p);
                    this.dispatch(command);
                }
            }
        });
        self.drawing_area.add_controller(click);

        let motion = gtk::EventControllerMotion::new();
        motion.connect_motion({
            let weak = Rc::downgrade(self);
            move |_, x, y| {
                let Some(this) = weak.upgrade() else {
                    return;
                };
                let p = this.to_physical(x, y);
                let cursor = {
                    let controller = this.controller.borrow();
                    let handle = controller.selection_machine().handle_at(p);
                    let inside = controller
                        .committed_selection()
                        .is_some_and(|sel| sel.contains(p));
                    if handle != HandleType::None && controller.editor().active_tool().is_none() {
                        handle.cursor_name()
                    } else if inside && controller.editor().active_tool().is_none() {
                        "move"
                    } else {
                        "crosshair"
                    }
                };
                this.drawing_area.set_cursor_from_name(Some(cursor));
            }
        });
        self.drawing_area.add_controller(motion);
    }

    fn connect_key_handler(self: &Rc<Self>) {
        let keys = gtk::EventControllerKey::new();
        keys.connect_key_pressed({
            let weak = Rc::downgrade(self);
            move |_, key, _, modifiers| {
                let Some(this) = weak.upgrade() else {
                    return glib::Propagation::Proceed;
                };
                if this.text_popover.is_open() {
                    return glib::Propagation::Proceed;
                }
                match this.shortcuts.get_action(key, modifiers) {
                    Some(action) => {
                        debug!("Display {} shortcut: {:?}", this.display_index, action);
                        this.perform(action);
                        glib::Propagation::Stop
                    }
                    None => glib::Propagation::Proceed,
                }
            }
        });
        self.window.add_controller(keys);
    }

    fn connect_toolbar(self: &Rc<Self>) {
        let on_action = {
            let weak = Rc::downgrade(self);
            move |action| {
                if let Some(this) = weak.upgrade() {
                    this.perform(action);
                }
            }
        };
        let active_tool = {
            let weak = Rc::downgrade(self);
            move || {
                let this = weak.upgrade()?;
                let tool = this.controller.borrow().editor().active_tool();
                tool
            }
        };
        let on_color = {
            let weak = Rc::downgrade(self);
            move |color| {
                if let Some(this) = weak.upgrade() {
                    this.controller.borrow_mut().editor_mut().set_color(color);
                }
            }
        };
        self.toolbar.connect(on_action, active_tool, on_color);
    }

    fn connect_text_popover(self: &Rc<Self>) {
        let on_commit = {
            let weak = Rc::downgrade(self);
            move |text: String| {
                if let Some(this) = weak.upgrade() {
                    let command = this.controller.borrow_mut().commit_text(&text);
                    this.dispatch(command);
                }
            }
        };
        let on_cancel = {
            let weak = Rc::downgrade(self);
            move || {
                if let Some(this) = weak.upgrade() {
                    let command = this.controller.borrow_mut().cancel_text();
                    this.dispatch(command);
                }
            }
        };
        self.text_popover.connect(on_commit, on_cancel);
    }

    fn connect_lifecycle(self: &Rc<Self>, ready: ReadySignal) {
        let index = self.display_index;
        self.window.connect_map(move |_| ready.signal(index));

        self.window.connect_close_request({
            let ctx = self.ctx.clone();
            move |_| {
                debug!("Overlay {} close requested", index);
                if let Some(ctx) = ctx.upgrade() {
                    glib::idle_add_local_once(move || ctx.cancel());
                }
                glib::Propagation::Stop
            }
        });
    }
}
