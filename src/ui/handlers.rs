//! Capture flow glue between the host window, the session orchestrator and
//! the overlay windows.

use gtk::{gio, glib};
use gtk4 as gtk;
use libadwaita as adw;
use log::{debug, error, info, warn};

use adw::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, SystemTime};

use super::clipboard::GdkClipboard;
use super::dialogs::GtkSaveDialog;
use super::header::{HeaderComponents, DEFAULT_OUTPUT_ACTION};
use super::host::GtkOverlayHost;
use super::overlay::OverlayWindow;
use super::pin::GtkPinHost;
use crate::app::{AppState, Settings};
use crate::capture::{grabber_for_session, DesktopSession, XcapDisplays};
use crate::commands;
use crate::output::{sinks, OutputError, OutputTarget};
use crate::session::{
    Orchestrator, OrchestratorConfig, OverlayCommand, ReadyOutcome, SessionPhase,
};

/// Lets the compositor repaint without the host window before capturing.
const SETTLE_DELAY: Duration = Duration::from_millis(200);
const READY_POLL_INTERVAL: Duration = Duration::from_millis(16);

pub struct CaptureContext {
    pub app: adw::Application,
    pub window: adw::ApplicationWindow,
    pub toasts: adw::ToastOverlay,
    pub state: RefCell<AppState>,
    pub orchestrator: RefCell<Orchestrator<GtkOverlayHost>>,
}

impl CaptureContext {
    pub fn new(
        app: &adw::Application,
        window: &adw::ApplicationWindow,
        toasts: &adw::ToastOverlay,
        settings: Settings,
    ) -> Rc<Self> {
        let desktop = DesktopSession::detect();
        info!("Desktop session: {:?}", desktop);
        let config = OrchestratorConfig::from(&settings);

        Rc::new_cyclic(|weak| {
            let host = GtkOverlayHost::new(app, window, weak.clone());
            let orchestrator = Orchestrator::new(
                host,
                Box::new(XcapDisplays),
                grabber_for_session(&desktop),
                config,
            );
            Self {
                app: app.clone(),
                window: window.clone(),
                toasts: toasts.clone(),
                state: RefCell::new(AppState::new(settings)),
                orchestrator: RefCell::new(orchestrator),
            }
        })
    }

    /// Stores edited settings and applies them to later sessions.
    pub fn update_settings(&self, update: impl FnOnce(&mut Settings)) {
        let settings = {
            let mut state = self.state.borrow_mut();
            update(&mut state.settings);
            state.settings = state.settings.clone().sanitized();
            state.settings.clone()
        };
        if let Ok(mut orchestrator) = self.orchestrator.try_borrow_mut() {
            orchestrator.set_config(OrchestratorConfig::from(&settings));
        }
        if let Some(action) = self
            .app
            .lookup_action(DEFAULT_OUTPUT_ACTION)
            .and_then(|a| a.downcast::<gio::SimpleAction>().ok())
        {
            action.set_state(&settings.default_output.to_string().to_variant());
        }
        if let Err(e) = settings.save() {
            warn!("Could not save settings: {}", e);
        }
    }

    pub fn show_host_error(&self, message: &str) {
        self.toasts.add_toast(adw::Toast::new(message));
    }

    pub fn start_capture(self: &Rc<Self>) {
        let delay = self.state.borrow().delay_seconds;
        self.window.set_visible(false);

        if delay > 0 {
            info!("Capturing in {} s", delay);
            let ctx = self.clone();
            glib::timeout_add_seconds_local_once(delay, move || ctx.capture_now());
        } else {
            self.capture_now();
        }
    }

    fn capture_now(self: &Rc<Self>) {
        let context = glib::MainContext::default();
        while context.pending() {
            context.iteration(false);
        }
        std::thread::sleep(SETTLE_DELAY);

        let result = match self.orchestrator.try_borrow_mut() {
            Ok(mut orchestrator) => commands::start_capture(&mut *orchestrator),
            Err(_) => {
                warn!("Capture already in progress");
                return;
            }
        };

        match result {
            Ok(session_id) => {
                info!("Session {} waiting for overlays", session_id);
                self.watch_readiness();
            }
            Err(e) => {
                error!("Capture failed: {}", e);
                self.show_host_error(&format!("Screenshot failed: {}", e));
            }
        }
    }

    fn watch_readiness(self: &Rc<Self>) {
        let weak = Rc::downgrade(self);
        glib::timeout_add_local(READY_POLL_INTERVAL, move || {
            let Some(ctx) = weak.upgrade() else {
                return glib::ControlFlow::Break;
            };
            let Ok(mut orchestrator) = ctx.orchestrator.try_borrow_mut() else {
                return glib::ControlFlow::Continue;
            };
            if orchestrator.phase() != SessionPhase::AwaitingReady {
                return glib::ControlFlow::Break;
            }
            match orchestrator.poll_ready() {
                Some(ReadyOutcome::AllReady) => {
                    debug!("All overlays ready");
                    glib::ControlFlow::Break
                }
                Some(ReadyOutcome::TimedOut { .. }) => glib::ControlFlow::Break,
                None => glib::ControlFlow::Continue,
            }
        });
    }

    fn overlay(&self, display_index: usize) -> Option<Rc<OverlayWindow>> {
        self.orchestrator.borrow().host().overlay(display_index)
    }

    /// Session-level effects of an overlay's input.
    pub fn handle_command(self: &Rc<Self>, display_index: usize, command: OverlayCommand) {
        match command {
            OverlayCommand::SelectionStarted => match self.orchestrator.try_borrow_mut() {
                Ok(mut orchestrator) => {
                    let focused = commands::focus_display_window(&mut *orchestrator, display_index);
                    if let Err(e) = focused {
                        debug!("{}", e);
                    }
                    orchestrator.selection_started(display_index);
                }
                Err(_) => warn!("Session busy; selection on display {} not relayed", display_index),
            },
            OverlayCommand::Commit(target) => self.deliver(display_index, target),
            OverlayCommand::CancelSession => {
                let ctx = self.clone();
                glib::idle_add_local_once(move || ctx.cancel());
            }
            OverlayCommand::Nothing | OverlayCommand::Redraw | OverlayCommand::RequestText(_) => {}
        }
    }

    fn deliver(self: &Rc<Self>, display_index: usize, target: OutputTarget) {
        let Some(overlay) = self.overlay(display_index) else {
            return;
        };
        let png = match overlay.render_output() {
            Ok(png) => png,
            Err(e) => {
                self.delivery_failed(&overlay, target, &e);
                return;
            }
        };
        let base64_png = commands::encode_base64_png(&png);
        info!("Delivering {} bytes to {}", png.len(), target);

        match target {
            OutputTarget::Clipboard => {
                let sink = GdkClipboard::from_widget(&overlay.window);
                match commands::copy_to_clipboard(&sink, &base64_png) {
                    Ok(()) => self.finish(),
                    Err(e) => self.delivery_failed(&overlay, target, &e),
                }
            }
            OutputTarget::Pin => {
                let Some(placement) = overlay.pin_placement() else {
                    return;
                };
                let host = GtkPinHost::new(&self.app);
                match commands::pin_image(
                    &host,
                    &base64_png,
                    placement.x,
                    placement.y,
                    placement.width,
                    placement.height,
                ) {
                    Ok(()) => self.finish(),
                    Err(e) => self.delivery_failed(&overlay, target, &e),
                }
            }
            OutputTarget::File => {
                let folder = self.state.borrow().save_folder();
                let ctx = self.clone();
                glib::spawn_future_local(async move {
                    let dialog = GtkSaveDialog::new(&overlay.window, folder);
                    let name = sinks::default_file_name(SystemTime::now());
                    match commands::save_image_with_dialog(&dialog, &base64_png, &name).await {
                        Ok(Some(path)) => {
                            ctx.state.borrow_mut().last_save_path = Some(path);
                            ctx.finish();
                        }
                        Ok(None) => debug!("Save cancelled; session stays open"),
                        Err(e) => ctx.delivery_failed(&overlay, target, &e),
                    }
                });
            }
        }
    }

    fn delivery_failed(&self, overlay: &OverlayWindow, target: OutputTarget, err: &OutputError) {
        let message = format!("Could not {}: {}", verb(target), err);
        match self.orchestrator.try_borrow_mut() {
            Ok(mut orchestrator) => orchestrator.report_error(message),
            Err(_) => {
                error!("{}", message);
                overlay.toast(&message);
            }
        }
    }

    fn finish(self: &Rc<Self>) {
        let ctx = self.clone();
        glib::idle_add_local_once(move || match ctx.orchestrator.try_borrow_mut() {
            Ok(mut orchestrator) => orchestrator.finish_capture(),
            Err(_) => warn!("Session busy; finish skipped"),
        });
    }

    /// Abandons the current session, if any.
    pub fn cancel(&self) {
        match self.orchestrator.try_borrow_mut() {
            Ok(mut orchestrator) => commands::cancel_capture(&mut *orchestrator),
            Err(_) => warn!("Session busy; cancel skipped"),
        }
    }
}

fn verb(target: OutputTarget) -> &'static str {
    match target {
        OutputTarget::Clipboard => "copy to clipboard",
        OutputTarget::File => "save file",
        OutputTarget::Pin => "pin image",
    }
}

pub fn connect_header_handlers(ctx: &Rc<CaptureContext>, header: &HeaderComponents) {
    header.capture_btn.connect_clicked({
        let ctx = ctx.clone();
        move |_| ctx.start_capture()
    });

    header.delay_spin.connect_value_changed({
        let ctx = ctx.clone();
        move |spin| {
            let mut state = ctx.state.borrow_mut();
            state.set_delay(spin.value_as_int().max(0) as u32);
            debug!("Capture delay set to {}s", state.delay_seconds);
        }
    });
}
