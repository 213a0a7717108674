//! GTK front end: the host window and everything a capture session shows.

pub mod clipboard;
pub mod dialogs;
pub mod drawing;
pub mod handlers;
pub mod header;
pub mod host;
pub mod overlay;
pub mod pin;
pub mod preferences;
pub mod shortcuts;
pub mod toolbar;

use gtk4 as gtk;
use libadwaita as adw;

use adw::prelude::*;
use gtk::{gio, glib, Orientation};
use std::rc::Rc;

use crate::app::Settings;
use crate::output::OutputTarget;
use handlers::CaptureContext;

pub fn build_ui(app: &adw::Application) {
    let settings = Settings::load();

    let toasts = adw::ToastOverlay::new();
    let status = adw::StatusPage::builder()
        .icon_name("camera-photo-symbolic")
        .title("Multishot")
        .description(
            "Freeze every display, select a region on any of them, annotate it \
             and copy, save or pin the result.",
        )
        .vexpand(true)
        .build();
    toasts.set_child(Some(&status));

    let content = gtk::Box::builder()
        .orientation(Orientation::Vertical)
        .build();

    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("Multishot")
        .content(&content)
        .default_width(640)
        .default_height(420)
        .build();

    let ctx = CaptureContext::new(app, &window, &toasts, settings);

    let header = header::create_header_bar(&ctx.state.borrow());
    content.append(&header.header_bar);
    content.append(&toasts);

    handlers::connect_header_handlers(&ctx, &header);
    register_app_actions(app, &ctx);

    window.present();
}

fn register_app_actions(app: &adw::Application, ctx: &Rc<CaptureContext>) {
    let preferences = gio::SimpleAction::new("preferences", None);
    preferences.connect_activate({
        let ctx = ctx.clone();
        move |_, _| preferences::show_preferences(&ctx, &ctx.window)
    });
    app.add_action(&preferences);

    let shortcuts = gio::SimpleAction::new("shortcuts", None);
    shortcuts.connect_activate({
        let ctx = ctx.clone();
        move |_, _| {
            let config = ctx.state.borrow().shortcuts.clone();
            shortcuts::show_shortcuts_dialog(&config, &ctx.window);
        }
    });
    app.add_action(&shortcuts);

    let default_output = gio::SimpleAction::new_stateful(
        header::DEFAULT_OUTPUT_ACTION,
        Some(glib::VariantTy::STRING),
        &ctx.state.borrow().settings.default_output.to_string().to_variant(),
    );
    default_output.connect_change_state({
        let ctx = ctx.clone();
        move |_, value| {
            let target = value
                .and_then(|v| v.get::<String>())
                .and_then(|name| OutputTarget::from_name(&name));
            if let Some(target) = target {
                ctx.update_settings(|s| s.default_output = target);
            }
        }
    });
    app.add_action(&default_output);

    let quit = gio::SimpleAction::new("quit", None);
    quit.connect_activate({
        let ctx = ctx.clone();
        let app = app.clone();
        move |_, _| {
            ctx.cancel();
            app.quit();
        }
    });
    app.add_action(&quit);
    app.set_accels_for_action("app.quit", &["<Control>q"]);

    let capture = gio::SimpleAction::new("capture", None);
    capture.connect_activate({
        let ctx = ctx.clone();
        move |_, _| ctx.start_capture()
    });
    app.add_action(&capture);
    app.set_accels_for_action("app.capture", &["<Control>n"]);
}
