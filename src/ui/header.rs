use gtk4 as gtk;
use libadwaita as adw;

use adw::prelude::*;
use gtk::{gio, Orientation};

use crate::app::settings::MAX_CAPTURE_DELAY_SECS;
use crate::app::AppState;
use crate::output::OutputTarget;

/// Stateful app action holding the default output's name.
pub const DEFAULT_OUTPUT_ACTION: &str = "default-output";

pub struct HeaderComponents {
    pub header_bar: adw::HeaderBar,
    pub capture_btn: adw::SplitButton,
    pub delay_spin: gtk::SpinButton,
}

pub fn create_header_bar(state: &AppState) -> HeaderComponents {
    let output_menu = gio::Menu::new();
    for target in OutputTarget::ALL {
        output_menu.append(
            Some(target.label()),
            Some(&format!("app.{}::{}", DEFAULT_OUTPUT_ACTION, target)),
        );
    }

    let capture_btn = adw::SplitButton::builder()
        .label("Capture All Displays")
        .tooltip_text("Freeze every display and select a region")
        .dropdown_tooltip("Enter / Double-Click Output")
        .menu_model(&output_menu)
        .build();
    capture_btn.add_css_class("suggested-action");

    let delay_spin = gtk::SpinButton::with_range(0.0, MAX_CAPTURE_DELAY_SECS as f64, 1.0);
    delay_spin.set_value(state.delay_seconds as f64);
    delay_spin.set_tooltip_text(Some("Seconds to wait before capturing"));

    let delay_box = gtk::Box::builder()
        .orientation(Orientation::Horizontal)
        .spacing(6)
        .build();
    let delay_icon = gtk::Image::from_icon_name("alarm-symbolic");
    delay_icon.add_css_class("dim-label");
    delay_box.append(&delay_icon);
    delay_box.append(&delay_spin);

    let app_menu = gio::Menu::new();
    app_menu.append(Some("Preferences"), Some("app.preferences"));
    app_menu.append(Some("Keyboard Shortcuts"), Some("app.shortcuts"));
    app_menu.append(Some("Quit"), Some("app.quit"));

    let header_bar = adw::HeaderBar::builder()
        .title_widget(&adw::WindowTitle::new("Multishot", "Every display at once"))
        .build();
    header_bar.pack_start(&capture_btn);
    header_bar.pack_end(
        &gtk::MenuButton::builder()
            .icon_name("open-menu-symbolic")
            .menu_model(&app_menu)
            .build(),
    );
    header_bar.pack_end(&delay_box);

    HeaderComponents {
        header_bar,
        capture_btn,
        delay_spin,
    }
}
