use gtk4 as gtk;
use libadwaita as adw;

use adw::prelude::*;
use gtk::glib;

const APP_ID: &str = "org.example.Multishot";

fn main() -> glib::ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let app = adw::Application::builder().application_id(APP_ID).build();

    app.connect_activate(multishot::ui::build_ui);
    app.run()
}
