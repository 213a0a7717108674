//! Settings editor. Every change is saved immediately.

use adw::prelude::*;
use gtk4 as gtk;
use libadwaita as adw;

use std::rc::Rc;

use super::handlers::CaptureContext;
use crate::app::settings::MAX_CAPTURE_DELAY_SECS;
use crate::output::OutputTarget;

fn spin_row(title: &str, min: f64, max: f64, step: f64, value: f64) -> adw::SpinRow {
    let row = adw::SpinRow::with_range(min, max, step);
    row.set_title(title);
    row.set_value(value);
    row
}

pub fn show_preferences(ctx: &Rc<CaptureContext>, parent: &impl IsA<gtk::Window>) {
    let settings = ctx.state.borrow().settings.clone();

    let window = adw::PreferencesWindow::builder()
        .transient_for(parent)
        .modal(true)
        .title("Preferences")
        .default_width(500)
        .default_height(600)
        .build();

    let page = adw::PreferencesPage::new();
    window.add(&page);

    let group_capture = adw::PreferencesGroup::builder().title("Capture").build();

    let output_row = adw::ComboRow::builder()
        .title("Enter / Double-Click")
        .model(&gtk::StringList::new(&OutputTarget::ALL.map(|t| t.label())))
        .build();
    let selected = OutputTarget::ALL
        .iter()
        .position(|target| *target == settings.default_output)
        .unwrap_or(0);
    output_row.set_selected(selected as u32);
    output_row.connect_selected_notify({
        let ctx = ctx.clone();
        move |row| {
            if let Some(target) = OutputTarget::ALL.get(row.selected() as usize) {
                ctx.update_settings(|s| s.default_output = *target);
            }
        }
    });
    group_capture.add(&output_row);

    let delay_row = spin_row(
        "Default Delay (seconds)",
        0.0,
        MAX_CAPTURE_DELAY_SECS as f64,
        1.0,
        settings.capture_delay_secs as f64,
    );
    delay_row.connect_value_notify({
        let ctx = ctx.clone();
        move |row| ctx.update_settings(|s| s.capture_delay_secs = row.value() as u32)
    });
    group_capture.add(&delay_row);

    let timeout_row = spin_row(
        "Overlay Timeout (ms)",
        100.0,
        30_000.0,
        100.0,
        settings.ready_timeout_ms as f64,
    );
    timeout_row.connect_value_notify({
        let ctx = ctx.clone();
        move |row| ctx.update_settings(|s| s.ready_timeout_ms = row.value() as u64)
    });
    group_capture.add(&timeout_row);
    page.add(&group_capture);

    let group_annotations = adw::PreferencesGroup::builder().title("Annotations").build();

    let stroke_row = spin_row("Stroke Width", 1.0, 50.0, 1.0, settings.stroke_width);
    stroke_row.connect_value_notify({
        let ctx = ctx.clone();
        move |row| ctx.update_settings(|s| s.stroke_width = row.value())
    });
    group_annotations.add(&stroke_row);

    let font_row = spin_row("Font Size", 8.0, 200.0, 1.0, settings.font_size);
    font_row.connect_value_notify({
        let ctx = ctx.clone();
        move |row| ctx.update_settings(|s| s.font_size = row.value())
    });
    group_annotations.add(&font_row);

    let mosaic_row = spin_row(
        "Mosaic Block Size",
        2.0,
        128.0,
        1.0,
        settings.mosaic_block_size as f64,
    );
    mosaic_row.connect_value_notify({
        let ctx = ctx.clone();
        move |row| ctx.update_settings(|s| s.mosaic_block_size = row.value() as u32)
    });
    group_annotations.add(&mosaic_row);

    let blur_row = spin_row("Blur Radius", 1.0, 64.0, 1.0, settings.blur_radius as f64);
    blur_row.connect_value_notify({
        let ctx = ctx.clone();
        move |row| ctx.update_settings(|s| s.blur_radius = row.value() as f32)
    });
    group_annotations.add(&blur_row);
    page.add(&group_annotations);

    window.present();
}
