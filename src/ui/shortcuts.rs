use adw::prelude::*;
use gtk4 as gtk;
use libadwaita as adw;

use crate::app::{Action, ShortcutConfig};
use crate::editor::Tool;

pub fn show_shortcuts_dialog(shortcuts: &ShortcutConfig, parent: &impl IsA<gtk::Window>) {
    let window = adw::PreferencesWindow::builder()
        .transient_for(parent)
        .modal(true)
        .title("Keyboard Shortcuts")
        .default_width(500)
        .default_height(600)
        .search_enabled(false)
        .build();

    let page = adw::PreferencesPage::new();
    window.add(&page);

    let group_output = adw::PreferencesGroup::builder().title("Output").build();
    for action in [Action::Confirm, Action::Copy, Action::Save, Action::Pin, Action::Cancel] {
        add_action_row(shortcuts, &group_output, action);
    }
    page.add(&group_output);

    let group_edit = adw::PreferencesGroup::builder().title("Editing").build();
    for action in [Action::Undo, Action::Redo, Action::ClearAnnotations] {
        add_action_row(shortcuts, &group_edit, action);
    }
    page.add(&group_edit);

    let group_tools = adw::PreferencesGroup::builder().title("Tools").build();
    for tool in Tool::all() {
        add_action_row(shortcuts, &group_tools, Action::Tool(*tool));
    }
    page.add(&group_tools);

    window.present();
}

fn add_action_row(shortcuts: &ShortcutConfig, group: &adw::PreferencesGroup, action: Action) {
    let shortcut_label = shortcuts.get_shortcut_label(action);

    let row = adw::ActionRow::builder().title(action.label()).build();

    let accel = gtk::Label::builder()
        .label(&shortcut_label)
        .valign(gtk::Align::Center)
        .build();
    accel.add_css_class("monospace");

    if shortcut_label.is_empty() {
        accel.set_label("Disabled");
        accel.add_css_class("dim-label");
    }

    row.add_suffix(&accel);
    group.add(&row);
}
