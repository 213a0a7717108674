use gtk4 as gtk;

use gtk::{Align, Orientation};
use gtk4::prelude::*;

use crate::app::{Action, ShortcutConfig};
use crate::editor::{Color, Tool};

pub struct ToolbarComponents {
    pub tools_box: gtk::Box,
    pub tool_buttons: Vec<(Tool, gtk::ToggleButton)>,
    pub color_button: gtk::ColorDialogButton,
    pub undo_btn: gtk::Button,
    pub redo_btn: gtk::Button,
    pub copy_btn: gtk::Button,
    pub save_btn: gtk::Button,
    pub pin_btn: gtk::Button,
    pub cancel_btn: gtk::Button,
}

fn action_button(icon: &str, action: Action, shortcuts: &ShortcutConfig) -> gtk::Button {
    let button = gtk::Button::builder()
        .icon_name(icon)
        .tooltip_text(shortcuts.tooltip(action))
        .build();
    button.add_css_class("flat");
    button
}

pub fn create_toolbar(shortcuts: &ShortcutConfig, color: Color) -> ToolbarComponents {
    let (r, g, b, a) = color.to_cairo();
    let color_button = gtk::ColorDialogButton::builder()
        .dialog(&gtk::ColorDialog::new())
        .rgba(&gtk::gdk::RGBA::new(r as f32, g as f32, b as f32, a as f32))
        .tooltip_text("Select Color")
        .build();

    let tool_buttons_box = gtk::Box::builder()
        .orientation(Orientation::Horizontal)
        .spacing(6)
        .homogeneous(true)
        .build();
    tool_buttons_box.add_css_class("tool-buttons");

    let tool_buttons: Vec<(Tool, gtk::ToggleButton)> = Tool::all()
        .iter()
        .map(|&tool| {
            let button = gtk::ToggleButton::builder()
                .icon_name(tool.icon_name())
                .tooltip_text(shortcuts.tooltip(Action::Tool(tool)))
                .build();
            button.add_css_class("flat");
            tool_buttons_box.append(&button);
            (tool, button)
        })
        .collect();
    tool_buttons_box.append(&color_button);

    let undo_btn = action_button("edit-undo-symbolic", Action::Undo, shortcuts);
    let redo_btn = action_button("edit-redo-symbolic", Action::Redo, shortcuts);
    let copy_btn = action_button("edit-copy-symbolic", Action::Copy, shortcuts);
    let pin_btn = action_button("view-pin-symbolic", Action::Pin, shortcuts);

    let save_btn = gtk::Button::builder()
        .icon_name("document-save-symbolic")
        .tooltip_text(shortcuts.tooltip(Action::Save))
        .build();
    save_btn.add_css_class("suggested-action");

    let cancel_btn = gtk::Button::builder()
        .icon_name("process-stop-symbolic")
        .tooltip_text(shortcuts.tooltip(Action::Cancel))
        .build();
    cancel_btn.add_css_class("destructive-action");

    let tools_box = gtk::Box::builder()
        .orientation(Orientation::Horizontal)
        .spacing(6)
        .halign(Align::Center)
        .valign(Align::End)
        .margin_bottom(24)
        .visible(false)
        .build();
    tools_box.add_css_class("osd");
    tools_box.add_css_class("toolbar");

    tools_box.append(&tool_buttons_box);
    tools_box.append(&gtk::Separator::new(Orientation::Vertical));
    tools_box.append(&undo_btn);
    tools_box.append(&redo_btn);
    tools_box.append(&gtk::Separator::new(Orientation::Vertical));
    tools_box.append(&cancel_btn);
    tools_box.append(&pin_btn);
    tools_box.append(&copy_btn);
    tools_box.append(&save_btn);

    ToolbarComponents {
        tools_box,
        tool_buttons,
        color_button,
        undo_btn,
        redo_btn,
        copy_btn,
        save_btn,
        pin_btn,
        cancel_btn,
    }
}

impl ToolbarComponents {
    /// Routes every button to `on_action`. Tool buttons only fire when their
    /// state disagrees with `active_tool`, so syncing them is silent.
    pub fn connect(
        &self,
        on_action: impl Fn(Action) + Clone + 'static,
        active_tool: impl Fn() -> Option<Tool> + Clone + 'static,
        on_color: impl Fn(Color) + 'static,
    ) {
        for (tool, button) in &self.tool_buttons {
            let tool = *tool;
            button.connect_toggled({
                let on_action = on_action.clone();
                let active_tool = active_tool.clone();
                move |btn| {
                    if btn.is_active() != (active_tool() == Some(tool)) {
                        on_action(Action::Tool(tool));
                    }
                }
            });
        }

        for (button, action) in [
            (&self.undo_btn, Action::Undo),
            (&self.redo_btn, Action::Redo),
            (&self.copy_btn, Action::Copy),
            (&self.save_btn, Action::Save),
            (&self.pin_btn, Action::Pin),
            (&self.cancel_btn, Action::Cancel),
        ] {
            let on_action = on_action.clone();
            button.connect_clicked(move |_| on_action(action));
        }

        self.color_button.connect_rgba_notify(move |btn| {
            let rgba = btn.rgba();
            on_color(Color::from_unit(rgba.red(), rgba.green(), rgba.blue(), rgba.alpha()));
        });
    }

    pub fn sync(&self, visible: bool, active_tool: Option<Tool>, can_undo: bool, can_redo: bool) {
        self.tools_box.set_visible(visible);
        for (tool, button) in &self.tool_buttons {
            button.set_active(active_tool == Some(*tool));
        }
        self.undo_btn.set_sensitive(can_undo);
        self.redo_btn.set_sensitive(can_redo);
    }
}
