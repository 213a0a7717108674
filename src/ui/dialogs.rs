use gtk4 as gtk;

use gtk::{gio, Orientation};
use gtk4::prelude::*;
use std::path::PathBuf;

use crate::output::sinks::LocalFuture;
use crate::output::{FileSaveDialog, OutputError};

pub struct TextPopoverComponents {
    pub text_popover: gtk::Popover,
    pub text_entry: gtk::Entry,
    pub text_confirm_btn: gtk::Button,
    pub text_cancel_btn: gtk::Button,
}

pub fn create_text_popover(drawing_area: &gtk::DrawingArea) -> TextPopoverComponents {
    let text_entry = gtk::Entry::builder()
        .placeholder_text("Enter text...")
        .width_chars(20)
        .build();

    let text_confirm_btn = gtk::Button::builder()
        .icon_name("object-select-symbolic")
        .tooltip_text("Add Text")
        .build();
    text_confirm_btn.add_css_class("suggested-action");

    let text_cancel_btn = gtk::Button::builder()
        .icon_name("process-stop-symbolic")
        .tooltip_text("Cancel")
        .build();

    let text_input_box = gtk::Box::builder()
        .orientation(Orientation::Horizontal)
        .spacing(6)
        .margin_top(6)
        .margin_bottom(6)
        .margin_start(6)
        .margin_end(6)
        .build();
    text_input_box.append(&text_entry);
    text_input_box.append(&text_confirm_btn);
    text_input_box.append(&text_cancel_btn);

    let text_popover = gtk::Popover::builder()
        .child(&text_input_box)
        .autohide(false)
        .build();
    text_popover.set_parent(drawing_area);

    TextPopoverComponents {
        text_popover,
        text_entry,
        text_confirm_btn,
        text_cancel_btn,
    }
}

impl TextPopoverComponents {
    /// Opens the popover at a point in widget coordinates.
    pub fn show_at(&self, x: f64, y: f64) {
        self.text_entry.set_text("");
        let rect = gtk::gdk::Rectangle::new(x as i32, y as i32, 1, 1);
        self.text_popover.set_pointing_to(Some(&rect));
        self.text_popover.popup();
        self.text_entry.grab_focus();
    }

    pub fn is_open(&self) -> bool {
        self.text_popover.is_visible()
    }

    /// Calls `on_commit` with the entered text or `on_cancel`, then closes.
    pub fn connect(
        &self,
        on_commit: impl Fn(String) + Clone + 'static,
        on_cancel: impl Fn() + 'static,
    ) {
        self.text_confirm_btn.connect_clicked({
            let text_popover = self.text_popover.clone();
            let text_entry = self.text_entry.clone();
            let on_commit = on_commit.clone();
            move |_| {
                let text = text_entry.text().to_string();
                text_popover.popdown();
                on_commit(text);
            }
        });

        self.text_entry.connect_activate({
            let text_popover = self.text_popover.clone();
            move |entry| {
                let text = entry.text().to_string();
                text_popover.popdown();
                on_commit(text);
            }
        });

        self.text_cancel_btn.connect_clicked({
            let text_popover = self.text_popover.clone();
            move |_| {
                text_popover.popdown();
                on_cancel();
            }
        });
    }
}

/// Save prompt backed by `gtk::FileDialog`.
pub struct GtkSaveDialog {
    parent: gtk::Window,
    folder: PathBuf,
}

impl GtkSaveDialog {
    pub fn new(parent: &impl IsA<gtk::Window>, folder: PathBuf) -> Self {
        Self {
            parent: parent.clone().upcast(),
            folder,
        }
    }
}

impl FileSaveDialog for GtkSaveDialog {
    fn prompt(
        &self,
        default_name: &str,
        extensions: &[&str],
    ) -> LocalFuture<Result<Option<PathBuf>, OutputError>> {
        let filter = gtk::FileFilter::new();
        filter.set_name(Some("Images"));
        for extension in extensions {
            filter.add_suffix(extension);
        }
        let filters = gio::ListStore::new::<gtk::FileFilter>();
        filters.append(&filter);

        let dialog = gtk::FileDialog::builder()
            .title("Save Screenshot")
            .modal(true)
            .initial_name(default_name)
            .initial_folder(&gio::File::for_path(&self.folder))
            .filters(&filters)
            .default_filter(&filter)
            .build();
        let parent = self.parent.clone();

        Box::pin(async move {
            match dialog.save_future(Some(&parent)).await {
                Ok(file) => Ok(file.path()),
                Err(e) if e.matches(gtk::DialogError::Dismissed) => Ok(None),
                Err(e) => Err(OutputError::Dialog(e.to_string())),
            }
        })
    }
}

/// Removes the popover from its parent before the parent goes away.
pub fn detach_text_popover(components: &TextPopoverComponents) {
    components.text_popover.popdown();
    components.text_popover.unparent();
}
