use gtk4 as gtk;

use gtk::gdk::{self, Texture};
use gtk::glib;
use gtk4::prelude::*;

use crate::output::{ClipboardSink, OutputError};

/// The display's regular clipboard.
pub struct GdkClipboard {
    clipboard: gdk::Clipboard,
}

impl GdkClipboard {
    pub fn from_widget(widget: &impl IsA<gtk::Widget>) -> Self {
        Self {
            clipboard: widget.display().clipboard(),
        }
    }
}

impl ClipboardSink for GdkClipboard {
    fn set_image(&self, png: &[u8]) -> Result<(), OutputError> {
        let texture = Texture::from_bytes(&glib::Bytes::from(png))
            .map_err(|e| OutputError::Clipboard(e.to_string()))?;
        self.clipboard.set_texture(&texture);
        Ok(())
    }
}
