use gtk::gdk;
use gtk4 as gtk;
use std::collections::HashMap;

use crate::editor::Tool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Copy,
    Save,
    Pin,
    Undo,
    Redo,
    ClearAnnotations,
    Cancel,
    Confirm,
    Tool(Tool),
}

impl Action {
    pub fn label(&self) -> String {
        match self {
            Action::Copy => "Copy to Clipboard".to_string(),
            Action::Save => "Save to File".to_string(),
            Action::Pin => "Pin to Screen".to_string(),
            Action::Undo => "Undo".to_string(),
            Action::Redo => "Redo".to_string(),
            Action::ClearAnnotations => "Clear Annotations".to_string(),
            Action::Cancel => "Cancel / Exit".to_string(),
            Action::Confirm => "Confirm Selection".to_string(),
            Action::Tool(tool) => format!("Select {} Tool", tool.tooltip()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: gdk::Key,
    pub modifiers: gdk::ModifierType,
}

impl Shortcut {
    fn new(key: gdk::Key, modifiers: gdk::ModifierType) -> Self {
        Self { key, modifiers }
    }

    fn plain(key: gdk::Key) -> Self {
        Self::new(key, gdk::ModifierType::empty())
    }

    fn ctrl(key: gdk::Key) -> Self {
        Self::new(key, gdk::ModifierType::CONTROL_MASK)
    }
}

#[derive(Debug, Clone)]
pub struct ShortcutConfig {
    bindings: HashMap<Action, Shortcut>,
}

impl Default for ShortcutConfig {
    fn default() -> Self {
        let mut bindings = HashMap::new();

        // Output
        bindings.insert(Action::Copy, Shortcut::ctrl(gdk::Key::c));
        bindings.insert(Action::Save, Shortcut::ctrl(gdk::Key::s));
        bindings.insert(Action::Pin, Shortcut::ctrl(gdk::Key::p));
        bindings.insert(Action::Confirm, Shortcut::plain(gdk::Key::Return));
        bindings.insert(Action::Cancel, Shortcut::plain(gdk::Key::Escape));

        // History
        bindings.insert(Action::Undo, Shortcut::ctrl(gdk::Key::z));
        bindings.insert(Action::Redo, Shortcut::ctrl(gdk::Key::y));
        bindings.insert(Action::ClearAnnotations, Shortcut::plain(gdk::Key::Delete));

        // Tools
        bindings.insert(Action::Tool(Tool::Rectangle), Shortcut::plain(gdk::Key::r));
        bindings.insert(Action::Tool(Tool::Ellipse), Shortcut::plain(gdk::Key::e));
        bindings.insert(Action::Tool(Tool::Arrow), Shortcut::plain(gdk::Key::a));
        bindings.insert(Action::Tool(Tool::Brush), Shortcut::plain(gdk::Key::b));
        bindings.insert(Action::Tool(Tool::Text), Shortcut::plain(gdk::Key::t));
        bindings.insert(Action::Tool(Tool::Mosaic), Shortcut::plain(gdk::Key::m));
        bindings.insert(Action::Tool(Tool::Blur), Shortcut::plain(gdk::Key::u));

        Self { bindings }
    }
}

impl ShortcutConfig {
    pub fn get_action(&self, key: gdk::Key, modifiers: gdk::ModifierType) -> Option<Action> {
        // Filter out irrelevant modifiers like NumLock/CapsLock/ScrollLock
        let mask = gdk::ModifierType::CONTROL_MASK
            | gdk::ModifierType::SHIFT_MASK
            | gdk::ModifierType::ALT_MASK
            | gdk::ModifierType::SUPER_MASK
            | gdk::ModifierType::META_MASK;

        let clean_mods = modifiers & mask;
        let key = key.to_lower();

        for (action, shortcut) in &self.bindings {
            if shortcut.key == key && shortcut.modifiers == clean_mods {
                return Some(*action);
            }

            // Handle Keypad Enter as alias for Return
            if *action == Action::Confirm
                && key == gdk::Key::KP_Enter
                && shortcut.key == gdk::Key::Return
                && shortcut.modifiers == clean_mods
            {
                return Some(*action);
            }
        }
        None
    }

    pub fn get_shortcut_label(&self, action: Action) -> String {
        if let Some(sc) = self.bindings.get(&action) {
            return gtk::accelerator_get_label(sc.key, sc.modifiers).to_string();
        }
        String::new()
    }

    /// Tooltip text: the action label followed by its accelerator.
    pub fn tooltip(&self, action: Action) -> String {
        let label = self.get_shortcut_label(action);
        if label.is_empty() {
            action.label()
        } else {
            format!("{} ({})", action.label(), label)
        }
    }
}
