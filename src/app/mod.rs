//! Application module
//!
//! Settings, keyboard shortcuts and state shared across capture sessions.

pub mod config;
pub mod settings;
mod state;

pub use config::{Action, ShortcutConfig};
pub use settings::Settings;
pub use state::AppState;
