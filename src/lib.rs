//! Multi-display screenshot capture with region selection and annotation.
//!
//! Every display is frozen at once and shown in its own overlay window. The
//! user drags a selection on any display, annotates it, and the result goes
//! to the clipboard, a file or a pinned window.

pub mod app;
pub mod capture;
pub mod commands;
pub mod editor;
pub mod geometry;
pub mod output;
pub mod selection;
pub mod session;
pub mod ui;
