//! Session detection used to pick a frame grabber once at startup.

use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayServer {
    Wayland,
    X11,
    Unknown,
}

impl std::fmt::Display for DisplayServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayServer::Wayland => write!(f, "Wayland"),
            DisplayServer::X11 => write!(f, "X11"),
            DisplayServer::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DesktopEnvironment {
    Gnome,
    Kde,
    Hyprland,
    Sway,
    Other(Option<String>),
}

impl std::fmt::Display for DesktopEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DesktopEnvironment::Gnome => write!(f, "GNOME"),
            DesktopEnvironment::Kde => write!(f, "KDE Plasma"),
            DesktopEnvironment::Hyprland => write!(f, "Hyprland"),
            DesktopEnvironment::Sway => write!(f, "Sway"),
            DesktopEnvironment::Other(Some(name)) => write!(f, "{}", name),
            DesktopEnvironment::Other(None) => write!(f, "Unknown"),
        }
    }
}

/// Which grabber implementation serves per-display captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureBackend {
    /// `grim -o <output>` on wlroots compositors, falling back to xcap.
    Grim,
    Xcap,
}

impl std::fmt::Display for CaptureBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureBackend::Grim => write!(f, "grim (wlroots)"),
            CaptureBackend::Xcap => write!(f, "xcap"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DesktopSession {
    pub display_server: DisplayServer,
    pub desktop_environment: DesktopEnvironment,
}

impl DesktopSession {
    pub fn detect() -> Self {
        let display_server = detect_display_server();
        let desktop_environment = detect_desktop_environment();

        Self {
            display_server,
            desktop_environment,
        }
    }

    pub fn capture_backend(&self) -> CaptureBackend {
        match (&self.desktop_environment, &self.display_server) {
            (DesktopEnvironment::Hyprland, DisplayServer::Wayland)
            | (DesktopEnvironment::Sway, DisplayServer::Wayland) => CaptureBackend::Grim,
            _ => CaptureBackend::Xcap,
        }
    }
}

impl std::fmt::Display for DesktopSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} on {}", self.desktop_environment, self.display_server)
    }
}

fn detect_display_server() -> DisplayServer {
    if let Ok(session_type) = env::var("XDG_SESSION_TYPE") {
        match session_type.to_lowercase().as_str() {
            "wayland" => return DisplayServer::Wayland,
            "x11" => return DisplayServer::X11,
            _ => {}
        }
    }

    if env::var("WAYLAND_DISPLAY").is_ok() {
        return DisplayServer::Wayland;
    }

    if env::var("DISPLAY").is_ok() {
        return DisplayServer::X11;
    }

    DisplayServer::Unknown
}

fn detect_desktop_environment() -> DesktopEnvironment {
    if env::var("HYPRLAND_INSTANCE_SIGNATURE").is_ok() {
        return DesktopEnvironment::Hyprland;
    }

    if env::var("SWAYSOCK").is_ok() {
        return DesktopEnvironment::Sway;
    }

    match env::var("XDG_CURRENT_DESKTOP") {
        Ok(current_desktop) => parse_current_desktop(&current_desktop),
        Err(_) => DesktopEnvironment::Other(None),
    }
}

/// Parses `XDG_CURRENT_DESKTOP`, a colon separated list such as `ubuntu:GNOME`.
fn parse_current_desktop(value: &str) -> DesktopEnvironment {
    let lower = value.to_lowercase();

    for component in lower.split(':') {
        match component.trim() {
            "gnome" | "unity" | "ubuntu" | "pop" => return DesktopEnvironment::Gnome,
            "kde" | "plasma" | "kde-plasma" => return DesktopEnvironment::Kde,
            "hyprland" => return DesktopEnvironment::Hyprland,
            "sway" => return DesktopEnvironment::Sway,
            _ => continue,
        }
    }

    if value.is_empty() {
        DesktopEnvironment::Other(None)
    } else {
        DesktopEnvironment::Other(Some(value.to_string()))
    }
}
