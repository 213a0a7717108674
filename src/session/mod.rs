//! One capture session: frozen frames of every display, one overlay window
//! per display, and the events that keep those overlays in step.

pub mod focus;
pub mod orchestrator;
pub mod overlay;
pub mod ready;

pub use focus::FocusFollower;
pub use orchestrator::{OrchestratorConfig, Orchestrator, OverlayHost};
pub use overlay::{OverlayCommand, OverlayController};
pub use ready::{ReadinessGate, ReadyOutcome, ReadySignal};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

use crate::capture::{CaptureError, CaptureResult, DisplayInfo};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("failed to open overlay for display {index}: {reason}")]
    Window { index: usize, reason: String },

    #[error("no overlay window could be opened")]
    NoOverlays,

    #[error("no overlay window for display {0}")]
    UnknownDisplay(usize),

    #[error("operation not valid while {0:?}")]
    InvalidPhase(SessionPhase),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("capture-{}-{}", millis, n))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    pub displays: Vec<DisplayInfo>,
    pub results: BTreeMap<usize, Arc<CaptureResult>>,
    pub created_at: SystemTime,
}

impl Session {
    pub fn new(displays: Vec<DisplayInfo>, results: BTreeMap<usize, Arc<CaptureResult>>) -> Self {
        Self {
            id: SessionId::generate(),
            displays,
            results,
            created_at: SystemTime::now(),
        }
    }

    /// Displays that produced a frame, in index order.
    pub fn captured_displays(&self) -> impl Iterator<Item = &DisplayInfo> {
        self.displays
            .iter()
            .filter(|d| self.results.contains_key(&d.index))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Capturing,
    AwaitingReady,
    Active,
    Closing,
}

/// Messages broadcast to every overlay of a session.
#[derive(Clone, Debug)]
pub enum SessionEvent {
    SessionStart {
        session_id: SessionId,
    },
    DisplaysInfo {
        displays: Vec<DisplayInfo>,
    },
    ImageData {
        display_index: usize,
        session_id: SessionId,
        frame: Arc<CaptureResult>,
    },
    /// An overlay began a new selection; the others drop theirs.
    SelectionStarted {
        source_display_index: usize,
    },
    SessionEnd,
    Error {
        message: String,
    },
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::SessionStart { .. } => "session-start",
            SessionEvent::DisplaysInfo { .. } => "displays-info",
            SessionEvent::ImageData { .. } => "image-data",
            SessionEvent::SelectionStarted { .. } => "selection-started",
            SessionEvent::SessionEnd => "session-end",
            SessionEvent::Error { .. } => "error",
        }
    }

    /// Event name and camelCase JSON payload; frames travel as base64 PNG.
    pub fn to_wire(&self) -> (&'static str, Value) {
        let payload = match self {
            SessionEvent::SessionStart { session_id } => {
                json!({ "sessionId": session_id.as_str() })
            }
            SessionEvent::DisplaysInfo { displays } => json!({ "displays": displays }),
            SessionEvent::ImageData {
                display_index,
                session_id,
                frame,
            } => json!({
                "displayIndex": display_index,
                "sessionId": session_id.as_str(),
                "width": frame.width,
                "height": frame.height,
                "imageData": STANDARD.encode(&frame.encoded),
            }),
            SessionEvent::SelectionStarted {
                source_display_index,
            } => json!({ "sourceDisplayIndex": source_display_index }),
            SessionEvent::SessionEnd => Value::Null,
            SessionEvent::Error { message } => json!({ "message": message }),
        };
        (self.name(), payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(SessionId::generate(), SessionId::generate());
    }

    #[test]
    fn test_image_data_wire_format() {
        let frame = Arc::new(CaptureResult::from_image(2, RgbaImage::new(3, 2)).unwrap());
        let event = SessionEvent::ImageData {
            display_index: 2,
            session_id: SessionId("capture-1-0".to_string()),
            frame: frame.clone(),
        };

        let (name, payload) = event.to_wire();
        assert_eq!(name, "image-data");
        assert_eq!(payload["displayIndex"], 2);
        assert_eq!(payload["sessionId"], "capture-1-0");

        let decoded = STANDARD
            .decode(payload["imageData"].as_str().unwrap())
            .unwrap();
        assert_eq!(decoded, frame.encoded);
    }

    #[test]
    fn test_selection_started_wire_format() {
        let (name, payload) = SessionEvent::SelectionStarted {
            source_display_index: 1,
        }
        .to_wire();
        assert_eq!(name, "selection-started");
        assert_eq!(payload, json!({ "sourceDisplayIndex": 1 }));
        assert_eq!(SessionEvent::SessionEnd.to_wire().1, Value::Null);
    }
}
