//! Session lifecycle: capture, open overlays, gate on readiness, broadcast,
//! and tear everything down again.
//!
//! ```text
//! Idle -> Capturing -> AwaitingReady -> Active -> Closing -> Idle
//! ```

use log::{debug, error, info, warn};
use std::collections::BTreeMap;
use std::mem;
use std::time::Duration;

use super::{
    FocusFollower, ReadinessGate, ReadyOutcome, ReadySignal, Session, SessionError, SessionEvent,
    SessionId, SessionPhase,
};
use crate::app::Settings;
use crate::capture::{self, DisplayInfo, DisplaySource, FrameGrabber};
use crate::geometry::{self, OverlayPlacement};

/// The window-system side of a session.
///
/// Every method is invoked on the thread that owns the orchestrator.
pub trait OverlayHost {
    type Window;

    fn hide_host(&mut self);
    fn show_host(&mut self);

    /// Keeps the session in front: no idle/screensaver, no app switching.
    fn set_kiosk(&mut self, enabled: bool);

    fn create_overlay(
        &mut self,
        display: &DisplayInfo,
        placement: OverlayPlacement,
        ready: ReadySignal,
    ) -> Result<Self::Window, SessionError>;

    fn close_overlay(&mut self, display_index: usize, window: Self::Window);

    fn focus_overlay(&mut self, display_index: usize, window: &Self::Window);

    fn broadcast(&mut self, event: &SessionEvent);

    /// Starts periodic pointer polling. Must be cancellable synchronously.
    fn start_focus_tracking(&mut self, follower: FocusFollower, interval: Duration);

    fn stop_focus_tracking(&mut self);
}

#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    pub ready_timeout: Duration,
    pub focus_poll_interval: Duration,
}

impl From<&Settings> for OrchestratorConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            ready_timeout: settings.ready_timeout(),
            focus_poll_interval: settings.focus_poll_interval(),
        }
    }
}

pub struct Orchestrator<H: OverlayHost> {
    host: H,
    displays: Box<dyn DisplaySource>,
    grabber: Box<dyn FrameGrabber>,
    config: OrchestratorConfig,
    phase: SessionPhase,
    session: Option<Session>,
    windows: BTreeMap<usize, H::Window>,
    gate: Option<ReadinessGate>,
    ready_signal: Option<ReadySignal>,
    host_hidden: bool,
    kiosk: bool,
    focus_tracking: bool,
}

impl<H: OverlayHost> Orchestrator<H> {
    pub fn new(
        host: H,
        displays: Box<dyn DisplaySource>,
        grabber: Box<dyn FrameGrabber>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            host,
            displays,
            grabber,
            config,
            phase: SessionPhase::Idle,
            session: None,
            windows: BTreeMap::new(),
            gate: None,
            ready_signal: None,
            host_hidden: false,
            kiosk: false,
            focus_tracking: false,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn set_config(&mut self, config: OrchestratorConfig) {
        self.config = config;
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    /// Captures every display and opens one overlay per captured display.
    ///
    /// Any previous session is torn down first. On return the session waits
    /// for readiness; call [`await_ready`](Self::await_ready) or
    /// [`poll_ready`](Self::poll_ready) to activate it.
    pub fn start_capture(&mut self) -> Result<SessionId, SessionError> {
        if self.phase != SessionPhase::Idle || !self.windows.is_empty() {
            debug!("Closing stale session before a new capture");
            self.teardown(false);
        }

        self.phase = SessionPhase::Capturing;
        self.host.hide_host();
        self.host_hidden = true;

        let session = match self.capture() {
            Ok(session) => session,
            Err(e) => return Err(self.abort(e)),
        };
        let session_id = session.id.clone();
        info!(
            "Session {} captured {} of {} displays",
            session_id,
            session.results.len(),
            session.displays.len()
        );

        self.host.set_kiosk(true);
        self.kiosk = true;

        let captured: Vec<DisplayInfo> = session.captured_displays().cloned().collect();
        let (mut gate, signal) = ReadinessGate::new(
            captured.iter().map(|d| d.index),
            self.config.ready_timeout,
        );

        for display in &captured {
            let placement = geometry::overlay_placement(display);
            match self.host.create_overlay(display, placement, signal.clone()) {
                Ok(window) => {
                    self.windows.insert(display.index, window);
                }
                Err(e) => warn!("Display {} runs without an overlay: {}", display.index, e),
            }
        }

        if self.windows.is_empty() {
            return Err(self.abort(SessionError::NoOverlays));
        }

        let windows = &self.windows;
        gate.retain(|index| windows.contains_key(&index));

        self.session = Some(session);
        self.gate = Some(gate);
        self.ready_signal = Some(signal);
        self.phase = SessionPhase::AwaitingReady;
        Ok(session_id)
    }

    fn capture(&self) -> Result<Session, SessionError> {
        let displays = capture::list_displays(self.displays.as_ref())?;
        if let Some(bounds) = geometry::virtual_bounds(&displays) {
            debug!(
                "Virtual desktop {}x{} at ({}, {})",
                bounds.width, bounds.height, bounds.x, bounds.y
            );
        }
        let results = capture::capture_all(self.grabber.as_ref(), &displays)?;
        Ok(Session::new(displays, results))
    }

    /// An overlay's frontend can now receive frames.
    pub fn frontend_ready(&self, display_index: usize) {
        match &self.ready_signal {
            Some(signal) => signal.signal(display_index),
            None => debug!("Late readiness from display {}", display_index),
        }
    }

    /// Blocks until every overlay is ready or the timeout passes, then
    /// activates the session either way.
    pub fn await_ready(&mut self) -> Result<ReadyOutcome, SessionError> {
        let gate = match (self.phase, self.gate.as_mut()) {
            (SessionPhase::AwaitingReady, Some(gate)) => gate,
            (phase, _) => return Err(SessionError::InvalidPhase(phase)),
        };
        let outcome = gate.wait();
        self.activate(&outcome);
        Ok(outcome)
    }

    /// Non-blocking variant for main-loop callers. Activates the session and
    /// returns the outcome once the gate resolves.
    pub fn poll_ready(&mut self) -> Option<ReadyOutcome> {
        if self.phase != SessionPhase::AwaitingReady {
            return None;
        }
        let outcome = self.gate.as_mut()?.poll()?;
        self.activate(&outcome);
        Some(outcome)
    }

    fn activate(&mut self, outcome: &ReadyOutcome) {
        if let ReadyOutcome::TimedOut { ready, missing } = outcome {
            warn!(
                "Readiness timed out after {:?}: ready {:?}, missing {:?}; sending frames anyway",
                self.config.ready_timeout, ready, missing
            );
        }
        self.gate = None;
        self.ready_signal = None;

        let Some(session) = self.session.as_ref() else {
            return;
        };

        self.host.broadcast(&SessionEvent::SessionStart {
            session_id: session.id.clone(),
        });
        self.host.broadcast(&SessionEvent::DisplaysInfo {
            displays: session.displays.clone(),
        });
        for (index, frame) in &session.results {
            if !self.windows.contains_key(index) {
                continue;
            }
            self.host.broadcast(&SessionEvent::ImageData {
                display_index: *index,
                session_id: session.id.clone(),
                frame: frame.clone(),
            });
        }

        let windows = &self.windows;
        let mut overlaid = session
            .captured_displays()
            .filter(|d| windows.contains_key(&d.index));
        let first = overlaid.next();
        let focused = first
            .into_iter()
            .chain(overlaid)
            .find(|d| d.is_primary)
            .or(first)
            .map(|d| d.index);
        let follower = FocusFollower::new(session.displays.clone(), focused);

        self.host
            .start_focus_tracking(follower, self.config.focus_poll_interval);
        self.focus_tracking = true;
        self.phase = SessionPhase::Active;
        info!("Session {} active", session.id);
    }

    pub fn focus_display_window(&mut self, display_index: usize) -> Result<(), SessionError> {
        let window = self
            .windows
            .get(&display_index)
            .ok_or(SessionError::UnknownDisplay(display_index))?;
        self.host.focus_overlay(display_index, window);
        Ok(())
    }

    /// Relays a selection start to every overlay.
    pub fn selection_started(&mut self, source_display_index: usize) {
        if self.phase != SessionPhase::Active {
            return;
        }
        self.host.broadcast(&SessionEvent::SelectionStarted {
            source_display_index,
        });
    }

    pub fn report_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!("{}", message);
        if !self.windows.is_empty() {
            self.host.broadcast(&SessionEvent::Error { message });
        }
    }

    /// Abandons the session. Safe to call at any time, any number of times.
    pub fn cancel_capture(&mut self) {
        self.teardown(true);
    }

    /// Ends the session after the result was delivered.
    pub fn finish_capture(&mut self) {
        self.teardown(true);
    }

    fn abort<E: Into<SessionError>>(&mut self, err: E) -> SessionError {
        let err = err.into();
        error!("Capture failed: {}", err);
        self.teardown(true);
        err
    }

    fn teardown(&mut self, restore_host: bool) {
        let idle = self.phase == SessionPhase::Idle
            && self.session.is_none()
            && self.windows.is_empty()
            && !self.kiosk
            && !self.focus_tracking
            && !(restore_host && self.host_hidden);
        if idle {
            return;
        }

        self.phase = SessionPhase::Closing;

        if self.focus_tracking {
            self.host.stop_focus_tracking();
            self.focus_tracking = false;
        }

        if !self.windows.is_empty() {
            self.host.broadcast(&SessionEvent::SessionEnd);
        }
        for (index, window) in mem::take(&mut self.windows) {
            self.host.close_overlay(index, window);
        }

        if self.kiosk {
            self.host.set_kiosk(false);
            self.kiosk = false;
        }

        if restore_host && self.host_hidden {
            self.host.show_host();
            self.host_hidden = false;
        }

        self.gate = None;
        self.ready_signal = None;
        if let Some(session) = self.session.take() {
            debug!("Session {} closed", session.id);
        }
        self.phase = SessionPhase::Idle;
    }
}
