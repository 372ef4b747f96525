//! Side panel used to report a court's status.
//!
//! The renderer interpolates the slide/fade between states; this module only
//! owns which state the panel is in and what the user has selected.

use shared::domain::{CourtId, CourtStatus};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelState {
    #[default]
    Closed,
    Opening,
    Open,
    Closing,
}

impl PanelState {
    /// Whether the panel occupies the screen (and swallows court taps).
    pub fn is_visible(self) -> bool {
        matches!(self, PanelState::Opening | PanelState::Open)
    }
}

#[derive(Debug, Default)]
pub struct SidePanel {
    state: PanelState,
    court: Option<CourtId>,
    selection: Option<CourtStatus>,
}

impl SidePanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn court(&self) -> Option<&CourtId> {
        self.court.as_ref()
    }

    pub fn selection(&self) -> Option<CourtStatus> {
        self.selection
    }

    pub fn options(&self) -> &'static [CourtStatus] {
        &CourtStatus::ALL
    }

    /// Opens the panel for `court`. Ignored unless the panel is fully closed,
    /// so a second court tap cannot retarget an open panel.
    pub fn open(&mut self, court: CourtId) -> bool {
        if self.state != PanelState::Closed {
            debug!(court = %court, state = ?self.state, "ignoring court tap while panel is active");
            return false;
        }
        self.court = Some(court);
        self.selection = None;
        self.state = PanelState::Opening;
        true
    }

    /// Starts closing the panel and forgets the current selection.
    pub fn close(&mut self) -> bool {
        if !self.state.is_visible() {
            return false;
        }
        self.state = PanelState::Closing;
        self.selection = None;
        true
    }

    pub fn tap_outside(&mut self) -> bool {
        self.close()
    }

    /// Called by the renderer once the running slide animation has settled.
    pub fn transition_finished(&mut self) {
        self.state = match self.state {
            PanelState::Opening => PanelState::Open,
            PanelState::Closing => PanelState::Closed,
            settled => settled,
        };
    }

    pub fn select(&mut self, status: CourtStatus) -> bool {
        if !self.state.is_visible() {
            return false;
        }
        self.selection = Some(status);
        true
    }

    pub fn can_confirm(&self) -> bool {
        self.state.is_visible() && self.selection.is_some()
    }

    /// Confirms the selection: `on_status_change` runs exactly once with the
    /// chosen status, then the panel closes. Without a selection the panel
    /// just closes and the callback is not invoked.
    pub fn confirm<F>(&mut self, on_status_change: F) -> bool
    where
        F: FnOnce(CourtId, CourtStatus),
    {
        let confirmed = match (self.can_confirm(), self.court.clone(), self.selection) {
            (true, Some(court), Some(status)) => {
                on_status_change(court, status);
                true
            }
            _ => false,
        };
        self.close();
        confirmed
    }

    /// Heading shown at the top of the panel, e.g. `Court 2: busy`.
    pub fn heading(&self) -> String {
        let court = self.court.as_ref().map(CourtId::as_str).unwrap_or_default();
        match self.selection {
            Some(status) => format!("{court}: {status}"),
            None => format!("{court}: None selected"),
        }
    }
}

#[cfg(test)]
#[path = "tests/panel_tests.rs"]
mod tests;
