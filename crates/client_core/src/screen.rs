//! Court overview screen: owns the registry and side panel for one scope and
//! pushes user-reported statuses to the remote store.

use serde::{Deserialize, Serialize};
use shared::{
    domain::{CourtId, CourtLayout, CourtStatus, ScopeId, StatusColors},
    error::SyncError,
    protocol::{CourtStatusRecord, FloorSnapshot, ScreenSnapshot},
};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::{
    panel::{PanelState, SidePanel},
    registry::StatusRegistry,
    sync::RemoteSyncAdapter,
};

/// What happens to an optimistic local status when its remote write fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcilePolicy {
    /// Leave the local value in place until the next successful hydrate.
    KeepDiverged,
    /// Restore the previous value unless the court has been written again
    /// since, even with the same status.
    #[default]
    RevertOnFailure,
}

/// Remote write spawned by a status change. Dropping it does not cancel the
/// write.
#[derive(Debug)]
pub struct PendingWrite {
    court_id: CourtId,
    status: CourtStatus,
    handle: JoinHandle<Result<(), SyncError>>,
}

impl PendingWrite {
    pub fn court_id(&self) -> &CourtId {
        &self.court_id
    }

    pub fn status(&self) -> CourtStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the remote write to complete.
    pub async fn outcome(self) -> Result<(), SyncError> {
        match self.handle.await {
            Ok(result) => result,
            Err(err) => {
                error!(court = %self.court_id, error = %err, "status write task did not complete");
                Err(SyncError::StatusUpdateFailed)
            }
        }
    }
}

pub struct CourtScreen {
    scope: ScopeId,
    layout: CourtLayout,
    registry: StatusRegistry,
    panel: SidePanel,
    adapter: RemoteSyncAdapter,
    policy: ReconcilePolicy,
}

impl CourtScreen {
    pub fn create(
        scope: ScopeId,
        layout: CourtLayout,
        adapter: RemoteSyncAdapter,
        policy: ReconcilePolicy,
    ) -> Self {
        let registry = StatusRegistry::create(layout.court_ids().cloned());
        info!(%scope, courts = registry.court_ids().len(), ?policy, "court screen created");
        Self {
            scope,
            layout,
            registry,
            panel: SidePanel::new(),
            adapter,
            policy,
        }
    }

    /// Tears the screen down. Writes still in flight finish remotely but no
    /// longer touch local state.
    pub fn dispose(self) {
        self.registry.dispose();
        info!(scope = %self.scope, "court screen disposed");
    }

    pub fn scope(&self) -> &ScopeId {
        &self.scope
    }

    pub fn layout(&self) -> &CourtLayout {
        &self.layout
    }

    pub fn registry(&self) -> &StatusRegistry {
        &self.registry
    }

    pub fn panel(&self) -> &SidePanel {
        &self.panel
    }

    pub fn panel_state(&self) -> PanelState {
        self.panel.state()
    }

    pub fn court_colors(&self, court_id: &CourtId) -> StatusColors {
        self.registry.colors(court_id)
    }

    pub fn tap_court(&mut self, court_id: &CourtId) -> bool {
        if !self.layout.contains(court_id) {
            warn!(scope = %self.scope, court = %court_id, "tap on court not on this screen");
            return false;
        }
        self.panel.open(court_id.clone())
    }

    pub fn tap_outside(&mut self) -> bool {
        self.panel.tap_outside()
    }

    pub fn close_panel(&mut self) -> bool {
        self.panel.close()
    }

    pub fn panel_transition_finished(&mut self) {
        self.panel.transition_finished();
    }

    pub fn select_status(&mut self, status: CourtStatus) -> bool {
        self.panel.select(status)
    }

    /// Confirms the panel selection. Returns the spawned remote write when a
    /// status was selected; the panel closes either way.
    pub fn confirm_selection(&mut self) -> Option<PendingWrite> {
        let mut confirmed = None;
        self.panel
            .confirm(|court_id, status| confirmed = Some((court_id, status)));
        confirmed.map(|(court_id, status)| self.on_status_change(court_id, status))
    }

    /// Applies `status` locally right away, then writes it to the remote store
    /// in the background. Must be called from within a tokio runtime.
    pub fn on_status_change(&self, court_id: CourtId, status: CourtStatus) -> PendingWrite {
        let previous = self.registry.get(&court_id);
        let generation = self.registry.set_tracked(court_id.clone(), status);
        info!(scope = %self.scope, court = %court_id, %previous, %status, "status reported");

        let adapter = self.adapter.clone();
        let registry = self.registry.clone();
        let scope = self.scope.clone();
        let policy = self.policy;
        let task_court = court_id.clone();
        let handle = tokio::spawn(async move {
            let result = adapter.update_status(&scope, &task_court, status).await;
            let reverted = match generation {
                Some(generation)
                    if result.is_err() && policy == ReconcilePolicy::RevertOnFailure =>
                {
                    registry.replace_if_generation(&task_court, generation, previous)
                }
                _ => false,
            };
            if reverted {
                warn!(%scope, court = %task_court, %status, %previous, "remote write failed; reverted local status");
            }
            result
        });

        PendingWrite {
            court_id,
            status,
            handle,
        }
    }

    /// Loads the current statuses of this scope from the remote store. On
    /// failure the registry keeps its current values.
    pub async fn hydrate(&self) -> Result<usize, SyncError> {
        let statuses = self.adapter.fetch_statuses(&self.scope).await?;
        let applied = self.registry.apply_remote(&statuses);
        info!(scope = %self.scope, applied, "registry hydrated from remote store");
        Ok(applied)
    }

    pub fn snapshot(&self) -> ScreenSnapshot {
        let floors = self
            .layout
            .floors
            .iter()
            .map(|floor| FloorSnapshot {
                name: floor.name.clone(),
                courts: floor
                    .courts
                    .iter()
                    .map(|court_id| CourtStatusRecord::new(court_id.clone(), self.registry.get(court_id)))
                    .collect(),
            })
            .collect();
        ScreenSnapshot {
            scope: self.scope.clone(),
            floors,
        }
    }
}

#[cfg(test)]
#[path = "tests/screen_tests.rs"]
mod tests;
