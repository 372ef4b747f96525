//! In-memory current status per court, shared by the screen and every court
//! renderer.

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use shared::domain::{CourtId, CourtStatus, StatusColors};
use tokio::sync::broadcast;
use tracing::{debug, warn};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    StatusChanged {
        court_id: CourtId,
        status: CourtStatus,
    },
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    status: CourtStatus,
    // Bumped by every write, so a value can be traced back to the write
    // that stored it.
    generation: u64,
}

struct RegistryInner {
    statuses: HashMap<CourtId, Entry>,
    next_generation: u64,
    // `None` once disposed.
    events: Option<broadcast::Sender<RegistryEvent>>,
}

/// Handle to the status registry. Clones share the same state.
#[derive(Clone)]
pub struct StatusRegistry {
    inner: Arc<RwLock<RegistryInner>>,
}

impl StatusRegistry {
    /// Creates a registry with every court set to `empty`.
    pub fn create<I>(courts: I) -> Self
    where
        I: IntoIterator<Item = CourtId>,
    {
        let statuses = courts
            .into_iter()
            .map(|court_id| {
                (
                    court_id,
                    Entry {
                        status: CourtStatus::Empty,
                        generation: 0,
                    },
                )
            })
            .collect();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(RwLock::new(RegistryInner {
                statuses,
                next_generation: 1,
                events: Some(events),
            })),
        }
    }

    /// Drops all observers. Writes after disposal are ignored.
    pub fn dispose(&self) {
        let mut inner = self.write();
        if inner.events.take().is_some() {
            debug!(courts = inner.statuses.len(), "status registry disposed");
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.read().events.is_none()
    }

    pub fn get(&self, court_id: &CourtId) -> CourtStatus {
        self.read()
            .statuses
            .get(court_id)
            .map(|entry| entry.status)
            .unwrap_or_default()
    }

    pub fn colors(&self, court_id: &CourtId) -> StatusColors {
        self.get(court_id).colors()
    }

    /// Inserts or overwrites the status of `court_id` and notifies observers.
    pub fn set(&self, court_id: CourtId, status: CourtStatus) {
        self.store(court_id, status, None);
    }

    /// Like `set`, but returns the generation of the write, or `None` once
    /// disposed.
    pub fn set_tracked(&self, court_id: CourtId, status: CourtStatus) -> Option<u64> {
        self.store(court_id, status, None)
    }

    /// Sets `court_id` to `replacement` only while its current value is still
    /// the one stored by the write with `generation`.
    pub fn replace_if_generation(
        &self,
        court_id: &CourtId,
        generation: u64,
        replacement: CourtStatus,
    ) -> bool {
        self.store(court_id.clone(), replacement, Some(generation))
            .is_some()
    }

    fn store(
        &self,
        court_id: CourtId,
        status: CourtStatus,
        expected_generation: Option<u64>,
    ) -> Option<u64> {
        let mut inner = self.write();
        let Some(events) = inner.events.clone() else {
            debug!(court = %court_id, %status, "ignoring status write to disposed registry");
            return None;
        };
        if let Some(expected) = expected_generation {
            let current = inner.statuses.get(&court_id).map(|entry| entry.generation);
            if current != Some(expected) {
                return None;
            }
        }
        let generation = inner.next_generation;
        inner.next_generation += 1;
        inner
            .statuses
            .insert(court_id.clone(), Entry { status, generation });
        drop(inner);

        // No receivers is fine: nothing is rendering right now.
        let _ = events.send(RegistryEvent::StatusChanged { court_id, status });
        Some(generation)
    }

    /// Applies statuses read from the remote store. Courts outside the
    /// registry are skipped; unrecognized values become `empty`. Returns the
    /// number of courts written.
    pub fn apply_remote(&self, statuses: &HashMap<CourtId, String>) -> usize {
        let mut applied = 0;
        for (court_id, raw) in statuses {
            if !self.read().statuses.contains_key(court_id) {
                debug!(court = %court_id, "skipping remote status for court not on this screen");
                continue;
            }
            let status = raw.parse().unwrap_or_else(|_| {
                warn!(court = %court_id, raw = %raw, "unrecognized remote status; using empty");
                CourtStatus::Empty
            });
            self.set(court_id.clone(), status);
            applied += 1;
        }
        applied
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        match &self.read().events {
            Some(events) => events.subscribe(),
            None => {
                let (closed, receiver) = broadcast::channel(1);
                drop(closed);
                receiver
            }
        }
    }

    pub fn snapshot(&self) -> HashMap<CourtId, CourtStatus> {
        self.read()
            .statuses
            .iter()
            .map(|(court_id, entry)| (court_id.clone(), entry.status))
            .collect()
    }

    pub fn court_ids(&self) -> Vec<CourtId> {
        let mut ids: Vec<CourtId> = self.read().statuses.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;
