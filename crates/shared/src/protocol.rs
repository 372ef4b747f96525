use serde::{Deserialize, Serialize};

use crate::domain::{CourtId, CourtStatus, ScopeId, StatusColors};

/// Name of the document field holding a court's status.
pub const STATUS_FIELD: &str = "status";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourtStatusRecord {
    pub court_id: CourtId,
    pub status: CourtStatus,
    pub colors: StatusColors,
}

impl CourtStatusRecord {
    pub fn new(court_id: CourtId, status: CourtStatus) -> Self {
        Self {
            court_id,
            status,
            colors: status.colors(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorSnapshot {
    pub name: String,
    pub courts: Vec<CourtStatusRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSnapshot {
    pub scope: ScopeId,
    pub floors: Vec<FloorSnapshot>,
}
