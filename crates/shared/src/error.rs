use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of a remote status operation. The underlying cause is logged at the
/// point of failure and deliberately not carried here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum SyncError {
    #[error("failed to update court status")]
    StatusUpdateFailed,
    #[error("failed to fetch court statuses")]
    StatusFetchFailed,
}
