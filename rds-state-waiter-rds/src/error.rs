//! Errors surfaced by the RDS waits.

use rds_state_waiter_engine::WaitError;
use thiserror::Error;

/// A failed wait on a DB cluster's database activity stream.
#[derive(Debug, Error)]
#[error("error waiting for RDS Cluster Activity Stream ({cluster}) to be {expected}: {source}")]
pub struct ActivityStreamError {
    pub cluster: String,
    pub expected: String,
    #[source]
    pub source: WaitError,
}
