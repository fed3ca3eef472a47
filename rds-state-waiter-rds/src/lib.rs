//! Amazon RDS instantiations of the state-transition waiter:
//! - Status vocabularies for RDS resources
//! - Transition tables (pending/target states and polling cadence)
//! - SDK-backed status probers and a small waiter service
//!

mod client;
mod error;
mod probe;
pub mod status;
pub mod transitions;

// Re-exports for a small, focused public API
pub use client::RdsWaiter;
pub use error::ActivityStreamError;
pub use probe::{
    ActivityStreamProber, DbClusterRoleProber, DbInstanceProber, DbProxyEndpointProber,
    EventSubscriptionProber,
};
pub use transitions::{wait_for, wait_for_activity_stream, Transition, ALL_TRANSITIONS};
