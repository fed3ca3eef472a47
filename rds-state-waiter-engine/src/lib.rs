//! A generic asynchronous state-transition waiter.
//!
//! Given a remote resource whose lifecycle is only visible by polling an
//! eventually-consistent control plane, [`wait`] blocks the calling task
//! until the resource reaches one of a set of target states, or fails with
//! a typed [`WaitError`]:
//! - pending states keep the loop polling with bounded backoff
//! - any state outside the pending and target sets fails immediately
//! - absence of the resource is success when the target set is empty
//! - the timeout covers the whole call, including the initial delay
//!
//! Resource-specific waits only choose a [`WaitSpec`] and a [`StatusProber`].
//!
//! ```no_run
//! use rds_state_waiter_engine::{wait, Observation, ProbeError, ProbeFn, WaitSpec};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let spec = WaitSpec::new(Duration::from_secs(300))
//!     .pending(["creating"])
//!     .target(["active"]);
//! let prober = ProbeFn::new(|| async {
//!     Ok::<_, ProbeError>(Observation::present("active", "subscription-1"))
//! });
//!
//! let reached = wait(&spec, &prober).await?;
//! assert_eq!(reached.state(), Some("active"));
//! # Ok(())
//! # }
//! ```

mod backoff;
mod error;
mod observation;
mod prober;
mod spec;
mod waiter;

// Re-exports for a small, focused public API
pub use backoff::PollSchedule;
pub use error::{BoxError, ProbeError, WaitError, WaitFailure, WaitResult};
pub use observation::Observation;
pub use prober::{ProbeFn, StatusProber};
pub use spec::{
    PollPolicy, WaitSpec, DEFAULT_INITIAL_INTERVAL, DEFAULT_MAX_INTERVAL,
    DEFAULT_NOT_FOUND_CHECKS, MAX_POLL_INTERVAL,
};
pub use tokio_util::sync::CancellationToken;
pub use waiter::{wait, wait_with_cancel};
