//! The RDS transitions callers wait on, as data.
//!
//! Each [`Transition`] names the pending and target vocabularies and the
//! polling cadence for one kind of change. Waiting is the same engine call
//! for all of them; only the table entry and the prober differ.

use crate::error::ActivityStreamError;
use crate::status::{
    ACTIVITY_STREAM_STATUS_STARTED, ACTIVITY_STREAM_STATUS_STARTING,
    ACTIVITY_STREAM_STATUS_STOPPED, ACTIVITY_STREAM_STATUS_STOPPING, CLUSTER_ROLE_STATUS_ACTIVE,
    CLUSTER_ROLE_STATUS_PENDING, EVENT_SUBSCRIPTION_STATUS_ACTIVE,
    EVENT_SUBSCRIPTION_STATUS_CREATING, EVENT_SUBSCRIPTION_STATUS_DELETING,
    EVENT_SUBSCRIPTION_STATUS_MODIFYING, INSTANCE_STATUS_AVAILABLE, INSTANCE_STATUS_BACKING_UP,
    INSTANCE_STATUS_CONFIGURING_ENHANCED_MONITORING, INSTANCE_STATUS_CONFIGURING_LOG_EXPORTS,
    INSTANCE_STATUS_CREATING, INSTANCE_STATUS_DELETING, INSTANCE_STATUS_INCOMPATIBLE_PARAMETERS,
    INSTANCE_STATUS_MODIFYING, INSTANCE_STATUS_STARTING, INSTANCE_STATUS_STOPPING,
    INSTANCE_STATUS_STORAGE_FULL, INSTANCE_STATUS_STORAGE_OPTIMIZATION,
    PROXY_ENDPOINT_STATUS_AVAILABLE, PROXY_ENDPOINT_STATUS_CREATING,
    PROXY_ENDPOINT_STATUS_DELETING, PROXY_ENDPOINT_STATUS_MODIFYING,
};
use rds_state_waiter_engine::{wait, PollPolicy, StatusProber, WaitResult, WaitSpec};
use std::time::Duration;

/// Fixed timeout for attaching a role to a DB cluster.
pub const CLUSTER_ROLE_ASSOCIATION_CREATED_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Fixed timeout for detaching a role from a DB cluster.
pub const CLUSTER_ROLE_ASSOCIATION_DELETED_TIMEOUT: Duration = Duration::from_secs(5 * 60);

const EVENT_SUBSCRIPTION_DELAY: Duration = Duration::from_secs(30);
const EVENT_SUBSCRIPTION_MIN_INTERVAL: Duration = Duration::from_secs(10);
const INSTANCE_DELETE_DELAY: Duration = Duration::from_secs(30);
const INSTANCE_DELETE_MIN_INTERVAL: Duration = Duration::from_secs(10);
const ACTIVITY_STREAM_DELAY: Duration = Duration::from_secs(5);
const ACTIVITY_STREAM_MIN_INTERVAL: Duration = Duration::from_secs(3);

/// One kind of resource change: its state vocabulary and polling cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub name: &'static str,
    pub pending: &'static [&'static str],
    /// Empty means the resource disappearing completes the transition.
    pub target: &'static [&'static str],
    pub delay: Duration,
    pub min_interval: Duration,
}

impl Transition {
    const fn new(
        name: &'static str,
        pending: &'static [&'static str],
        target: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            pending,
            target,
            delay: Duration::ZERO,
            min_interval: Duration::ZERO,
        }
    }

    const fn cadence(mut self, delay: Duration, min_interval: Duration) -> Self {
        self.delay = delay;
        self.min_interval = min_interval;
        self
    }

    /// The engine configuration for this transition.
    pub fn spec(&self, timeout: Duration) -> WaitSpec {
        WaitSpec::new(timeout)
            .pending(self.pending.iter().copied())
            .target(self.target.iter().copied())
            .delay(self.delay)
            .min_interval(self.min_interval)
    }

    /// Whether success is the resource no longer existing.
    pub fn is_deletion(&self) -> bool {
        self.target.is_empty()
    }
}

pub const EVENT_SUBSCRIPTION_CREATED: Transition = Transition::new(
    "event subscription created",
    &[EVENT_SUBSCRIPTION_STATUS_CREATING],
    &[EVENT_SUBSCRIPTION_STATUS_ACTIVE],
)
.cadence(EVENT_SUBSCRIPTION_DELAY, EVENT_SUBSCRIPTION_MIN_INTERVAL);

pub const EVENT_SUBSCRIPTION_DELETED: Transition = Transition::new(
    "event subscription deleted",
    &[EVENT_SUBSCRIPTION_STATUS_DELETING],
    &[],
)
.cadence(EVENT_SUBSCRIPTION_DELAY, EVENT_SUBSCRIPTION_MIN_INTERVAL);

pub const EVENT_SUBSCRIPTION_UPDATED: Transition = Transition::new(
    "event subscription updated",
    &[EVENT_SUBSCRIPTION_STATUS_MODIFYING],
    &[EVENT_SUBSCRIPTION_STATUS_ACTIVE],
)
.cadence(EVENT_SUBSCRIPTION_DELAY, EVENT_SUBSCRIPTION_MIN_INTERVAL);

pub const PROXY_ENDPOINT_AVAILABLE: Transition = Transition::new(
    "DB proxy endpoint available",
    &[PROXY_ENDPOINT_STATUS_CREATING, PROXY_ENDPOINT_STATUS_MODIFYING],
    &[PROXY_ENDPOINT_STATUS_AVAILABLE],
);

pub const PROXY_ENDPOINT_DELETED: Transition = Transition::new(
    "DB proxy endpoint deleted",
    &[PROXY_ENDPOINT_STATUS_DELETING],
    &[],
);

pub const CLUSTER_ROLE_ASSOCIATION_CREATED: Transition = Transition::new(
    "DB cluster role association created",
    &[CLUSTER_ROLE_STATUS_PENDING],
    &[CLUSTER_ROLE_STATUS_ACTIVE],
);

pub const CLUSTER_ROLE_ASSOCIATION_DELETED: Transition = Transition::new(
    "DB cluster role association deleted",
    &[CLUSTER_ROLE_STATUS_ACTIVE, CLUSTER_ROLE_STATUS_PENDING],
    &[],
);

// Deletion can be requested from almost any state, so every state the
// instance may pass through on the way out counts as pending.
pub const DB_INSTANCE_DELETED: Transition = Transition::new(
    "DB instance deleted",
    &[
        INSTANCE_STATUS_AVAILABLE,
        INSTANCE_STATUS_BACKING_UP,
        INSTANCE_STATUS_CONFIGURING_ENHANCED_MONITORING,
        INSTANCE_STATUS_CONFIGURING_LOG_EXPORTS,
        INSTANCE_STATUS_CREATING,
        INSTANCE_STATUS_DELETING,
        INSTANCE_STATUS_INCOMPATIBLE_PARAMETERS,
        INSTANCE_STATUS_MODIFYING,
        INSTANCE_STATUS_STARTING,
        INSTANCE_STATUS_STOPPING,
        INSTANCE_STATUS_STORAGE_FULL,
        INSTANCE_STATUS_STORAGE_OPTIMIZATION,
    ],
    &[],
)
.cadence(INSTANCE_DELETE_DELAY, INSTANCE_DELETE_MIN_INTERVAL);

pub const DB_CLUSTER_INSTANCE_DELETED: Transition = Transition::new(
    "DB cluster instance deleted",
    &[
        INSTANCE_STATUS_CONFIGURING_LOG_EXPORTS,
        INSTANCE_STATUS_DELETING,
        INSTANCE_STATUS_MODIFYING,
    ],
    &[],
)
.cadence(INSTANCE_DELETE_DELAY, INSTANCE_DELETE_MIN_INTERVAL);

pub const ACTIVITY_STREAM_STARTED: Transition = Transition::new(
    "activity stream started",
    &[ACTIVITY_STREAM_STATUS_STARTING],
    &[ACTIVITY_STREAM_STATUS_STARTED],
)
.cadence(ACTIVITY_STREAM_DELAY, ACTIVITY_STREAM_MIN_INTERVAL);

pub const ACTIVITY_STREAM_STOPPED: Transition = Transition::new(
    "activity stream stopped",
    &[ACTIVITY_STREAM_STATUS_STOPPING],
    &[ACTIVITY_STREAM_STATUS_STOPPED],
)
.cadence(ACTIVITY_STREAM_DELAY, ACTIVITY_STREAM_MIN_INTERVAL);

/// Every transition defined here.
pub const ALL_TRANSITIONS: &[Transition] = &[
    EVENT_SUBSCRIPTION_CREATED,
    EVENT_SUBSCRIPTION_DELETED,
    EVENT_SUBSCRIPTION_UPDATED,
    PROXY_ENDPOINT_AVAILABLE,
    PROXY_ENDPOINT_DELETED,
    CLUSTER_ROLE_ASSOCIATION_CREATED,
    CLUSTER_ROLE_ASSOCIATION_DELETED,
    DB_INSTANCE_DELETED,
    DB_CLUSTER_INSTANCE_DELETED,
    ACTIVITY_STREAM_STARTED,
    ACTIVITY_STREAM_STOPPED,
];

/// Wait for `transition` to complete, polling with `prober`.
///
/// `policy`, when given, overrides the transition's built-in timings.
pub async fn wait_for<P>(
    transition: &Transition,
    prober: &P,
    timeout: Duration,
    policy: Option<&PollPolicy>,
) -> WaitResult<P::Output>
where
    P: StatusProber + ?Sized,
{
    let mut spec = transition.spec(timeout);
    if let Some(policy) = policy {
        spec = spec.with_policy(policy);
    }
    log::debug!(
        "Waiting for {} (timeout: {:?}, delay: {:?})",
        transition.name,
        spec.timeout,
        spec.delay
    );
    wait(&spec, prober).await
}

/// Wait for a cluster's activity stream to reach `transition`, dropping the
/// cluster description and naming the cluster in the error.
pub async fn wait_for_activity_stream<P>(
    transition: &Transition,
    prober: &P,
    cluster_identifier: &str,
    timeout: Duration,
    policy: Option<&PollPolicy>,
) -> Result<(), ActivityStreamError>
where
    P: StatusProber + ?Sized,
{
    log::debug!(
        "Waiting for RDS Cluster Activity Stream {} to become {}...",
        cluster_identifier,
        transition.target.join(", ")
    );
    wait_for(transition, prober, timeout, policy)
        .await
        .map(|_| ())
        .map_err(|failure| ActivityStreamError {
            cluster: cluster_identifier.to_string(),
            expected: transition.target.join(", "),
            source: failure.error,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rds_state_waiter_engine::{Observation, ProbeError, ProbeFn, WaitError};
    use rstest::rstest;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn minutes(n: u64) -> Duration {
        Duration::from_secs(n * 60)
    }

    /// Prober that walks through `states`, where `None` means not found.
    fn sequence(
        states: &'static [Option<&'static str>],
        calls: Arc<AtomicUsize>,
    ) -> impl StatusProber<Output = usize> {
        ProbeFn::new(move || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            let state = states[n.min(states.len() - 1)];
            async move {
                Ok::<_, ProbeError>(match state {
                    Some(state) => Observation::present(state, n + 1),
                    None => Observation::Absent,
                })
            }
        })
    }

    #[test]
    fn test_every_transition_is_a_valid_spec() {
        for transition in ALL_TRANSITIONS {
            let spec = transition.spec(minutes(10));
            assert!(
                spec.validate().is_ok(),
                "{} has overlapping vocabularies",
                transition.name
            );
            assert!(!spec.pending.is_empty(), "{} has no pending states", transition.name);
        }
    }

    #[test]
    fn test_transition_names_are_unique() {
        let names: BTreeSet<&str> = ALL_TRANSITIONS.iter().map(|t| t.name).collect();
        assert_eq!(names.len(), ALL_TRANSITIONS.len());
    }

    #[rstest]
    #[case::event_subscription(EVENT_SUBSCRIPTION_CREATED, 30, 10)]
    #[case::instance_deleted(DB_INSTANCE_DELETED, 30, 10)]
    #[case::cluster_instance_deleted(DB_CLUSTER_INSTANCE_DELETED, 30, 10)]
    #[case::activity_stream(ACTIVITY_STREAM_STOPPED, 5, 3)]
    #[case::proxy_endpoint(PROXY_ENDPOINT_AVAILABLE, 0, 0)]
    #[case::cluster_role(CLUSTER_ROLE_ASSOCIATION_DELETED, 0, 0)]
    fn test_cadence(
        #[case] transition: Transition,
        #[case] delay_secs: u64,
        #[case] min_interval_secs: u64,
    ) {
        let spec = transition.spec(minutes(40));
        assert_eq!(spec.timeout, minutes(40));
        assert_eq!(spec.delay, Duration::from_secs(delay_secs));
        assert_eq!(spec.min_interval, Duration::from_secs(min_interval_secs));
    }

    #[test]
    fn test_deletions_have_empty_targets() {
        for transition in [
            EVENT_SUBSCRIPTION_DELETED,
            PROXY_ENDPOINT_DELETED,
            CLUSTER_ROLE_ASSOCIATION_DELETED,
            DB_INSTANCE_DELETED,
            DB_CLUSTER_INSTANCE_DELETED,
        ] {
            assert!(transition.is_deletion(), "{}", transition.name);
        }
        assert!(!EVENT_SUBSCRIPTION_CREATED.is_deletion());
    }

    #[tokio::test(start_paused = true)]
    async fn test_event_subscription_created() {
        let calls = Arc::new(AtomicUsize::new(0));
        let prober = sequence(
            &[Some("creating"), Some("creating"), Some("active")],
            calls.clone(),
        );

        let reached = wait_for(&EVENT_SUBSCRIPTION_CREATED, &prober, minutes(40), None)
            .await
            .expect("subscription should become active");
        assert_eq!(reached.into_value(), Some(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_db_instance_deleted_tolerates_any_exit_state() {
        let calls = Arc::new(AtomicUsize::new(0));
        let prober = sequence(
            &[
                Some("available"),
                Some("backing-up"),
                Some("deleting"),
                None,
            ],
            calls.clone(),
        );

        let reached = wait_for(&DB_INSTANCE_DELETED, &prober, minutes(60), None)
            .await
            .expect("instance should be deleted");
        assert!(reached.is_absent());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_db_cluster_instance_deleted_rejects_incompatible_parameters() {
        let calls = Arc::new(AtomicUsize::new(0));
        let prober = sequence(&[Some("incompatible-parameters"), None], calls.clone());

        let failure = wait_for(&DB_CLUSTER_INSTANCE_DELETED, &prober, minutes(60), None)
            .await
            .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(failure.error, WaitError::UnexpectedState { .. }));
        assert_eq!(failure.last_value, Some(1));
    }

    #[rstest]
    #[case::stopped_instance(DB_INSTANCE_DELETED, crate::status::INSTANCE_STATUS_STOPPED)]
    #[case::failed_restore(
        DB_INSTANCE_DELETED,
        crate::status::INSTANCE_STATUS_INCOMPATIBLE_RESTORE
    )]
    #[case::bad_network(
        PROXY_ENDPOINT_AVAILABLE,
        crate::status::PROXY_ENDPOINT_STATUS_INCOMPATIBLE_NETWORK
    )]
    #[case::no_capacity(
        PROXY_ENDPOINT_AVAILABLE,
        crate::status::PROXY_ENDPOINT_STATUS_INSUFFICIENT_RESOURCE_LIMITS
    )]
    #[tokio::test(start_paused = true)]
    async fn test_terminal_statuses_end_the_wait(
        #[case] transition: Transition,
        #[case] status: &'static str,
    ) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let prober = ProbeFn::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok::<_, ProbeError>(Observation::present(status, ())) }
        });

        let failure = wait_for(&transition, &prober, minutes(60), None)
            .await
            .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(failure.error.last_state(), Some(status));
        assert!(matches!(failure.error, WaitError::UnexpectedState { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cluster_role_association_deleted() {
        let calls = Arc::new(AtomicUsize::new(0));
        let prober = sequence(&[Some("ACTIVE"), Some("PENDING"), None], calls.clone());

        let reached = wait_for(
            &CLUSTER_ROLE_ASSOCIATION_DELETED,
            &prober,
            CLUSTER_ROLE_ASSOCIATION_DELETED_TIMEOUT,
            None,
        )
        .await
        .expect("role should be detached");
        assert!(reached.is_absent());
    }

    #[tokio::test(start_paused = true)]
    async fn test_policy_overrides_cadence() {
        let calls = Arc::new(AtomicUsize::new(0));
        let prober = sequence(&[Some("creating"), Some("active")], calls.clone());
        let policy = PollPolicy {
            delay: Some(Duration::ZERO),
            min_interval: Some(Duration::from_secs(1)),
            ..PollPolicy::default()
        };

        let start = tokio::time::Instant::now();
        wait_for(&EVENT_SUBSCRIPTION_CREATED, &prober, minutes(40), Some(&policy))
            .await
            .expect("subscription should become active");
        assert!(start.elapsed() < Duration::from_secs(30));
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn test_activity_stream_error_names_cluster() {
        let calls = Arc::new(AtomicUsize::new(0));
        let prober = sequence(&[Some("starting")], calls.clone());

        let err = wait_for_activity_stream(
            &ACTIVITY_STREAM_STARTED,
            &prober,
            "aurora-cluster-1",
            minutes(2),
            None,
        )
        .await
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("aurora-cluster-1"), "message was: {message}");
        assert!(message.contains("to be started"), "message was: {message}");
        assert!(err.source.is_timeout());
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_stream_stopped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let prober = sequence(&[Some("stopping"), Some("stopped")], calls.clone());

        wait_for_activity_stream(
            &ACTIVITY_STREAM_STOPPED,
            &prober,
            "aurora-cluster-1",
            minutes(10),
            None,
        )
        .await
        .expect("stream should stop");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
