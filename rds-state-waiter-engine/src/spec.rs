//! Wait specification: the state vocabulary and polling schedule for one wait.

use crate::error::WaitError;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeSet;
use std::time::Duration;

/// First inter-poll interval when no fixed interval is configured.
pub const DEFAULT_INITIAL_INTERVAL: Duration = Duration::from_millis(100);

/// Ceiling for the exponential inter-poll interval.
pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_secs(10);

/// Fixed poll intervals at or above this are ignored in favour of backoff.
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(180);

/// Consecutive "absent" observations tolerated while a target state is expected.
pub const DEFAULT_NOT_FOUND_CHECKS: u32 = 20;

/// Configuration for a single wait call.
///
/// Every polling knob lives here rather than in process-wide constants, so a
/// schedule can be exercised deterministically under a paused clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitSpec {
    pub pending: BTreeSet<String>,
    /// An empty target set means absence of the resource is success.
    pub target: BTreeSet<String>,
    pub timeout: Duration,
    pub delay: Duration,
    pub min_interval: Duration,
    pub poll_interval: Option<Duration>,
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub not_found_checks: u32,
    pub continuous_target_occurrence: u32,
    pub probe_timeout: Option<Duration>,
}

impl WaitSpec {
    pub fn new(timeout: Duration) -> Self {
        Self {
            pending: BTreeSet::new(),
            target: BTreeSet::new(),
            timeout,
            delay: Duration::ZERO,
            min_interval: Duration::ZERO,
            poll_interval: None,
            initial_interval: DEFAULT_INITIAL_INTERVAL,
            max_interval: DEFAULT_MAX_INTERVAL,
            not_found_checks: DEFAULT_NOT_FOUND_CHECKS,
            continuous_target_occurrence: 1,
            probe_timeout: None,
        }
    }

    pub fn pending<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pending = states.into_iter().map(Into::into).collect();
        self
    }

    pub fn target<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target = states.into_iter().map(Into::into).collect();
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = Some(poll_interval);
        self
    }

    pub fn backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_interval = initial;
        self.max_interval = max;
        self
    }

    pub fn not_found_checks(mut self, checks: u32) -> Self {
        self.not_found_checks = checks;
        self
    }

    pub fn continuous_target_occurrence(mut self, occurrences: u32) -> Self {
        self.continuous_target_occurrence = occurrences;
        self
    }

    pub fn probe_timeout(mut self, probe_timeout: Duration) -> Self {
        self.probe_timeout = Some(probe_timeout);
        self
    }

    /// Override the timing knobs that are set in `policy`.
    pub fn with_policy(mut self, policy: &PollPolicy) -> Self {
        if let Some(timeout) = policy.timeout {
            self.timeout = timeout;
        }
        if let Some(delay) = policy.delay {
            self.delay = delay;
        }
        if let Some(min_interval) = policy.min_interval {
            self.min_interval = min_interval;
        }
        if policy.poll_interval.is_some() {
            self.poll_interval = policy.poll_interval;
        }
        if let Some(initial) = policy.initial_interval {
            self.initial_interval = initial;
        }
        if let Some(max) = policy.max_interval {
            self.max_interval = max;
        }
        if let Some(checks) = policy.not_found_checks {
            self.not_found_checks = checks;
        }
        if let Some(occurrences) = policy.continuous_target_occurrence {
            self.continuous_target_occurrence = occurrences;
        }
        if policy.probe_timeout.is_some() {
            self.probe_timeout = policy.probe_timeout;
        }
        self
    }

    /// Target labels in a stable order, for diagnostics.
    pub fn expected(&self) -> Vec<String> {
        self.target.iter().cloned().collect()
    }

    pub fn is_pending(&self, state: &str) -> bool {
        self.pending.contains(state)
    }

    pub fn is_target(&self, state: &str) -> bool {
        self.target.contains(state)
    }

    /// Check the constraints a wait relies on.
    pub fn validate(&self) -> Result<(), WaitError> {
        if self.timeout.is_zero() {
            return Err(WaitError::InvalidSpec(
                "timeout must be greater than zero".to_string(),
            ));
        }
        if self.continuous_target_occurrence == 0 {
            return Err(WaitError::InvalidSpec(
                "continuous target occurrence must be at least 1".to_string(),
            ));
        }
        let overlap: Vec<&str> = self
            .pending
            .intersection(&self.target)
            .map(String::as_str)
            .collect();
        if !overlap.is_empty() {
            return Err(WaitError::InvalidSpec(format!(
                "states cannot be both pending and target: {}",
                overlap.join(", ")
            )));
        }
        Ok(())
    }
}

/// Timing overrides for a [`WaitSpec`], typically loaded from configuration.
///
/// Durations are humantime strings such as `"30s"` or `"1h 5m"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PollPolicy {
    #[serde(deserialize_with = "de_opt_duration")]
    pub timeout: Option<Duration>,
    #[serde(deserialize_with = "de_opt_duration")]
    pub delay: Option<Duration>,
    #[serde(deserialize_with = "de_opt_duration")]
    pub min_interval: Option<Duration>,
    #[serde(deserialize_with = "de_opt_duration")]
    pub poll_interval: Option<Duration>,
    #[serde(deserialize_with = "de_opt_duration")]
    pub initial_interval: Option<Duration>,
    #[serde(deserialize_with = "de_opt_duration")]
    pub max_interval: Option<Duration>,
    pub not_found_checks: Option<u32>,
    pub continuous_target_occurrence: Option<u32>,
    #[serde(deserialize_with = "de_opt_duration")]
    pub probe_timeout: Option<Duration>,
}

impl PollPolicy {
    pub fn from_json(json: &str) -> Result<Self, WaitError> {
        serde_json::from_str(json)
            .map_err(|e| WaitError::InvalidSpec(format!("Failed to parse poll policy: {e}")))
    }
}

fn de_opt_duration<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|raw| humantime::parse_duration(&raw).map_err(serde::de::Error::custom))
        .transpose()
}
