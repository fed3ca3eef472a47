//! Error types for waiting on a state transition.

use crate::observation::Observation;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Boxed error type accepted from status probers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A failed call to a status prober.
///
/// The prober decides whether the failure is worth retrying. Transient
/// failures are retried until the wait's timeout elapses, fatal ones end
/// the wait immediately.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct ProbeError {
    source: BoxError,
    retryable: bool,
}

impl ProbeError {
    /// A failure that is retried within the timeout budget.
    pub fn transient(source: impl Into<BoxError>) -> Self {
        Self {
            source: source.into(),
            retryable: true,
        }
    }

    /// A failure that terminates the wait.
    pub fn fatal(source: impl Into<BoxError>) -> Self {
        Self {
            source: source.into(),
            retryable: false,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    /// Consume the error, returning the prober's original error.
    pub fn into_source(self) -> BoxError {
        self.source
    }
}

/// Errors that end a wait without reaching a target state.
#[derive(Debug, Error)]
pub enum WaitError {
    /// The wait specification violates one of its constraints.
    #[error("invalid wait specification: {0}")]
    InvalidSpec(String),

    /// The resource entered a state that is neither pending nor target.
    #[error(
        "unexpected state '{state}' while waiting for {}{}",
        describe_goal(.expected),
        error_suffix(.last_error)
    )]
    UnexpectedState {
        state: String,
        expected: Vec<String>,
        last_error: Option<ProbeError>,
    },

    /// The timeout elapsed before a target state was observed.
    #[error(
        "timeout while waiting for {} (last state: '{}', timeout: {})",
        describe_goal(.expected),
        state_or_none(.last_state),
        format_timeout(.timeout)
    )]
    Timeout {
        timeout: Duration,
        expected: Vec<String>,
        last_state: Option<String>,
        last_error: Option<ProbeError>,
    },

    /// The caller cancelled the wait.
    #[error(
        "cancelled while waiting for {} (last state: '{}'){}",
        describe_goal(.expected),
        state_or_none(.last_state),
        error_suffix(.last_error)
    )]
    Cancelled {
        expected: Vec<String>,
        last_state: Option<String>,
        last_error: Option<ProbeError>,
    },

    /// The resource stayed absent for more consecutive checks than allowed.
    #[error("couldn't find resource ({checks} retries){}", error_suffix(.last_error))]
    NotFound {
        checks: u32,
        last_error: Option<ProbeError>,
    },

    /// The prober reported a non-retryable failure.
    #[error("status probe failed: {0}")]
    Probe(#[source] ProbeError),
}

impl WaitError {
    /// The last state observed before the wait ended, if the error carries one.
    pub fn last_state(&self) -> Option<&str> {
        match self {
            Self::UnexpectedState { state, .. } => Some(state),
            Self::Timeout { last_state, .. } | Self::Cancelled { last_state, .. } => {
                last_state.as_deref()
            }
            Self::InvalidSpec(_) | Self::NotFound { .. } | Self::Probe(_) => None,
        }
    }

    /// The most recent probe error recorded before the wait ended.
    pub fn last_error(&self) -> Option<&ProbeError> {
        match self {
            Self::UnexpectedState { last_error, .. }
            | Self::Timeout { last_error, .. }
            | Self::Cancelled { last_error, .. }
            | Self::NotFound { last_error, .. } => last_error.as_ref(),
            Self::Probe(err) => Some(err),
            Self::InvalidSpec(_) => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

fn describe_goal(expected: &[String]) -> String {
    if expected.is_empty() {
        "resource to disappear".to_string()
    } else {
        format!("state to become '{}'", expected.join(", "))
    }
}

fn state_or_none(state: &Option<String>) -> &str {
    state.as_deref().unwrap_or("none")
}

fn format_timeout(timeout: &Duration) -> humantime::FormattedDuration {
    humantime::format_duration(*timeout)
}

fn error_suffix(err: &Option<ProbeError>) -> String {
    err.as_ref()
        .map(|e| format!(", last error: {e}"))
        .unwrap_or_default()
}

/// A failed wait together with the last value the prober returned.
///
/// Callers that need to inspect the stuck resource (for example to report
/// its status reason) read `last_value`; everyone else converts into the
/// underlying [`WaitError`].
pub struct WaitFailure<T> {
    pub error: WaitError,
    pub last_value: Option<T>,
}

impl<T> WaitFailure<T> {
    pub(crate) fn new(error: WaitError, last_value: Option<T>) -> Self {
        Self { error, last_value }
    }

    pub fn into_parts(self) -> (WaitError, Option<T>) {
        (self.error, self.last_value)
    }
}

impl<T> fmt::Debug for WaitFailure<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitFailure")
            .field("error", &self.error)
            .field("has_last_value", &self.last_value.is_some())
            .finish()
    }
}

impl<T> fmt::Display for WaitFailure<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl<T> std::error::Error for WaitFailure<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.error)
    }
}

impl<T> From<WaitFailure<T>> for WaitError {
    fn from(failure: WaitFailure<T>) -> Self {
        failure.error
    }
}

/// Outcome of a single wait call.
///
/// On success the final observation is returned: the target state with its
/// value, or [`Observation::Absent`] when the wait was for disappearance.
pub type WaitResult<T> = Result<Observation<T>, WaitFailure<T>>;
