//! The polling loop.
//!
//! One wait call moves through `Delaying`, then alternates `Polling` and
//! `Backoff` until it succeeds, sees an unexpected state, runs out of time,
//! is cancelled, or the prober reports a fatal error. There is no path back
//! to `Delaying`.

use crate::backoff::PollSchedule;
use crate::error::{ProbeError, WaitError, WaitFailure, WaitResult};
use crate::observation::Observation;
use crate::prober::StatusProber;
use crate::spec::WaitSpec;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tokio_util::sync::CancellationToken;

/// Poll `prober` until the resource reaches a target state.
///
/// Returns the final observation on success. Transient probe errors are
/// retried until the `WaitSpec` timeout; a state outside the pending and target
/// sets ends the wait immediately.
pub async fn wait<P>(spec: &WaitSpec, prober: &P) -> WaitResult<P::Output>
where
    P: StatusProber + ?Sized,
{
    run(spec, prober, None).await
}

/// Like [`wait`], but stops early once `cancel` is triggered.
///
/// Cancellation is honoured before each probe and during every sleep. An
/// in-flight probe is always allowed to finish, and a terminal observation
/// it returns takes precedence over the cancellation.
pub async fn wait_with_cancel<P>(
    spec: &WaitSpec,
    prober: &P,
    cancel: &CancellationToken,
) -> WaitResult<P::Output>
where
    P: StatusProber + ?Sized,
{
    run(spec, prober, Some(cancel)).await
}

/// Everything the loop remembers between probes.
struct Progress<T> {
    last_state: Option<String>,
    last_value: Option<T>,
    last_error: Option<ProbeError>,
    not_found: u32,
    target_seen: u32,
    probes: u32,
}

impl<T> Progress<T> {
    fn new() -> Self {
        Self {
            last_state: None,
            last_value: None,
            last_error: None,
            not_found: 0,
            target_seen: 0,
            probes: 0,
        }
    }

    fn timed_out(self, spec: &WaitSpec) -> WaitFailure<T> {
        log::debug!(
            "Wait timed out after {} probes (last state: {:?})",
            self.probes,
            self.last_state
        );
        WaitFailure::new(
            WaitError::Timeout {
                timeout: spec.timeout,
                expected: spec.expected(),
                last_state: self.last_state,
                last_error: self.last_error,
            },
            self.last_value,
        )
    }

    fn cancelled(self, spec: &WaitSpec) -> WaitFailure<T> {
        log::debug!("Wait cancelled after {} probes", self.probes);
        WaitFailure::new(
            WaitError::Cancelled {
                expected: spec.expected(),
                last_state: self.last_state,
                last_error: self.last_error,
            },
            self.last_value,
        )
    }
}

/// What to do after classifying one probe.
enum Step<T> {
    Done(Observation<T>),
    Fail(WaitError, Option<T>),
    Sleep(Duration),
}

async fn run<P>(
    spec: &WaitSpec,
    prober: &P,
    cancel: Option<&CancellationToken>,
) -> WaitResult<P::Output>
where
    P: StatusProber + ?Sized,
{
    if let Err(err) = spec.validate() {
        return Err(WaitFailure::new(err, None));
    }

    // An unrepresentable deadline means the wait never times out.
    let deadline = Instant::now().checked_add(spec.timeout);
    let mut progress = Progress::new();
    let mut schedule = PollSchedule::new(spec);

    if !spec.delay.is_zero() {
        log::debug!("Waiting {:?} before the first status probe", spec.delay);
        if pause(spec.delay.min(spec.timeout), cancel).await {
            return Err(progress.cancelled(spec));
        }
    }

    loop {
        if is_cancelled(cancel) {
            return Err(progress.cancelled(spec));
        }
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(progress.timed_out(spec));
        }

        let observed = probe_once(spec, prober).await;
        progress.probes += 1;

        let next_sleep = match classify(spec, &mut progress, &mut schedule, observed) {
            Step::Done(observation) => {
                log::info!(
                    "Reached {} after {} probes",
                    observation.state().unwrap_or("absence"),
                    progress.probes
                );
                return Ok(observation);
            }
            Step::Fail(err, value) => return Err(WaitFailure::new(err, value)),
            Step::Sleep(next_sleep) => next_sleep,
        };

        if is_cancelled(cancel) {
            return Err(progress.cancelled(spec));
        }
        if deadline.is_some_and(|deadline| {
            next_sleep > deadline.saturating_duration_since(Instant::now())
        }) {
            return Err(progress.timed_out(spec));
        }
        if pause(next_sleep, cancel).await {
            return Err(progress.cancelled(spec));
        }
    }
}

fn classify<T>(
    spec: &WaitSpec,
    progress: &mut Progress<T>,
    schedule: &mut PollSchedule,
    observed: Result<Observation<T>, ProbeError>,
) -> Step<T> {
    match observed {
        Err(err) if !err.is_retryable() => {
            log::debug!("Status probe failed fatally: {err}");
            Step::Fail(WaitError::Probe(err), progress.last_value.take())
        }
        Err(err) => {
            log::warn!("Status probe failed, will retry: {err}");
            progress.last_error = Some(err);
            progress.target_seen = 0;
            Step::Sleep(schedule.advance())
        }
        Ok(Observation::Absent) if spec.target.is_empty() => {
            log::debug!("Resource not found");
            progress.target_seen += 1;
            if progress.target_seen >= spec.continuous_target_occurrence {
                Step::Done(Observation::Absent)
            } else {
                Step::Sleep(schedule.hold())
            }
        }
        Ok(Observation::Absent) => {
            progress.target_seen = 0;
            progress.not_found += 1;
            log::debug!(
                "Resource not found ({}/{} checks)",
                progress.not_found,
                spec.not_found_checks
            );
            if progress.not_found > spec.not_found_checks {
                Step::Fail(
                    WaitError::NotFound {
                        checks: progress.not_found,
                        last_error: progress.last_error.take(),
                    },
                    progress.last_value.take(),
                )
            } else {
                Step::Sleep(schedule.advance())
            }
        }
        Ok(Observation::Present { state, value }) => {
            log::debug!("Observed state: {state}");
            progress.not_found = 0;
            progress.last_state = Some(state.clone());

            if spec.is_target(&state) {
                progress.target_seen += 1;
                if progress.target_seen >= spec.continuous_target_occurrence {
                    return Step::Done(Observation::Present { state, value });
                }
                progress.last_value = Some(value);
                Step::Sleep(schedule.hold())
            } else if spec.is_pending(&state) {
                progress.target_seen = 0;
                progress.last_value = Some(value);
                Step::Sleep(schedule.advance())
            } else {
                Step::Fail(
                    WaitError::UnexpectedState {
                        state,
                        expected: spec.expected(),
                        last_error: progress.last_error.take(),
                    },
                    Some(value),
                )
            }
        }
    }
}

async fn probe_once<P>(
    spec: &WaitSpec,
    prober: &P,
) -> Result<Observation<P::Output>, ProbeError>
where
    P: StatusProber + ?Sized,
{
    match spec.probe_timeout {
        Some(limit) => timeout(limit, prober.probe()).await.unwrap_or_else(|_| {
            Err(ProbeError::transient(format!(
                "status probe timed out after {limit:?}"
            )))
        }),
        None => prober.probe().await,
    }
}

fn is_cancelled(cancel: Option<&CancellationToken>) -> bool {
    cancel.is_some_and(CancellationToken::is_cancelled)
}

/// Sleep for `duration`, returning `true` if cancelled first.
async fn pause(duration: Duration, cancel: Option<&CancellationToken>) -> bool {
    match cancel {
        Some(token) => {
            tokio::select! {
                biased;
                () = token.cancelled() => true,
                () = sleep(duration) => false,
            }
        }
        None => {
            sleep(duration).await;
            false
        }
    }
}
