//! Inter-poll spacing.

use crate::spec::{WaitSpec, MAX_POLL_INTERVAL};
use std::time::Duration;

/// Sleeps between successive probes.
///
/// Starts at the `WaitSpec` initial interval and doubles up to its ceiling. The
/// result is never below `min_interval`; a fixed `poll_interval` under
/// [`MAX_POLL_INTERVAL`] replaces the doubling but not the floor. The sequence
/// is non-decreasing.
#[derive(Debug, Clone)]
pub struct PollSchedule {
    raw: Duration,
    max_interval: Duration,
    min_interval: Duration,
    fixed: Option<Duration>,
    last: Option<Duration>,
}

impl PollSchedule {
    pub fn new(spec: &WaitSpec) -> Self {
        let fixed = spec
            .poll_interval
            .filter(|interval| !interval.is_zero() && *interval < MAX_POLL_INTERVAL);
        Self {
            raw: spec.initial_interval,
            max_interval: spec.max_interval,
            min_interval: spec.min_interval,
            fixed,
            last: None,
        }
    }

    fn bounded(&self, raw: Duration) -> Duration {
        if let Some(fixed) = self.fixed {
            return fixed.max(self.min_interval);
        }
        raw.min(self.max_interval).max(self.min_interval)
    }

    /// The next sleep, advancing the backoff.
    pub fn advance(&mut self) -> Duration {
        let interval = self.bounded(self.raw);
        self.raw = self.raw.saturating_mul(2).min(self.max_interval.max(self.raw));
        self.last = Some(interval);
        interval
    }

    /// Repeat the previous sleep without growing it.
    pub fn hold(&mut self) -> Duration {
        match self.last {
            Some(interval) => interval,
            None => self.advance(),
        }
    }
}

impl Iterator for PollSchedule {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        Some(self.advance())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_doubles_up_to_ceiling() {
        let spec = WaitSpec::new(Duration::from_secs(60)).backoff(ms(100), ms(1000));
        let sleeps: Vec<Duration> = PollSchedule::new(&spec).take(6).collect();
        assert_eq!(
            sleeps,
            vec![ms(100), ms(200), ms(400), ms(800), ms(1000), ms(1000)]
        );
    }

    #[test]
    fn test_min_interval_is_a_floor() {
        let spec = WaitSpec::new(Duration::from_secs(60))
            .backoff(ms(100), Duration::from_secs(10))
            .min_interval(Duration::from_secs(3));
        let sleeps: Vec<Duration> = PollSchedule::new(&spec).take(8).collect();
        assert_eq!(sleeps[0], Duration::from_secs(3));
        assert_eq!(sleeps[5], ms(3200));
        assert_eq!(sleeps[7], Duration::from_secs(10));
    }

    #[test]
    fn test_min_interval_above_ceiling_wins() {
        let spec = WaitSpec::new(Duration::from_secs(60))
            .backoff(ms(100), Duration::from_secs(10))
            .min_interval(Duration::from_secs(30));
        assert!(PollSchedule::new(&spec)
            .take(10)
            .all(|sleep| sleep == Duration::from_secs(30)));
    }

    #[test]
    fn test_fixed_poll_interval() {
        let spec = WaitSpec::new(Duration::from_secs(60)).poll_interval(Duration::from_secs(2));
        assert!(PollSchedule::new(&spec)
            .take(5)
            .all(|sleep| sleep == Duration::from_secs(2)));
    }

    #[test]
    fn test_fixed_poll_interval_is_floored() {
        let spec = WaitSpec::new(Duration::from_secs(60))
            .min_interval(Duration::from_secs(10))
            .poll_interval(Duration::from_secs(2));
        assert!(PollSchedule::new(&spec)
            .take(5)
            .all(|sleep| sleep == Duration::from_secs(10)));
    }

    #[test]
    fn test_oversized_poll_interval_is_ignored() {
        let spec = WaitSpec::new(Duration::from_secs(600)).poll_interval(Duration::from_secs(200));
        let mut schedule = PollSchedule::new(&spec);
        assert_eq!(schedule.advance(), ms(100));
    }

    #[test]
    fn test_hold_repeats_last_sleep() {
        let spec = WaitSpec::new(Duration::from_secs(60));
        let mut schedule = PollSchedule::new(&spec);
        assert_eq!(schedule.hold(), ms(100));
        assert_eq!(schedule.advance(), ms(200));
        assert_eq!(schedule.hold(), ms(200));
        assert_eq!(schedule.hold(), ms(200));
        assert_eq!(schedule.advance(), ms(400));
    }

    proptest! {
        #[test]
        fn prop_schedule_is_monotonic_and_floored(
            initial in 1u64..5_000,
            ceiling in 1u64..60_000,
            floor in 0u64..20_000,
            steps in 1usize..40,
        ) {
            let spec = WaitSpec::new(Duration::from_secs(3600))
                .backoff(ms(initial), ms(ceiling))
                .min_interval(ms(floor));
            let sleeps: Vec<Duration> = PollSchedule::new(&spec).take(steps).collect();
            for pair in sleeps.windows(2) {
                prop_assert!(pair[0] <= pair[1]);
            }
            for sleep in &sleeps {
                prop_assert!(*sleep >= ms(floor));
                prop_assert!(*sleep <= ms(ceiling.max(floor)));
            }
        }
    }
}
