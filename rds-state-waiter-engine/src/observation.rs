//! The result of a single status probe.

/// What one probe saw.
///
/// `Absent` is the only way a prober reports that the resource does not
/// exist. For deletion waits (empty target set) it is the success signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation<T> {
    Present { state: String, value: T },
    Absent,
}

impl<T> Observation<T> {
    pub fn present(state: impl Into<String>, value: T) -> Self {
        Self::Present {
            state: state.into(),
            value,
        }
    }

    pub fn state(&self) -> Option<&str> {
        match self {
            Self::Present { state, .. } => Some(state),
            Self::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Present { value, .. } => Some(value),
            Self::Absent => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Present { value, .. } => Some(value),
            Self::Absent => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_accessor() {
        let observed = Observation::present("available", 1);
        assert_eq!(observed.state(), Some("available"));
        assert!(!observed.is_absent());
        assert_eq!(observed.value(), Some(&1));
        assert_eq!(observed.into_value(), Some(1));

        let gone: Observation<i32> = Observation::Absent;
        assert_eq!(gone.state(), None);
        assert!(gone.is_absent());
        assert_eq!(gone.into_value(), None);
    }
}
