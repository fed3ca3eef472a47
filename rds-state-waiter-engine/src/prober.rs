//! Status probers: the single remote query a wait repeats.

use crate::error::ProbeError;
use crate::observation::Observation;
use async_trait::async_trait;
use std::future::Future;

/// Performs one status query against the remote control plane.
///
/// Implementations must return promptly and must be safe to call
/// repeatedly. Absence of the resource is reported as
/// [`Observation::Absent`]; any other missing information is an error.
#[async_trait]
pub trait StatusProber: Send + Sync {
    /// The resource description handed back to the caller on completion.
    type Output: Send;

    async fn probe(&self) -> Result<Observation<Self::Output>, ProbeError>;
}

/// Adapts an async closure into a [`StatusProber`].
pub struct ProbeFn<F> {
    f: F,
}

impl<F> ProbeFn<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut, T> StatusProber for ProbeFn<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Observation<T>, ProbeError>> + Send,
    T: Send,
{
    type Output = T;

    async fn probe(&self) -> Result<Observation<T>, ProbeError> {
        (self.f)().await
    }
}
