use skein_core::Observer;
use tracing::debug;

use crate::traits::{HasStepOutcome, HasTime};

/// Emits a `debug` event for every step and counts accepted and rejected
/// steps. Never changes the course of the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepTracer {
    accepted: usize,
    rejected: usize,
}

impl StepTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn accepted(&self) -> usize {
        self.accepted
    }

    #[must_use]
    pub fn rejected(&self) -> usize {
        self.rejected
    }
}

impl<E: HasTime + HasStepOutcome, A> Observer<E, A> for StepTracer {
    fn observe(&mut self, event: &E) -> Option<A> {
        let accepted = event.is_accepted();
        if accepted {
            self.accepted += 1;
        } else {
            self.rejected += 1;
        }
        debug!(time = event.time(), accepted, "integrator step");
        None
    }
}

impl<E: HasTime + HasStepOutcome, A> Observer<E, A> for &mut StepTracer {
    fn observe(&mut self, event: &E) -> Option<A> {
        <StepTracer as Observer<E, A>>::observe(*self, event)
    }
}
