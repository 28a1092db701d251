use skein_core::Observer;

use crate::traits::{CanStopEarly, HasStepOutcome};

/// Stops a run once it has taken a given number of accepted steps.
///
/// Rejected attempts do not count towards the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepLimit {
    max_steps: usize,
    steps: usize,
}

impl StepLimit {
    #[must_use]
    pub fn new(max_steps: usize) -> Self {
        Self {
            max_steps,
            steps: 0,
        }
    }

    /// Accepted steps observed so far.
    #[must_use]
    pub fn steps(&self) -> usize {
        self.steps
    }
}

impl<E: HasStepOutcome, A: CanStopEarly> Observer<E, A> for StepLimit {
    fn observe(&mut self, event: &E) -> Option<A> {
        if event.is_accepted() {
            self.steps += 1;
        }
        (self.steps >= self.max_steps).then(A::stop_early)
    }
}

impl<E: HasStepOutcome, A: CanStopEarly> Observer<E, A> for &mut StepLimit {
    fn observe(&mut self, event: &E) -> Option<A> {
        <StepLimit as Observer<E, A>>::observe(*self, event)
    }
}
