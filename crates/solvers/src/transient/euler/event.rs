use skein_core::Sample;

/// Event emitted by the Euler solver for each sample.
///
/// Step 0 is the initial state before any integration.
/// Steps 1..N are emitted after each integration step.
#[derive(Debug, Clone)]
pub struct Event<T> {
    /// The step number (0 for initial, 1..N for integration steps).
    pub step: usize,

    /// Time and state after this step.
    pub sample: Sample<T>,
}
