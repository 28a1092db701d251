/// Control actions an observer can return from the Runge-Kutta solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stop integrating and return the history recorded so far.
    ///
    /// Returned from a rejection event, the step in progress is abandoned.
    StopEarly,
}
