/// Control actions an observer can return from the Euler solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stop integrating and return the history recorded so far.
    StopEarly,
}
