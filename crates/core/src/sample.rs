use nalgebra::DVector;

/// A captured `(time, state)` pair from a propagation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample<T> {
    pub time: T,
    pub state: DVector<f64>,
}

impl<T> Sample<T> {
    /// Creates a new sample.
    pub fn new(time: T, state: DVector<f64>) -> Self {
        Self { time, state }
    }
}
