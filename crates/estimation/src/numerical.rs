//! Central finite differences.
//!
//! Used to check analytic partials and to obtain partials for parameters
//! that have no analytic implementation.

use nalgebra::{DMatrix, DVector};

/// Derivative of a scalar function at `x` by central difference.
///
/// # Errors
///
/// Returns the first error from `f`.
pub fn central_difference<E>(
    mut f: impl FnMut(f64) -> Result<f64, E>,
    x: f64,
    step: f64,
) -> Result<f64, E> {
    let up = f(x + step)?;
    let down = f(x - step)?;
    Ok((up - down) / (2.0 * step))
}

/// Jacobian of a vector function at `x` by central differences, using
/// `steps[j]` as the perturbation of component `j`.
///
/// # Panics
///
/// Panics if `steps` and `x` have different lengths.
///
/// # Errors
///
/// Returns the first error from `f`.
pub fn central_difference_jacobian<E>(
    mut f: impl FnMut(&DVector<f64>) -> Result<DVector<f64>, E>,
    x: &DVector<f64>,
    steps: &[f64],
) -> Result<DMatrix<f64>, E> {
    assert_eq!(x.len(), steps.len(), "one step per component is required");

    let mut columns = Vec::with_capacity(x.len());
    for (j, step) in steps.iter().enumerate() {
        let mut up = x.clone();
        up[j] += step;
        let mut down = x.clone();
        down[j] -= step;
        columns.push((f(&up)? - f(&down)?) / (2.0 * step));
    }
    Ok(DMatrix::from_columns(&columns))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::convert::Infallible;

    use approx::assert_relative_eq;
    use nalgebra::{dmatrix, dvector};

    #[test]
    fn scalar_derivative() {
        let derivative = central_difference(|x: f64| Ok::<_, Infallible>(x.sin()), 0.3, 1e-5).unwrap();
        assert_relative_eq!(derivative, 0.3_f64.cos(), max_relative = 1e-9);
    }

    #[test]
    fn jacobian_of_linear_map_is_exact() {
        let a = dmatrix![1.0, 2.0; -3.0, 0.5; 4.0, 0.0];
        let jacobian = central_difference_jacobian(
            |x| Ok::<_, Infallible>(&a * x),
            &dvector![0.7, -1.1],
            &[0.1, 10.0],
        )
        .unwrap();
        assert_relative_eq!(jacobian, a, epsilon = 1e-12);
    }

    #[test]
    fn errors_propagate() {
        let result = central_difference(|x| if x > 0.0 { Err("positive") } else { Ok(x) }, 0.0, 1.0);
        assert_eq!(result, Err("positive"));
    }
}
