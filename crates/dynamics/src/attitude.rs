//! Attitude representations and their kinematics.
//!
//! Attitudes rotate body-frame vectors into the inertial frame. Quaternions are
//! stored in states as `[w, x, y, z]`. The exponential map `φ` is the rotation
//! vector: axis times angle, with `‖φ‖ ≤ π` after shadowing.

use std::f64::consts::PI;

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

/// Below this angle the closed forms switch to Taylor series.
const SMALL_ANGLE: f64 = 1e-2;

/// Converts a quaternion to the equivalent exponential map.
///
/// The result has norm at most `π`; `q` and `-q` map to the same vector.
#[must_use]
pub fn quaternion_to_exponential_map(q: &UnitQuaternion<f64>) -> Vector3<f64> {
    let (w, v) = if q.w < 0.0 {
        (-q.w, -q.imag())
    } else {
        (q.w, q.imag())
    };

    let s = v.norm();
    let scale = if s < 1e-6 {
        // θ/s with θ = 2 atan2(s, w), expanded for small s.
        2.0 / w * (1.0 - s * s / (3.0 * w * w))
    } else {
        2.0 * s.atan2(w) / s
    };
    v * scale
}

/// Converts an exponential map to a unit quaternion.
#[must_use]
pub fn exponential_map_to_quaternion(phi: &Vector3<f64>) -> UnitQuaternion<f64> {
    let theta = phi.norm();
    let half = 0.5 * theta;
    let scale = if theta < SMALL_ANGLE {
        let theta2 = theta * theta;
        0.5 - theta2 / 48.0 + theta2 * theta2 / 3840.0
    } else {
        half.sin() / theta
    };
    UnitQuaternion::new_unchecked(Quaternion::from_parts(half.cos(), phi * scale))
}

/// Time derivative of the exponential map for a body-frame angular velocity.
///
/// Computes `φ̇ = ω + ½ φ×ω + c(θ) φ×(φ×ω)`, the inverse right Jacobian of
/// the rotation applied to `ω`, with `c(θ) = (1 − (θ/2) cot(θ/2)) / θ²`.
#[must_use]
pub fn exponential_map_rate(phi: &Vector3<f64>, omega: &Vector3<f64>) -> Vector3<f64> {
    let theta = phi.norm();
    let c = if theta < SMALL_ANGLE {
        let theta2 = theta * theta;
        1.0 / 12.0 + theta2 / 720.0 + theta2 * theta2 / 30240.0
    } else {
        let half = 0.5 * theta;
        (1.0 - half / half.tan()) / (theta * theta)
    };
    let cross = phi.cross(omega);
    omega + 0.5 * cross + c * phi.cross(&cross)
}

/// Time derivative of a quaternion for a body-frame angular velocity,
/// `q̇ = ½ q ⊗ (0, ω)`.
#[must_use]
pub fn quaternion_rate(q: &Quaternion<f64>, omega: &Vector3<f64>) -> Quaternion<f64> {
    q * Quaternion::from_imag(*omega) * 0.5
}

/// Maps an exponential map with `‖φ‖ ≥ π` to its shadow, the equivalent
/// rotation vector of norm `2π − ‖φ‖`.
///
/// Returns `None` if `φ` is already inside the ball of radius `π`.
#[must_use]
pub fn shadow(phi: &Vector3<f64>) -> Option<Vector3<f64>> {
    let theta = phi.norm();
    (theta >= PI).then(|| phi * (1.0 - 2.0 * PI / theta))
}
