//! Physical constants shared across crates (SI units).

/// Speed of light in vacuum, in meters per second.
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Standard gravitational acceleration used to define specific impulse, in
/// meters per second squared.
pub const STANDARD_GRAVITY: f64 = 9.806_65;
