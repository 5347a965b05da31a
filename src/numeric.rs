//! Basic numerical concepts used throughout the program

#![allow(missing_docs)]

// Floating-point precision is configured here
#[cfg(feature = "f32")]
pub type Float = f32;
#[cfg(feature = "f32")]
pub use std::f32 as floats;
#[cfg(not(feature = "f32"))]
pub type Float = f64;
#[cfg(not(feature = "f32"))]
pub use std::f64 as floats;

/// Tolerance used when comparing floating-point results in tests
#[cfg(test)]
pub const TEST_EPSILON: Float = if cfg!(feature = "f32") { 1e-4 } else { 1e-9 };
