//! This module implements some domain-specific 4-momentum handling logic.
//!
//! Collider objects are stored in the (pT, η, φ, m) parametrization, while
//! composite candidates are built by summing cartesian 4-vectors, so this
//! module converts back and forth between the two.

use crate::{geometry, numeric::Float};
use nalgebra::{vector, SVector};
use prefix_num_ops::real::*;

/// 4-momentum dimension
pub const MOMENTUM_DIM: usize = 4;

/// Relativistic 4-momentum
pub type Momentum = SVector<Float, MOMENTUM_DIM>;

/// Convenience const for accessing the X coordinate of a 4-vector
pub const X: usize = 0;

/// Convenience const for accessing the Y coordinate of a 4-vector
pub const Y: usize = 1;

/// Convenience const for accessing the Z coordinate of a 4-vector
pub const Z: usize = 2;

/// Convenience const for accessing the E coordinate of a 4-vector
pub const E: usize = 3;

/// Build a 4-momentum from transverse momentum, pseudorapidity, azimuth and
/// mass
pub fn from_pt_eta_phi_m(pt: Float, eta: Float, phi: Float, mass: Float) -> Momentum {
    let px = pt * phi.cos();
    let py = pt * phi.sin();
    let pz = pt * eta.sinh();
    let p_abs = pt * eta.cosh();
    let energy = sqrt(p_abs * p_abs + mass * mass);
    vector![px, py, pz, energy]
}

/// Transverse momentum of a 4-vector
pub fn pt(p: &Momentum) -> Float {
    p.fixed_rows::<2>(X).norm()
}

/// Azimuth of a 4-vector, in (-π, π]
pub fn phi(p: &Momentum) -> Float {
    if p[X] == 0. && p[Y] == 0. {
        return 0.;
    }
    // atan2 yields [-π, π], fold the lower edge onto the upper one
    geometry::delta_phi(p[Y].atan2(p[X]), 0.)
}

/// Pseudorapidity of a 4-vector
///
/// A vector along the beam axis has infinite pseudorapidity, with the sign of
/// its longitudinal momentum. The null vector is given a pseudorapidity of 0.
///
pub fn eta(p: &Momentum) -> Float {
    let pt = pt(p);
    if pt == 0. {
        return if p[Z] == 0. { 0. } else { Float::INFINITY.copysign(p[Z]) };
    }
    (p[Z] / pt).asinh()
}

/// Invariant mass of a 4-vector
///
/// Round-off can make the squared mass of (nearly) massless systems slightly
/// negative. Such spacelike results are clamped to zero.
///
pub fn mass(p: &Momentum) -> Float {
    let m2 = p[E] * p[E] - p.fixed_rows::<3>(X).norm_squared();
    if m2 > 0. {
        sqrt(m2)
    } else {
        0.
    }
}
