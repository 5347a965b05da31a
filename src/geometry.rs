//! Angular distances in the (η, φ) plane

use crate::numeric::{floats::consts::PI, Float};
use prefix_num_ops::real::*;

/// Azimuthal difference φ1 - φ2, reduced into (-π, π]
///
/// The reduction is done in a single step, so arbitrarily large raw
/// differences are handled without looping.
///
pub fn delta_phi(phi1: Float, phi2: Float) -> Float {
    let two_pi = 2. * PI;
    let reduced = (phi1 - phi2 + PI).rem_euclid(two_pi) - PI;
    // rem_euclid lands in [0, 2π), which maps onto [-π, π)
    if reduced <= -PI {
        reduced + two_pi
    } else {
        reduced
    }
}

/// Angular distance ΔR = √(Δη² + Δφ²) between two objects
pub fn delta_r(eta1: Float, phi1: Float, eta2: Float, phi2: Float) -> Float {
    let d_eta = eta1 - eta2;
    let d_phi = delta_phi(phi1, phi2);
    sqrt(d_eta * d_eta + d_phi * d_phi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::TEST_EPSILON;

    /// Check that two angular quantities agree, with a tolerance that grows
    /// with the magnitude of the angles that went into them
    fn assert_close(a: Float, b: Float, magnitude: Float) {
        assert!(abs(a - b) <= TEST_EPSILON * (1. + abs(magnitude)), "{a} != {b}");
    }

    #[test]
    fn delta_phi_range() {
        for &raw in &[0., 0.5, -0.5, 3.0, -3.0, 3.5, -3.5, 7.0, -7.0, 100.0, -100.0] {
            let d = delta_phi(raw, 0.);
            assert!(d > -PI && d <= PI, "delta_phi({raw}) = {d}");
            // The reduced value must differ from the raw one by whole turns
            let turns = (raw - d) / (2. * PI);
            assert_close(turns, turns.round(), raw);
        }
    }

    #[test]
    fn delta_phi_boundary() {
        assert!(abs(delta_phi(PI, 0.) - PI) < TEST_EPSILON);
        assert!(abs(delta_phi(-PI, 0.) - PI) < TEST_EPSILON);
        assert!(abs(delta_phi(0.1, -0.1) - 0.2) < TEST_EPSILON);
    }

    #[test]
    fn delta_r_is_symmetric() {
        let pts = [(0.3, 2.9), (-1.7, -3.0), (2.4, 0.1), (0., 6.0)];
        for &(eta1, phi1) in &pts {
            for &(eta2, phi2) in &pts {
                let ab = delta_r(eta1, phi1, eta2, phi2);
                let ba = delta_r(eta2, phi2, eta1, phi1);
                assert!(ab >= 0.);
                assert!(abs(ab - ba) < TEST_EPSILON);
            }
        }
    }

    #[test]
    fn delta_r_periodic_in_phi() {
        let base = delta_r(0.5, 2.8, -0.4, -2.9);
        for k in -3..=3 {
            let shift = 2. * PI * (k as Float);
            assert_close(delta_r(0.5, 2.8 + shift, -0.4, -2.9), base, shift);
            assert_close(delta_r(0.5, 2.8, -0.4, -2.9 + shift), base, shift);
        }
        // Across the φ = ±π seam, the short way round is used
        let expected = sqrt(0.9 * 0.9 + (2. * PI - 5.7) * (2. * PI - 5.7));
        assert_close(base, expected, PI);
    }
}
