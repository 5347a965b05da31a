//! Normalization of the simulated sample to the expected event yield

use crate::numeric::Float;

/// Conversion factor from pb × fb⁻¹ to a number of events
const PB_TIMES_INV_FB: Float = 1.0e3;

/// Inputs of the per-event weight
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Normalization {
    /// Integrated luminosity (fb⁻¹)
    pub luminosity: Float,

    /// Production cross-section of the sample (pb)
    pub cross_section: Float,
}
//
impl Default for Normalization {
    fn default() -> Self {
        Self {
            luminosity: 108.96,
            cross_section: 48.58,
        }
    }
}
//
impl Normalization {
    /// Number of events expected in data
    pub fn expected_events(&self) -> Float {
        self.cross_section * self.luminosity * PB_TIMES_INV_FB
    }

    /// Weight of each event of a sample with `observed` records
    pub fn event_weight(&self, observed: usize) -> Float {
        event_weight(self.expected_events(), observed)
    }
}

/// Weight turning `observed` records into `expected` events
///
/// An empty sample gets a unit weight.
///
pub fn event_weight(expected: Float, observed: usize) -> Float {
    if observed == 0 {
        1.0
    } else {
        expected / observed as Float
    }
}
