//! Reconstruction of the di-b-jet candidate and of event-level observables
//! for events passing the full selection

use crate::{
    cutflow::{EventCuts, SelectedEvent},
    event::Jets,
    geometry::delta_phi,
    momentum::{self, Momentum},
    numeric::Float,
    selection::sort_by_pt,
};
use prefix_num_ops::real::*;

/// Composite candidate built by summing two jet 4-momenta
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate(Momentum);
//
impl Candidate {
    /// Combine two jets of an event
    pub fn from_jets(jets: &Jets, j1: usize, j2: usize) -> Self {
        Self(jet_momentum(jets, j1) + jet_momentum(jets, j2))
    }

    /// Invariant mass (GeV), never negative
    pub fn mass(&self) -> Float {
        momentum::mass(&self.0)
    }

    /// Transverse momentum (GeV)
    pub fn pt(&self) -> Float {
        momentum::pt(&self.0)
    }

    /// Pseudorapidity
    pub fn eta(&self) -> Float {
        momentum::eta(&self.0)
    }

    /// Azimuth
    pub fn phi(&self) -> Float {
        momentum::phi(&self.0)
    }
}

/// 4-momentum of a reconstructed jet
fn jet_momentum(jets: &Jets, idx: usize) -> Momentum {
    let kin = &jets.kin;
    momentum::from_pt_eta_phi_m(kin.pt[idx], kin.eta[idx], kin.phi[idx], kin.mass[idx])
}

/// Observables of an event which passed the whole cutflow
#[derive(Clone, Debug, PartialEq)]
pub struct FinalObservables {
    /// Sum of the two leading cleaned jets
    pub candidate: Candidate,

    /// b-tagged cleaned jets, by decreasing pT
    pub bjets: Vec<usize>,

    /// Scalar pT sum of all cleaned jets
    pub ht: Float,

    /// Scalar pT sum of the two leading b-jets
    pub ht_2b: Float,

    /// HT + missing transverse momentum
    pub st: Float,

    /// |Δφ(J1, J2)|
    pub dphi_j1_j2: Float,

    /// |Δφ(MET, candidate)|
    pub dphi_met_candidate: Float,

    /// |Δφ(MET, J1)|
    pub dphi_met_j1: Float,
}
//
impl FinalObservables {
    /// Compute the observables of a selected event
    ///
    /// Returns `None` if the event does not even have two cleaned jets, which
    /// cannot happen for events passing the standard cutflow.
    ///
    pub fn reconstruct(ev: &SelectedEvent, cuts: &EventCuts) -> Option<Self> {
        let jet1 = ev.clean_jet(0)?;
        let jet2 = ev.clean_jet(1)?;
        let jets = &ev.event.jets;
        let pt = &jets.kin.pt;
        let met = ev.event.met;

        let candidate = Candidate::from_jets(jets, jet1, jet2);

        let mut bjets: Vec<usize> = ev
            .clean_jets
            .iter()
            .copied()
            .filter(|&jet| ev.is_btagged(jet, cuts))
            .collect();
        sort_by_pt(&mut bjets, pt);

        let ht: Float = ev.clean_jets.iter().map(|&jet| pt[jet]).sum();
        // With fewer than two b-jets, fall back to the jets that were tested
        // by the double b-tag cut
        let ht_2b = match bjets[..] {
            [b1, b2, ..] => pt[b1] + pt[b2],
            _ => pt[jet1] + pt[jet2],
        };
        let st = ht + met.pt;

        let phi = &jets.kin.phi;
        Some(Self {
            candidate,
            bjets,
            ht,
            ht_2b,
            st,
            dphi_j1_j2: abs(delta_phi(phi[jet1], phi[jet2])),
            dphi_met_candidate: abs(delta_phi(met.phi, candidate.phi())),
            dphi_met_j1: abs(delta_phi(met.phi, phi[jet1])),
        })
    }
}
