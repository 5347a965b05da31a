//! Removal of jets overlapping with selected leptons

use crate::{
    event::{Event, Kinematics},
    geometry::delta_r,
    numeric::Float,
};

/// Default ΔR below which a jet is considered to overlap with a lepton
pub const DEFAULT_OVERLAP_DR: Float = 0.4;

/// Filter a list of jets, dropping those closer than `overlap_dr` to any of the
/// selected electrons or muons
///
/// The relative order of the surviving jets is preserved.
///
pub fn clean_jets(
    event: &Event,
    jets: &[usize],
    electrons: &[usize],
    muons: &[usize],
    overlap_dr: Float,
) -> Vec<usize> {
    let jet_kin = &event.jets.kin;
    let overlaps = |jet: usize, leptons: &Kinematics, selected: &[usize]| {
        selected.iter().any(|&lep| {
            delta_r(jet_kin.eta[jet], jet_kin.phi[jet], leptons.eta[lep], leptons.phi[lep]) < overlap_dr
        })
    };
    jets.iter()
        .copied()
        .filter(|&jet| {
            !overlaps(jet, &event.muons.kin, muons) && !overlaps(jet, &event.electrons.kin, electrons)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        event::testing::*,
        numeric::floats::consts::PI,
        selection::{select_electrons, select_jets, select_muons, JetCuts, LeptonCuts},
    };

    fn busy_event() -> Event {
        let mut ev = Event::default();
        add_jet(&mut ev, 120., 0.0, 0.0, 0.9);
        add_jet(&mut ev, 100., 1.0, 1.0, 0.9);
        add_jet(&mut ev, 80., -1.0, 3.1, 0.9);
        add_jet(&mut ev, 60., 2.0, -2.0, 0.9);
        // Electron right on top of jet 0
        add_electron(&mut ev, 50., 0.1, 0.1, 4, 0.01);
        // Muon across the φ = ±π seam from jet 2
        add_muon(&mut ev, 40., -1.0, -3.1, true, true, 0.01);
        // Muon just outside the cone of jet 3
        add_muon(&mut ev, 30., 2.0, -2.0 + 0.41, true, true, 0.01);
        ev
    }

    #[test]
    fn overlapping_jets_are_removed() {
        let ev = busy_event();
        let leptons = LeptonCuts::default();
        let ele = select_electrons(&ev.electrons, &leptons);
        let mu = select_muons(&ev.muons, &leptons);
        let jets = select_jets(&ev.jets, &JetCuts::default());
        let clean = clean_jets(&ev, &jets.tight, &ele.tight, &mu.tight, DEFAULT_OVERLAP_DR);
        assert_eq!(clean, vec![1, 3]);
    }

    #[test]
    fn no_leptons_keeps_all_jets() {
        let ev = busy_event();
        let jets = [3, 0, 2];
        assert_eq!(clean_jets(&ev, &jets, &[], &[], DEFAULT_OVERLAP_DR), vec![3, 0, 2]);
        assert!(clean_jets(&ev, &[], &[0], &[0, 1], DEFAULT_OVERLAP_DR).is_empty());
    }

    #[test]
    fn cleaning_is_idempotent() {
        let ev = busy_event();
        let jets = [0, 1, 2, 3];
        let once = clean_jets(&ev, &jets, &[0], &[0, 1], DEFAULT_OVERLAP_DR);
        let twice = clean_jets(&ev, &once, &[0], &[0, 1], DEFAULT_OVERLAP_DR);
        assert_eq!(once, twice);
        // Larger cones can only remove more jets
        let wide = clean_jets(&ev, &jets, &[0], &[0, 1], PI);
        assert!(wide.len() <= once.len());
    }
}
