//! Per-event analysis pipeline: truth matching, object selection, jet
//! cleaning, cutflow and final reconstruction

use crate::{
    cleaning::clean_jets,
    config::Configuration,
    cutflow::{Cutflow, SelectedEvent},
    event::{Event, GenParticles, Kinematics},
    geometry::delta_r,
    histogram::{BJET_NAMES, ELECTRON_NAMES, JET_NAMES, MUON_NAMES, TRUTH_QUARK_NAMES},
    numeric::Float,
    reco::FinalObservables,
    resacc::ResultsAccumulator,
    selection::{select_electrons, select_jets, select_muons},
    truth::{DecayChain, DecaySpecies},
};

/// Event processing kernel, shared by all the workers of a run
pub struct Analysis<'cfg> {
    /// Configuration of the analysis
    cfg: &'cfg Configuration,

    /// Stages of the event selection
    cutflow: Cutflow,

    /// Decay chain looked for in the truth record
    species: DecaySpecies,

    /// Whether truth-level distributions should be filled
    truth_enabled: bool,
}
//
impl<'cfg> Analysis<'cfg> {
    /// Set up the analysis
    pub fn new(cfg: &'cfg Configuration, truth_enabled: bool) -> Self {
        Self {
            cfg,
            cutflow: Cutflow::standard(),
            species: DecaySpecies::default(),
            truth_enabled,
        }
    }

    /// Set up an empty results accumulator for this analysis
    pub fn accumulator(&self, weight: Float) -> ResultsAccumulator<'_> {
        ResultsAccumulator::new(&self.cutflow, weight)
    }

    /// Run one event through the analysis, recording its contribution
    pub fn process(&self, event: &Event, acc: &mut ResultsAccumulator) {
        acc.count_event();

        if self.truth_enabled {
            if let Some(gen) = &event.gen {
                self.fill_truth(gen, acc);
            }
        }

        let selected = self.select(event);
        self.fill_before_cuts(&selected, acc);

        if !self.cutflow.apply(&selected, &self.cfg.event_cuts, acc.counts_mut()) {
            return;
        }
        if let Some(obs) = FinalObservables::reconstruct(&selected, &self.cfg.event_cuts) {
            fill_after_cuts(&selected, &obs, acc);
        }
    }

    /// Select objects and clean jets
    fn select<'ev>(&self, event: &'ev Event) -> SelectedEvent<'ev> {
        let cfg = self.cfg;
        let electrons = select_electrons(&event.electrons, &cfg.leptons);
        let muons = select_muons(&event.muons, &cfg.leptons);
        let jets = select_jets(&event.jets, &cfg.jets);
        let clean_jets = clean_jets(event, &jets.tight, &electrons.tight, &muons.tight, cfg.overlap_dr);
        SelectedEvent {
            event,
            electrons,
            muons,
            jets,
            clean_jets,
        }
    }

    /// Fill the unweighted truth-level distributions
    fn fill_truth(&self, gen: &GenParticles, acc: &mut ResultsAccumulator) {
        let Some(chain) = DecayChain::find(gen, &self.species) else {
            return;
        };
        let kin = &gen.kin;
        let mut fill_particle = |names: [&str; 4], idx: usize| {
            let [pt, eta, phi, m] = names;
            acc.fill(pt, kin.pt[idx]);
            acc.fill(eta, kin.eta[idx]);
            acc.fill(phi, kin.phi[idx]);
            acc.fill(m, kin.mass[idx]);
        };
        fill_particle(["h_pt_H", "h_eta_H", "h_phi_H", "h_m_H"], chain.mother);
        fill_particle(["h_pt_A1", "h_eta_A1", "h_phi_A1", "h_m_A1"], chain.daughters[0]);
        fill_particle(["h_pt_A2", "h_eta_A2", "h_phi_A2", "h_m_A2"], chain.daughters[1]);
        for (names, &quark) in TRUTH_QUARK_NAMES.into_iter().zip(chain.leading_quarks(4)) {
            fill_particle(names, quark);
        }

        acc.fill("h_dR_AA", chain.daughter_separation(gen));
        for (daughter, name) in ["h_dR_bb_A1", "h_dR_bb_A2"].into_iter().enumerate() {
            if let Some(dr) = chain.quark_pair_separation(gen, daughter) {
                acc.fill(name, dr);
            }
        }
    }

    /// Fill the weighted distributions of selected objects, before any cut
    fn fill_before_cuts(&self, sel: &SelectedEvent, acc: &mut ResultsAccumulator) {
        let event = sel.event;
        acc.fill_weighted("h_nEle", sel.electrons.tight.len() as Float);
        acc.fill_weighted("h_nMu", sel.muons.tight.len() as Float);
        acc.fill_weighted("h_nJet", sel.jets.tight.len() as Float);

        fill_leading(acc, &ELECTRON_NAMES, &event.electrons.kin, &sel.electrons.tight);
        fill_leading(acc, &MUON_NAMES, &event.muons.kin, &sel.muons.tight);
        fill_leading(acc, &JET_NAMES, &event.jets.kin, &sel.jets.tight);

        acc.fill_weighted("h_MET", event.met.pt);
        acc.fill_weighted("h_MET_phi", event.met.phi);

        // Distance between the leading jet and the leading leptons, before and
        // after jet cleaning
        let jet_lepton_dr = |acc: &mut ResultsAccumulator, jet: Option<usize>, names: [&str; 2]| {
            let Some(jet) = jet else { return };
            let jets = &event.jets.kin;
            let leptons = [
                (&event.electrons.kin, &sel.electrons),
                (&event.muons.kin, &sel.muons),
            ];
            for (name, (kin, selection)) in names.into_iter().zip(leptons) {
                if let Some(lep) = selection.leading() {
                    acc.fill_weighted(name, delta_r(jets.eta[jet], jets.phi[jet], kin.eta[lep], kin.phi[lep]));
                }
            }
        };
        jet_lepton_dr(acc, sel.jets.leading(), ["h_dR_J1_e1", "h_dR_J1_mu1"]);
        jet_lepton_dr(acc, sel.clean_jet(0), ["h_dR_J1_e1_clean", "h_dR_J1_mu1_clean"]);
    }
}

/// Fill (pT, η, φ) of the leading selected objects of one kind
fn fill_leading(acc: &mut ResultsAccumulator, names: &[[&str; 3]], kin: &Kinematics, selected: &[usize]) {
    for (&[pt, eta, phi], &idx) in names.iter().zip(selected) {
        acc.fill_weighted(pt, kin.pt[idx]);
        acc.fill_weighted(eta, kin.eta[idx]);
        acc.fill_weighted(phi, kin.phi[idx]);
    }
}

/// Fill the weighted distributions of events passing all cuts
fn fill_after_cuts(sel: &SelectedEvent, obs: &FinalObservables, acc: &mut ResultsAccumulator) {
    let event = sel.event;
    let jets = &event.jets.kin;

    acc.fill_weighted("h_dphi_J1J2", obs.dphi_j1_j2);
    acc.fill_weighted("h_m_2b", obs.candidate.mass());
    acc.fill_weighted("h_pt_2b", obs.candidate.pt());
    acc.fill_weighted("h_eta_2b", obs.candidate.eta());
    acc.fill_weighted("h_MET_after", event.met.pt);

    acc.fill_weighted("h_Nbjets_after", obs.bjets.len() as Float);
    for ([pt, eta, m], &bjet) in BJET_NAMES.into_iter().zip(&obs.bjets) {
        acc.fill_weighted(pt, jets.pt[bjet]);
        acc.fill_weighted(eta, jets.eta[bjet]);
        acc.fill_weighted(m, jets.mass[bjet]);
    }

    acc.fill_weighted("h_HT", obs.ht);
    acc.fill_weighted("h_HT_2b", obs.ht_2b);
    acc.fill_weighted("h_ST", obs.st);
    acc.fill_weighted("h_dphi_MET_bb", obs.dphi_met_candidate);
    acc.fill_weighted("h_dphi_MET_J1", obs.dphi_met_j1);
}
