//! Mechanism to apply an ordered sequence of cuts to selected events
//!
//! The selection is a list of named stages. An event is counted at every stage
//! whose predicate it satisfies, and is abandoned at the first stage whose
//! predicate fails. Reordering, adding or removing cuts therefore only
//! requires editing the stage list.

use crate::{
    event::Event,
    numeric::Float,
    selection::ObjectSelection,
};

/// Selection state of one event, as seen by the cut predicates
pub struct SelectedEvent<'ev> {
    /// Event record
    pub event: &'ev Event,

    /// Electron selection
    pub electrons: ObjectSelection,

    /// Muon selection
    pub muons: ObjectSelection,

    /// Jet selection, before lepton cleaning
    pub jets: ObjectSelection,

    /// Jets surviving lepton cleaning, by decreasing pT
    pub clean_jets: Vec<usize>,
}
//
impl SelectedEvent<'_> {
    /// Number of loose leptons of any flavour
    pub fn num_loose_leptons(&self) -> usize {
        self.electrons.loose_count + self.muons.loose_count
    }

    /// Truth that a jet passes the b-tagging working point
    pub fn is_btagged(&self, jet: usize, cuts: &EventCuts) -> bool {
        self.event.jets.btag_score[jet] > cuts.btag_min_score
    }

    /// n-th leading cleaned jet (0-based), if any
    pub fn clean_jet(&self, rank: usize) -> Option<usize> {
        self.clean_jets.get(rank).copied()
    }
}

/// Thresholds of the event-level cuts
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EventCuts {
    /// Minimal number of cleaned jets
    pub min_jets: usize,

    /// Leading cleaned jet must have a pT above this (GeV)
    pub leading_jet_pt_min: Float,

    /// b-tagging working point: jets with a discriminant above it are tagged
    pub btag_min_score: Float,

    /// Missing transverse momentum must lie below this (GeV)
    pub met_max: Float,
}
//
impl Default for EventCuts {
    fn default() -> Self {
        Self {
            min_jets: 2,
            leading_jet_pt_min: 100.,
            btag_min_score: 0.38,
            met_max: 140.,
        }
    }
}

/// Predicate deciding whether an event survives a stage
pub type CutPredicate = fn(&SelectedEvent, &EventCuts) -> bool;

/// One named stage of the cutflow
#[derive(Clone, Copy)]
pub struct CutStage {
    /// Label used when reporting the cutflow
    pub label: &'static str,

    /// Survival criterion
    pub predicate: CutPredicate,
}

fn raw(_: &SelectedEvent, _: &EventCuts) -> bool {
    true
}

fn no_loose_lepton(ev: &SelectedEvent, _: &EventCuts) -> bool {
    ev.num_loose_leptons() == 0
}

fn enough_jets(ev: &SelectedEvent, cuts: &EventCuts) -> bool {
    ev.clean_jets.len() >= cuts.min_jets
}

fn hard_leading_jet(ev: &SelectedEvent, cuts: &EventCuts) -> bool {
    ev.clean_jet(0)
        .map_or(false, |j1| ev.event.jets.kin.pt[j1] > cuts.leading_jet_pt_min)
}

fn two_leading_btagged(ev: &SelectedEvent, cuts: &EventCuts) -> bool {
    match (ev.clean_jet(0), ev.clean_jet(1)) {
        (Some(j1), Some(j2)) => ev.is_btagged(j1, cuts) && ev.is_btagged(j2, cuts),
        _ => false,
    }
}

fn low_met(ev: &SelectedEvent, cuts: &EventCuts) -> bool {
    ev.event.met.pt < cuts.met_max
}

/// Ordered list of cut stages
pub struct Cutflow {
    stages: Vec<CutStage>,
}
//
impl Cutflow {
    /// Build a cutflow from an explicit list of stages
    pub fn new(stages: Vec<CutStage>) -> Self {
        Self { stages }
    }

    /// The selection of the H → AA → 4b analysis
    pub fn standard() -> Self {
        Self::new(vec![
            CutStage { label: "Raw", predicate: raw },
            CutStage { label: "Cut1: veto loose ℓ", predicate: no_loose_lepton },
            CutStage { label: "Cut2: N_{jet}>=2", predicate: enough_jets },
            CutStage { label: "Cut3: p_{T}(J1)>100", predicate: hard_leading_jet },
            CutStage { label: "Cut4: 2 b-tag jets", predicate: two_leading_btagged },
            CutStage { label: "Cut5: MET<140 GeV", predicate: low_met },
        ])
    }

    /// Stages, in evaluation order
    pub fn stages(&self) -> &[CutStage] {
        &self.stages
    }

    /// Stage labels, in evaluation order
    pub fn labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.stages.iter().map(|stage| stage.label)
    }

    /// Run an event through the stages, counting it at each stage it reaches
    ///
    /// Returns the truth that the event survived every stage.
    ///
    pub fn apply(&self, event: &SelectedEvent, cuts: &EventCuts, counts: &mut CutflowCounts) -> bool {
        debug_assert_eq!(counts.0.len(), self.stages.len());
        for (stage, count) in self.stages.iter().zip(counts.0.iter_mut()) {
            if !(stage.predicate)(event, cuts) {
                return false;
            }
            *count += 1;
        }
        true
    }
}

/// Number of events surviving each stage of a cutflow
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CutflowCounts(Vec<u64>);
//
impl CutflowCounts {
    /// Zeroed counters for a given cutflow
    pub fn new(cutflow: &Cutflow) -> Self {
        Self(vec![0; cutflow.stages().len()])
    }

    /// Survivor count of each stage
    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }

    /// Integrate counts from another run over disjoint events
    pub fn merge(&mut self, other: &Self) {
        assert_eq!(self.0.len(), other.0.len(), "Cannot merge different cutflows");
        for (mine, theirs) in self.0.iter_mut().zip(&other.0) {
            *mine += theirs;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cleaning::{clean_jets, DEFAULT_OVERLAP_DR},
        event::testing::*,
        selection::{select_electrons, select_jets, select_muons, JetCuts, LeptonCuts},
    };

    fn selected(event: &Event) -> SelectedEvent<'_> {
        let leptons = LeptonCuts::default();
        let electrons = select_electrons(&event.electrons, &leptons);
        let muons = select_muons(&event.muons, &leptons);
        let jets = select_jets(&event.jets, &JetCuts::default());
        let clean_jets = clean_jets(event, &jets.tight, &electrons.tight, &muons.tight, DEFAULT_OVERLAP_DR);
        SelectedEvent { event, electrons, muons, jets, clean_jets }
    }

    fn run(events: &[Event]) -> CutflowCounts {
        let cutflow = Cutflow::standard();
        let mut counts = CutflowCounts::new(&cutflow);
        for event in events {
            cutflow.apply(&selected(event), &EventCuts::default(), &mut counts);
        }
        counts
    }

    #[test]
    fn signal_like_event_survives() {
        assert_eq!(run(&[signal_like()]).as_slice(), &[1, 1, 1, 1, 1, 1]);
    }

    #[test]
    fn loose_muon_is_vetoed() {
        let mut ev = signal_like();
        add_muon(&mut ev, 15., 1.5, -2.0, true, false, 0.5);
        assert_eq!(run(&[ev]).as_slice(), &[1, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn single_btag_fails_cut4() {
        let mut ev = signal_like();
        ev.jets.btag_score[1] = 0.2;
        assert_eq!(run(&[ev]).as_slice(), &[1, 1, 1, 1, 0, 0]);
    }

    #[test]
    fn stage_edges() {
        // Leading jet exactly at the threshold fails the strict cut
        let mut soft = signal_like();
        soft.jets.kin.pt[0] = 100.;
        // MET exactly at the threshold fails the strict cut
        let mut high_met = signal_like();
        high_met.met.pt = 140.;
        // A single jet fails the multiplicity cut
        let mut monojet = signal_like();
        monojet.jets.kin.pt[1] = 10.;
        let counts = run(&[soft, high_met, monojet]);
        assert_eq!(counts.as_slice(), &[3, 3, 2, 1, 1, 0]);
    }

    #[test]
    fn counts_never_increase_along_stages() {
        let mut events = Vec::new();
        for i in 0..40 {
            let mut ev = signal_like();
            ev.jets.kin.pt[0] = 60. + 5. * (i as Float);
            ev.jets.btag_score[1] = 0.01 * ((i * 7) % 100) as Float;
            ev.met.pt = 3.5 * (i as Float);
            if i % 5 == 0 {
                add_electron(&mut ev, 11., 0.3, 0.3, 1, 0.4);
            }
            events.push(ev);
        }
        let counts = run(&events);
        assert_eq!(counts.as_slice()[0], 40);
        for pair in counts.as_slice().windows(2) {
            assert!(pair[0] >= pair[1]);
        }
    }

    #[test]
    fn custom_stage_lists() {
        let cutflow = Cutflow::new(vec![
            CutStage { label: "Raw", predicate: raw },
            CutStage { label: "MET", predicate: low_met },
            CutStage { label: "Lepton veto", predicate: no_loose_lepton },
        ]);
        assert_eq!(cutflow.labels().collect::<Vec<_>>(), ["Raw", "MET", "Lepton veto"]);
        let mut ev = signal_like();
        add_electron(&mut ev, 30., 0., 0., 4, 0.01);
        let mut counts = CutflowCounts::new(&cutflow);
        assert!(!cutflow.apply(&selected(&ev), &EventCuts::default(), &mut counts));
        assert_eq!(counts.as_slice(), &[1, 1, 0]);
    }

    #[test]
    fn merging_counts() {
        let mut a = run(&[signal_like()]);
        let b = run(&[signal_like(), Event::default()]);
        a.merge(&b);
        assert_eq!(a.as_slice(), &[3, 3, 2, 2, 2, 2]);
    }
}
