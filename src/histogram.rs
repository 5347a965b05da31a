//! Fixed-binning 1D histograms and the named set of distributions filled by
//! the analysis

use crate::numeric::{floats::consts::PI, Float};
use std::collections::BTreeMap;

/// 1D histogram with uniform binning, underflow and overflow
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram {
    /// Human-readable description
    title: &'static str,

    /// Number of regular bins
    num_bins: usize,

    /// Lower edge of the first bin
    x_min: Float,

    /// Upper edge of the last bin
    x_max: Float,

    /// Sum of weights, with underflow first and overflow last
    sum_w: Vec<Float>,

    /// Sum of squared weights, laid out like sum_w
    sum_w2: Vec<Float>,

    /// Number of fills
    entries: u64,
}
//
impl Histogram {
    /// Set up an empty histogram
    pub fn new(title: &'static str, num_bins: usize, x_min: Float, x_max: Float) -> Self {
        assert!(num_bins > 0, "A histogram needs at least one bin");
        assert!(x_max > x_min, "Histogram range must not be empty");
        Self {
            title,
            num_bins,
            x_min,
            x_max,
            sum_w: vec![0.; num_bins + 2],
            sum_w2: vec![0.; num_bins + 2],
            entries: 0,
        }
    }

    /// Index of the storage slot receiving a value
    ///
    /// NaN ends up in the underflow slot.
    ///
    fn slot(&self, x: Float) -> usize {
        if !(x >= self.x_min) {
            0
        } else if x >= self.x_max {
            self.num_bins + 1
        } else {
            let rel = (x - self.x_min) / (self.x_max - self.x_min);
            // Round-off may push values right below x_max into the overflow
            1 + ((rel * self.num_bins as Float) as usize).min(self.num_bins - 1)
        }
    }

    /// Record a value with a given weight
    pub fn fill(&mut self, x: Float, weight: Float) {
        let slot = self.slot(x);
        self.sum_w[slot] += weight;
        self.sum_w2[slot] += weight * weight;
        self.entries += 1;
    }

    /// Integrate the contents of another histogram with the same binning
    pub fn merge(&mut self, other: &Self) {
        assert!(
            self.num_bins == other.num_bins && self.x_min == other.x_min && self.x_max == other.x_max,
            "Cannot merge histograms with different binnings"
        );
        for (mine, theirs) in self.sum_w.iter_mut().zip(&other.sum_w) {
            *mine += theirs;
        }
        for (mine, theirs) in self.sum_w2.iter_mut().zip(&other.sum_w2) {
            *mine += theirs;
        }
        self.entries += other.entries;
    }

    /// Description of the histogram
    pub fn title(&self) -> &'static str {
        self.title
    }

    /// Number of regular bins
    pub fn num_bins(&self) -> usize {
        self.num_bins
    }

    /// Histogram range
    pub fn range(&self) -> (Float, Float) {
        (self.x_min, self.x_max)
    }

    /// Lower edge of a regular bin
    pub fn bin_low_edge(&self, bin: usize) -> Float {
        self.x_min + (self.x_max - self.x_min) * (bin as Float) / (self.num_bins as Float)
    }

    /// Sum of weights in a regular bin
    pub fn bin_content(&self, bin: usize) -> Float {
        self.sum_w[bin + 1]
    }

    /// Statistical uncertainty on a regular bin
    pub fn bin_error(&self, bin: usize) -> Float {
        self.sum_w2[bin + 1].sqrt()
    }

    /// Sum of weights below the range
    pub fn underflow(&self) -> Float {
        self.sum_w[0]
    }

    /// Sum of weights above the range
    pub fn overflow(&self) -> Float {
        self.sum_w[self.num_bins + 1]
    }

    /// Number of fills
    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Sum of weights within the range
    pub fn integral(&self) -> Float {
        self.sum_w[1..=self.num_bins].iter().sum()
    }
}

/// Distributions of the analysis, indexed by their stable name
#[derive(Clone, Debug, PartialEq)]
pub struct HistogramSet(BTreeMap<&'static str, Histogram>);
//
impl HistogramSet {
    /// Empty set
    #[cfg(test)]
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Add a distribution to the set
    pub fn book(&mut self, name: &'static str, title: &'static str, num_bins: usize, x_min: Float, x_max: Float) {
        let previous = self.0.insert(name, Histogram::new(title, num_bins, x_min, x_max));
        debug_assert!(previous.is_none(), "Distribution {name} booked twice");
    }

    /// Every distribution of the H → AA → 4b analysis
    pub fn book_standard() -> Self {
        let mut set = Self(BTreeMap::new());

        // Kinematics of a truth particle or reconstructed object
        let book_kinematics = |set: &mut Self, names: [&'static str; 4], what: &'static str, pt_max: Float, m_max: Float| {
            let [pt, eta, phi, m] = names;
            set.book(pt, what, 100, 0., pt_max);
            set.book(eta, what, 60, -5., 5.);
            set.book(phi, what, 16, -3.2, 3.2);
            if !m.is_empty() {
                set.book(m, what, 100, 0., m_max);
            }
        };

        // Truth level, unweighted
        book_kinematics(&mut set, ["h_pt_H", "h_eta_H", "h_phi_H", "h_m_H"], "Higgs (H)", 500., 200.);
        book_kinematics(&mut set, ["h_pt_A1", "h_eta_A1", "h_phi_A1", "h_m_A1"], "A_{1} (from H)", 500., 50.);
        book_kinematics(&mut set, ["h_pt_A2", "h_eta_A2", "h_phi_A2", "h_m_A2"], "A_{2} (from H)", 500., 50.);
        set.book("h_dR_AA", "#DeltaR(A_{1},A_{2})", 60, 0., 6.);
        set.book("h_dR_bb_A1", "#DeltaR(b,b) from A_{1}", 60, 0., 6.);
        set.book("h_dR_bb_A2", "#DeltaR(b,b) from A_{2}", 60, 0., 6.);
        for names in TRUTH_QUARK_NAMES {
            book_kinematics(&mut set, names, "b quark from A", 500., 10.);
        }

        // Reconstructed objects before selection, weighted
        set.book("h_nEle", "Electron multiplicity", 10, 0., 10.);
        set.book("h_nMu", "Muon multiplicity", 10, 0., 10.);
        set.book("h_nJet", "Jet multiplicity", 20, 0., 20.);
        for names in ELECTRON_NAMES {
            book_kinematics(&mut set, [names[0], names[1], names[2], ""], "electron", 500., 0.);
        }
        for names in MUON_NAMES {
            book_kinematics(&mut set, [names[0], names[1], names[2], ""], "muon", 500., 0.);
        }
        for names in JET_NAMES {
            book_kinematics(&mut set, [names[0], names[1], names[2], ""], "jet", 1000., 0.);
        }
        set.book("h_MET", "Puppi MET (before sel)", 100, 0., 500.);
        set.book("h_MET_phi", "Puppi MET #phi (before sel)", 64, -3.2, 3.2);
        set.book("h_dR_J1_e1", "#DeltaR(J_{1}, e_{1})", 60, 0., 6.);
        set.book("h_dR_J1_mu1", "#DeltaR(J_{1}, #mu_{1})", 60, 0., 6.);
        set.book("h_dR_J1_e1_clean", "#DeltaR(J_{1}^{clean}, e_{1})", 60, 0., 6.);
        set.book("h_dR_J1_mu1_clean", "#DeltaR(J_{1}^{clean}, #mu_{1})", 60, 0., 6.);

        // Reconstructed quantities after all cuts, weighted
        set.book("h_dphi_J1J2", "|#Delta#phi(J_{1},J_{2})| (after all cuts)", 64, 0., PI);
        set.book("h_m_2b", "Invariant mass of two b-tagged jets (after all cuts)", 100, 0., 500.);
        set.book("h_pt_2b", "p_{T} of two b-tagged jets (after all cuts)", 100, 0., 1000.);
        set.book("h_eta_2b", "#eta of two b-tagged jets (after all cuts)", 60, -5., 5.);
        set.book("h_MET_after", "Puppi MET (after all cuts)", 100, 0., 500.);
        for (i, [pt, eta, m]) in BJET_NAMES.into_iter().enumerate() {
            let title = if i == 0 { "Leading b-tagged jet" } else { "Subleading b-tagged jet" };
            set.book(pt, title, 100, 0., 1000.);
            set.book(eta, title, 60, -5., 5.);
            set.book(m, title, 100, 0., 100.);
        }
        set.book("h_Nbjets_after", "b-tagged jet multiplicity (after all cuts)", 10, 0., 10.);
        set.book("h_HT", "H_{T} (after all cuts)", 100, 0., 2000.);
        set.book("h_HT_2b", "H_{T}^{2b} (after all cuts)", 100, 0., 2000.);
        set.book("h_ST", "S_{T} = H_{T} + p_{T}^{miss} (after all cuts)", 100, 0., 2500.);
        set.book("h_dphi_MET_bb", "|#Delta#phi(MET,bb)| (after all cuts)", 64, 0., PI);
        set.book("h_dphi_MET_J1", "|#Delta#phi(MET,J_{1})| (after all cuts)", 64, 0., PI);

        set
    }

    /// Access a distribution by name
    pub fn get(&self, name: &str) -> Option<&Histogram> {
        self.0.get(name)
    }

    /// Record a value into a named distribution
    pub fn fill(&mut self, name: &str, x: Float, weight: Float) {
        match self.0.get_mut(name) {
            Some(hist) => hist.fill(x, weight),
            None => debug_assert!(false, "Distribution {name} was never booked"),
        }
    }

    /// Integrate the contents of another set with the same distributions
    pub fn merge(&mut self, other: &Self) {
        for (name, theirs) in &other.0 {
            match self.0.get_mut(name) {
                Some(mine) => mine.merge(theirs),
                None => {
                    self.0.insert(*name, theirs.clone());
                }
            }
        }
    }

    /// Iterate over the distributions, in name order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Histogram)> + '_ {
        self.0.iter().map(|(&name, hist)| (name, hist))
    }

    /// Number of distributions
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Names of the (pT, η, φ, m) distributions of the four leading truth quarks
pub const TRUTH_QUARK_NAMES: [[&str; 4]; 4] = [
    ["h_pt_b1", "h_eta_b1", "h_phi_b1", "h_m_b1"],
    ["h_pt_b2", "h_eta_b2", "h_phi_b2", "h_m_b2"],
    ["h_pt_b3", "h_eta_b3", "h_phi_b3", "h_m_b3"],
    ["h_pt_b4", "h_eta_b4", "h_phi_b4", "h_m_b4"],
];

/// Names of the (pT, η, φ) distributions of the two leading electrons
pub const ELECTRON_NAMES: [[&str; 3]; 2] = [
    ["h_pt_e1", "h_eta_e1", "h_phi_e1"],
    ["h_pt_e2", "h_eta_e2", "h_phi_e2"],
];

/// Names of the (pT, η, φ) distributions of the two leading muons
pub const MUON_NAMES: [[&str; 3]; 2] = [
    ["h_pt_mu1", "h_eta_mu1", "h_phi_mu1"],
    ["h_pt_mu2", "h_eta_mu2", "h_phi_mu2"],
];

/// Names of the (pT, η, φ) distributions of the four leading jets
pub const JET_NAMES: [[&str; 3]; 4] = [
    ["h_pt_J1", "h_eta_J1", "h_phi_J1"],
    ["h_pt_J2", "h_eta_J2", "h_phi_J2"],
    ["h_pt_J3", "h_eta_J3", "h_phi_J3"],
    ["h_pt_J4", "h_eta_J4", "h_phi_J4"],
];

/// Names of the (pT, η, m) distributions of the two leading b-jets after cuts
pub const BJET_NAMES: [[&str; 3]; 2] = [
    ["h_pt_bjet1", "h_eta_bjet1", "h_m_bjet1"],
    ["h_pt_bjet2", "h_eta_bjet2", "h_m_bjet2"],
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binning() {
        let mut hist = Histogram::new("test", 10, 0., 10.);
        hist.fill(-1., 1.);
        hist.fill(0., 2.);
        hist.fill(9.999, 0.5);
        hist.fill(10., 3.);
        hist.fill(Float::NAN, 1.);
        hist.fill(4.5, 2.);
        hist.fill(4.2, 2.);
        assert_eq!(hist.entries(), 7);
        assert_eq!(hist.underflow(), 2.);
        assert_eq!(hist.overflow(), 3.);
        assert_eq!(hist.bin_content(0), 2.);
        assert_eq!(hist.bin_content(9), 0.5);
        assert_eq!(hist.bin_content(4), 4.);
        assert_eq!(hist.bin_error(4), (8. as Float).sqrt());
        assert_eq!(hist.integral(), 6.5);
        assert_eq!(hist.bin_low_edge(4), 4.);
    }

    #[test]
    fn merging() {
        let mut a = Histogram::new("a", 4, -2., 2.);
        let mut b = a.clone();
        a.fill(-1.5, 1.);
        b.fill(-1.5, 2.);
        b.fill(5., 1.);
        a.merge(&b);
        assert_eq!(a.bin_content(0), 3.);
        assert_eq!(a.overflow(), 1.);
        assert_eq!(a.entries(), 3);
        assert_eq!(a.bin_error(0), (5. as Float).sqrt());
    }

    #[test]
    #[should_panic]
    fn merging_different_binnings() {
        let mut a = Histogram::new("a", 4, -2., 2.);
        a.merge(&Histogram::new("b", 5, -2., 2.));
    }

    #[test]
    fn standard_booking() {
        let set = HistogramSet::book_standard();
        // 12 truth boson kinematics + 3 truth ΔR + 16 truth quark kinematics
        // + 3 multiplicities + 24 object kinematics + 2 MET + 4 ΔR(J1, ℓ1)
        // + 17 after-cuts distributions
        assert_eq!(set.len(), 12 + 3 + 16 + 3 + 24 + 2 + 4 + 17);
        assert_eq!(set.get("h_m_2b").unwrap().range(), (0., 500.));
        assert_eq!(set.get("h_nJet").unwrap().num_bins(), 20);
        assert!(set.get("h_m_e1").is_none());
    }

    #[test]
    fn set_fill_and_merge() {
        let mut a = HistogramSet::book_standard();
        let mut b = HistogramSet::book_standard();
        a.fill("h_HT", 250., 2.);
        b.fill("h_HT", 255., 2.);
        a.merge(&b);
        assert_eq!(a.get("h_HT").unwrap().entries(), 2);
        assert_eq!(a.get("h_HT").unwrap().bin_content(12), 4.);

        let mut empty = HistogramSet::empty();
        empty.merge(&a);
        assert_eq!(empty, a);
    }
}
