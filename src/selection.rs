//! Mechanism to select reconstructed objects passing kinematic, identification
//! and isolation requirements

use crate::{
    event::{Electrons, Jets, Kinematics, Muons},
    numeric::Float,
};
use eyre::{bail, Result};
use prefix_num_ops::real::*;
use std::{fmt, str::FromStr};

/// Electron cut-based identification tiers, from loosest to tightest
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
#[repr(u8)]
pub enum ElectronId {
    Fail = 0,
    Veto = 1,
    Loose = 2,
    Medium = 3,
    Tight = 4,
}
//
impl ElectronId {
    /// Truth that a stored cut-based code reaches this tier
    pub fn accepts(self, code: u8) -> bool {
        code >= self as u8
    }
}
//
impl FromStr for ElectronId {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.to_lowercase().as_str() {
            "fail" => Self::Fail,
            "veto" => Self::Veto,
            "loose" => Self::Loose,
            "medium" => Self::Medium,
            "tight" => Self::Tight,
            other => bail!("Unknown electron identification tier {other:?}"),
        })
    }
}
//
impl fmt::Display for ElectronId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fail => "fail",
            Self::Veto => "veto",
            Self::Loose => "loose",
            Self::Medium => "medium",
            Self::Tight => "tight",
        };
        f.write_str(name)
    }
}

/// Window in transverse momentum and pseudorapidity
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KinematicGate {
    /// Minimal transverse momentum (GeV)
    pub pt_min: Float,

    /// Maximal absolute pseudorapidity
    pub eta_max: Float,

    /// Whether the window edges are themselves accepted
    pub inclusive: bool,
}
//
impl KinematicGate {
    /// Window accepting its edges (pT ≥ pt_min, |η| ≤ eta_max)
    pub fn inclusive(pt_min: Float, eta_max: Float) -> Self {
        Self { pt_min, eta_max, inclusive: true }
    }

    /// Window rejecting its edges (pT > pt_min, |η| < eta_max)
    pub fn exclusive(pt_min: Float, eta_max: Float) -> Self {
        Self { pt_min, eta_max, inclusive: false }
    }

    /// Decide whether an object lies within the window
    pub fn accepts(&self, pt: Float, eta: Float) -> bool {
        let abs_eta = abs(eta);
        if self.inclusive {
            pt >= self.pt_min && abs_eta <= self.eta_max
        } else {
            pt > self.pt_min && abs_eta < self.eta_max
        }
    }
}

/// Requirements on charged leptons
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LeptonCuts {
    /// Window for leptons entering the analysis
    pub tight: KinematicGate,

    /// Window for leptons entering the loose lepton veto
    pub loose: KinematicGate,

    /// Maximal relative isolation of tight leptons
    pub rel_iso_max: Float,

    /// Identification tier required from tight electrons
    pub electron_tight_id: ElectronId,

    /// Identification tier required from loose electrons
    pub electron_loose_id: ElectronId,
}
//
impl Default for LeptonCuts {
    fn default() -> Self {
        Self {
            tight: KinematicGate::inclusive(20., 2.5),
            loose: KinematicGate::exclusive(10., 2.5),
            rel_iso_max: 0.15,
            electron_tight_id: ElectronId::Medium,
            electron_loose_id: ElectronId::Veto,
        }
    }
}

/// Requirements on jets
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JetCuts {
    /// Acceptance window
    pub gate: KinematicGate,
}
//
impl Default for JetCuts {
    fn default() -> Self {
        Self {
            gate: KinematicGate::inclusive(20., 2.5),
        }
    }
}

/// Outcome of object selection for one kind of object in one event
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectSelection {
    /// Number of objects passing the loose requirements
    pub loose_count: usize,

    /// Objects passing the full requirements, by decreasing pT
    pub tight: Vec<usize>,
}
//
impl ObjectSelection {
    /// Leading selected object, if any
    pub fn leading(&self) -> Option<usize> {
        self.tight.first().copied()
    }
}

/// Shared selection loop
///
/// Counts the objects accepted by `loose`, collects those accepted by
/// `tight`, and ranks the latter by decreasing pT. The sort is stable, so
/// objects of equal pT keep their original relative order.
///
fn select(
    kin: &Kinematics,
    loose: impl Fn(usize) -> bool,
    tight: impl Fn(usize) -> bool,
) -> ObjectSelection {
    let mut selection = ObjectSelection::default();
    for idx in 0..kin.len() {
        if loose(idx) {
            selection.loose_count += 1;
        }
        if tight(idx) {
            selection.tight.push(idx);
        }
    }
    sort_by_pt(&mut selection.tight, &kin.pt);
    selection
}

/// Order object indices by decreasing transverse momentum (stable)
pub fn sort_by_pt(indices: &mut [usize], pt: &[Float]) {
    indices.sort_by(|&a, &b| pt[b].total_cmp(&pt[a]));
}

/// Select electrons
pub fn select_electrons(ele: &Electrons, cuts: &LeptonCuts) -> ObjectSelection {
    let kin = &ele.kin;
    select(
        kin,
        |i| cuts.loose.accepts(kin.pt[i], kin.eta[i]) && cuts.electron_loose_id.accepts(ele.cut_based[i]),
        |i| {
            cuts.tight.accepts(kin.pt[i], kin.eta[i])
                && cuts.electron_tight_id.accepts(ele.cut_based[i])
                && ele.rel_iso[i] < cuts.rel_iso_max
        },
    )
}

/// Select muons
pub fn select_muons(mu: &Muons, cuts: &LeptonCuts) -> ObjectSelection {
    let kin = &mu.kin;
    select(
        kin,
        |i| cuts.loose.accepts(kin.pt[i], kin.eta[i]) && mu.loose_id[i],
        |i| cuts.tight.accepts(kin.pt[i], kin.eta[i]) && mu.tight_id[i] && mu.rel_iso[i] < cuts.rel_iso_max,
    )
}

/// Select jets
///
/// Jets have neither a loose tier nor an isolation requirement, so the loose
/// count of the result is always zero.
///
pub fn select_jets(jets: &Jets, cuts: &JetCuts) -> ObjectSelection {
    let kin = &jets.kin;
    select(
        kin,
        |_| false,
        |i| cuts.gate.accepts(kin.pt[i], kin.eta[i]) && jets.tight_lep_veto_id[i],
    )
}
