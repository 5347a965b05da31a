//! This module defines the properties and storage of collision event records
//!
//! Each object kind is stored as a set of index-aligned parallel arrays, the
//! way the reconstruction framework writes them out. An index is only valid
//! within its own event and its own object kind.

use crate::numeric::Float;
use eyre::ensure;
use particle_id::ParticleID;
use serde::{de::Error, Deserialize, Deserializer};

/// Kinematics shared by every object kind
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Kinematics {
    /// Transverse momentum (GeV)
    pub pt: Vec<Float>,

    /// Pseudorapidity
    pub eta: Vec<Float>,

    /// Azimuth
    pub phi: Vec<Float>,

    /// Mass (GeV)
    pub mass: Vec<Float>,
}
//
impl Kinematics {
    /// Number of objects
    pub fn len(&self) -> usize {
        self.pt.len()
    }

    /// Check that all kinematic arrays share the same index space
    fn check(&self, kind: &str) -> eyre::Result<()> {
        let n = self.len();
        ensure!(
            self.eta.len() == n && self.phi.len() == n && self.mass.len() == n,
            "{kind} kinematic arrays have mismatched lengths (pt: {}, eta: {}, phi: {}, mass: {})",
            n,
            self.eta.len(),
            self.phi.len(),
            self.mass.len()
        );
        Ok(())
    }
}

/// Reconstructed electrons
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Electrons {
    /// Electron kinematics
    #[serde(flatten)]
    pub kin: Kinematics,

    /// Cut-based identification tier (0 = fail ... 4 = tight)
    pub cut_based: Vec<u8>,

    /// Relative isolation in a ΔR = 0.3 cone
    pub rel_iso: Vec<Float>,
}

/// Reconstructed muons
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Muons {
    /// Muon kinematics
    #[serde(flatten)]
    pub kin: Kinematics,

    /// Loose identification flag
    pub loose_id: Vec<bool>,

    /// Tight identification flag
    pub tight_id: Vec<bool>,

    /// Relative isolation in a ΔR = 0.4 cone
    pub rel_iso: Vec<Float>,
}

/// Reconstructed jets
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Jets {
    /// Jet kinematics
    #[serde(flatten)]
    pub kin: Kinematics,

    /// Tight identification with lepton veto
    pub tight_lep_veto_id: Vec<bool>,

    /// b-tagging discriminant score
    pub btag_score: Vec<Float>,
}

/// Missing transverse momentum
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct MissingMomentum {
    /// Magnitude (GeV)
    pub pt: Float,

    /// Azimuth
    pub phi: Float,
}

/// Generator-level truth particles
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenParticles {
    /// Truth particle kinematics
    #[serde(flatten)]
    pub kin: Kinematics,

    /// Particle species
    #[serde(deserialize_with = "deserialize_species")]
    pub pdg_id: Vec<ParticleID>,

    /// Generator status code
    pub status: Vec<i32>,

    /// Index of the immediate parent, negative if there is none
    pub mother: Vec<i32>,
}
//
impl GenParticles {
    /// Index of the immediate parent of a particle, if it is a valid one
    pub fn mother_of(&self, idx: usize) -> Option<usize> {
        let mother = usize::try_from(self.mother[idx]).ok()?;
        (mother < self.kin.len()).then_some(mother)
    }
}

/// Decode PDG codes, rejecting those which have no antiparticle code
fn deserialize_species<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<ParticleID>, D::Error> {
    Vec::<i32>::deserialize(deserializer)?
        .into_iter()
        .map(|code| match code.checked_abs() {
            Some(_) => Ok(ParticleID::new(code)),
            None => Err(D::Error::custom(format!("PDG code {code} is out of range"))),
        })
        .collect()
}

/// One collision event
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Event {
    /// Reconstructed electrons
    pub electrons: Electrons,

    /// Reconstructed muons
    pub muons: Muons,

    /// Reconstructed jets
    pub jets: Jets,

    /// Missing transverse momentum
    pub met: MissingMomentum,

    /// Truth record, only present in simulated samples
    pub gen: Option<GenParticles>,
}
//
impl Event {
    /// Check that every object kind has index-aligned arrays
    pub fn validate(&self) -> eyre::Result<()> {
        let check_len = |kind: &str, what: &str, len: usize, expected: usize| -> eyre::Result<()> {
            ensure!(
                len == expected,
                "{kind} array {what} has {len} entries, expected {expected}"
            );
            Ok(())
        };

        let ele = &self.electrons;
        ele.kin.check("electron")?;
        check_len("electron", "cut_based", ele.cut_based.len(), ele.kin.len())?;
        check_len("electron", "rel_iso", ele.rel_iso.len(), ele.kin.len())?;

        let mu = &self.muons;
        mu.kin.check("muon")?;
        check_len("muon", "loose_id", mu.loose_id.len(), mu.kin.len())?;
        check_len("muon", "tight_id", mu.tight_id.len(), mu.kin.len())?;
        check_len("muon", "rel_iso", mu.rel_iso.len(), mu.kin.len())?;

        let jets = &self.jets;
        jets.kin.check("jet")?;
        check_len("jet", "tight_lep_veto_id", jets.tight_lep_veto_id.len(), jets.kin.len())?;
        check_len("jet", "btag_score", jets.btag_score.len(), jets.kin.len())?;

        if let Some(gen) = &self.gen {
            gen.kin.check("gen particle")?;
            check_len("gen particle", "pdg_id", gen.pdg_id.len(), gen.kin.len())?;
            check_len("gen particle", "status", gen.status.len(), gen.kin.len())?;
            check_len("gen particle", "mother", gen.mother.len(), gen.kin.len())?;
        }
        Ok(())
    }
}

/// Hand-built events for unit tests
#[cfg(test)]
pub mod testing {
    use super::*;

    /// Push one electron into an event
    pub fn add_electron(ev: &mut Event, pt: Float, eta: Float, phi: Float, tier: u8, iso: Float) {
        let ele = &mut ev.electrons;
        push_kin(&mut ele.kin, pt, eta, phi, 0.000511);
        ele.cut_based.push(tier);
        ele.rel_iso.push(iso);
    }

    /// Push one muon into an event
    pub fn add_muon(ev: &mut Event, pt: Float, eta: Float, phi: Float, loose: bool, tight: bool, iso: Float) {
        let mu = &mut ev.muons;
        push_kin(&mut mu.kin, pt, eta, phi, 0.1057);
        mu.loose_id.push(loose);
        mu.tight_id.push(tight);
        mu.rel_iso.push(iso);
    }

    /// Push one identified jet into an event
    pub fn add_jet(ev: &mut Event, pt: Float, eta: Float, phi: Float, btag: Float) {
        let jets = &mut ev.jets;
        push_kin(&mut jets.kin, pt, eta, phi, 10.);
        jets.tight_lep_veto_id.push(true);
        jets.btag_score.push(btag);
    }

    /// Push one truth particle into an event
    pub fn add_gen(ev: &mut Event, pdg: i32, mother: i32, pt: Float, eta: Float, phi: Float) {
        let gen = ev.gen.get_or_insert_with(GenParticles::default);
        push_kin(&mut gen.kin, pt, eta, phi, 0.);
        gen.pdg_id.push(ParticleID::new(pdg));
        gen.status.push(1);
        gen.mother.push(mother);
    }

    fn push_kin(kin: &mut Kinematics, pt: Float, eta: Float, phi: Float, mass: Float) {
        kin.pt.push(pt);
        kin.eta.push(eta);
        kin.phi.push(phi);
        kin.mass.push(mass);
    }

    /// Event with no loose lepton, two b-tagged jets at 150 and 90 GeV and a
    /// MET of 50 GeV, which passes the whole selection
    pub fn signal_like() -> Event {
        let mut ev = Event::default();
        add_jet(&mut ev, 150., 0.5, 0.3, 0.5);
        add_jet(&mut ev, 90., -0.8, 2.9, 0.5);
        ev.met = MissingMomentum { pt: 50., phi: -1.2 };
        ev
    }
}

#[cfg(test)]
mod tests {
    use super::{testing::*, *};

    #[test]
    fn hand_built_events_are_valid() {
        let mut ev = signal_like();
        add_electron(&mut ev, 25., 0.1, 0.2, 3, 0.05);
        add_muon(&mut ev, 12., 1.0, 1.0, true, false, 0.3);
        add_gen(&mut ev, 25, -1, 30., 0., 0.);
        ev.validate().unwrap();
    }

    #[test]
    fn misaligned_arrays_are_rejected() {
        let mut ev = signal_like();
        ev.jets.btag_score.pop();
        let err = ev.validate().unwrap_err();
        assert!(err.to_string().contains("btag_score"));

        let mut ev = signal_like();
        ev.jets.kin.eta.push(0.);
        assert!(ev.validate().is_err());
    }

    #[test]
    fn mother_index_bounds() {
        let mut ev = Event::default();
        add_gen(&mut ev, 25, -1, 30., 0., 0.);
        add_gen(&mut ev, 36, 0, 20., 0., 0.);
        add_gen(&mut ev, 36, 7, 20., 0., 0.);
        let gen = ev.gen.as_ref().unwrap();
        assert_eq!(gen.mother_of(0), None);
        assert_eq!(gen.mother_of(1), Some(0));
        assert_eq!(gen.mother_of(2), None);
    }

    #[test]
    fn deserialize_partial_record() {
        let ev: Event = serde_json::from_str(
            r#"{"jets": {"pt": [40.0], "eta": [0.1], "phi": [0.2], "mass": [5.0],
                         "tight_lep_veto_id": [true], "btag_score": [0.9]},
                "met": {"pt": 12.5, "phi": 0.4}}"#,
        )
        .unwrap();
        ev.validate().unwrap();
        assert_eq!(ev.jets.kin.len(), 1);
        assert_eq!(ev.electrons.kin.len(), 0);
        assert_eq!(ev.met.pt, 12.5);
        assert!(ev.gen.is_none());
    }

    #[test]
    fn deserialize_truth_species() {
        let ev: Event = serde_json::from_str(
            r#"{"gen": {"pt": [40.0, 20.0], "eta": [0.0, 0.5], "phi": [0.0, 1.0], "mass": [125.0, 4.8],
                        "pdg_id": [25, -5], "status": [62, 23], "mother": [-1, 0]}}"#,
        )
        .unwrap();
        ev.validate().unwrap();
        let gen = ev.gen.unwrap();
        assert_eq!(gen.pdg_id, vec![ParticleID::new(25), ParticleID::new(-5)]);
        assert_eq!(gen.pdg_id[1].abs(), ParticleID::new(5));

        let bad = format!(
            r#"{{"gen": {{"pt": [1.0], "eta": [0.0], "phi": [0.0], "mass": [0.0],
                         "pdg_id": [{}], "status": [1], "mother": [-1]}}}}"#,
            i32::MIN
        );
        let err = serde_json::from_str::<Event>(&bad).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }
}
