//! Generator-level matching of the H → AA → bbbb decay chain

use crate::{
    event::GenParticles,
    geometry::delta_r,
    numeric::Float,
    selection::sort_by_pt,
};
use particle_id::ParticleID;
use std::collections::BTreeMap;

/// PDG code of the Higgs boson
const PDG_HIGGS: i32 = 25;

/// PDG code of the CP-odd A boson
const PDG_A: i32 = 36;

/// PDG code of the b quark
const PDG_B: i32 = 5;

/// Species making up the decay chain
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecaySpecies {
    /// Species of the decaying mother
    pub mother: ParticleID,

    /// Species of the intermediate daughters
    pub intermediate: ParticleID,

    /// Quark flavour of the final decay products (either charge)
    pub quark: ParticleID,
}
//
impl Default for DecaySpecies {
    fn default() -> Self {
        Self {
            mother: ParticleID::new(PDG_HIGGS),
            intermediate: ParticleID::new(PDG_A),
            quark: ParticleID::new(PDG_B),
        }
    }
}

/// Decay chain found in the truth record of one event
#[derive(Clone, Debug, PartialEq)]
pub struct DecayChain {
    /// Decaying mother
    pub mother: usize,

    /// First two intermediate daughters of the mother, in record order
    pub daughters: [usize; 2],

    /// Quarks coming from each daughter, by decreasing pT
    pub quarks_per_daughter: [Vec<usize>; 2],

    /// Quarks coming from either daughter, by decreasing pT
    pub quarks: Vec<usize>,
}
//
impl DecayChain {
    /// Look for the decay chain in a truth record
    ///
    /// The first mother (lowest index) with at least two intermediate-species
    /// children is retained. Returns `None` if there is no such mother.
    ///
    pub fn find(gen: &GenParticles, species: &DecaySpecies) -> Option<Self> {
        // Parent -> children adjacency, built in a single pass
        let mut intermediates = BTreeMap::<usize, Vec<usize>>::new();
        let mut quarks = BTreeMap::<usize, Vec<usize>>::new();
        for (idx, &pdg) in gen.pdg_id.iter().enumerate() {
            let Some(mother) = gen.mother_of(idx) else {
                continue;
            };
            if pdg == species.intermediate && gen.pdg_id[mother] == species.mother {
                intermediates.entry(mother).or_default().push(idx);
            } else if is_flavour(pdg, species.quark) {
                quarks.entry(mother).or_default().push(idx);
            }
        }

        let (&mother, children) = intermediates.iter().find(|(_, children)| children.len() >= 2)?;
        let daughters = [children[0], children[1]];

        let quarks_from = |daughter: usize| {
            let mut found = quarks.get(&daughter).cloned().unwrap_or_default();
            sort_by_pt(&mut found, &gen.kin.pt);
            found
        };
        let quarks_per_daughter = [quarks_from(daughters[0]), quarks_from(daughters[1])];

        let mut pooled: Vec<usize> = quarks_per_daughter.concat();
        sort_by_pt(&mut pooled, &gen.kin.pt);

        Some(Self {
            mother,
            daughters,
            quarks_per_daughter,
            quarks: pooled,
        })
    }

    /// ΔR between the two daughters
    pub fn daughter_separation(&self, gen: &GenParticles) -> Float {
        let [a1, a2] = self.daughters;
        separation(gen, a1, a2)
    }

    /// ΔR between the two leading quarks of a daughter (0 or 1), if it has at
    /// least two quarks
    pub fn quark_pair_separation(&self, gen: &GenParticles, daughter: usize) -> Option<Float> {
        match self.quarks_per_daughter[daughter][..] {
            [q1, q2, ..] => Some(separation(gen, q1, q2)),
            _ => None,
        }
    }

    /// Leading quarks across both daughters, at most `max` of them
    pub fn leading_quarks(&self, max: usize) -> &[usize] {
        &self.quarks[..self.quarks.len().min(max)]
    }
}

/// Truth that a particle is a quark of the given flavour, or its antiquark
///
/// Codes without a negated counterpart never match instead of overflowing.
fn is_flavour(pdg: ParticleID, quark: ParticleID) -> bool {
    pdg.id().checked_abs().map(ParticleID::new) == Some(quark.abs())
}

fn separation(gen: &GenParticles, i: usize, j: usize) -> Float {
    let kin = &gen.kin;
    delta_r(kin.eta[i], kin.phi[i], kin.eta[j], kin.phi[j])
}
