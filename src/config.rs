//! Mechanism for loading and sharing the analysis configuration

use crate::{
    cleaning::DEFAULT_OVERLAP_DR,
    cutflow::EventCuts,
    normalization::Normalization,
    numeric::Float,
    selection::{ElectronId, JetCuts, KinematicGate, LeptonCuts},
};
use eyre::{ensure, eyre, Result, WrapErr};
use log::info;
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

/// Analysis configuration
#[derive(Clone, Debug, PartialEq)]
pub struct Configuration {
    /// File holding the event records
    pub input_path: PathBuf,

    /// Input files whose name starts with this hold signal events
    pub signal_prefix: String,

    /// Luminosity and cross-section of the sample
    pub normalization: Normalization,

    /// Requirements on electrons and muons
    pub leptons: LeptonCuts,

    /// Requirements on jets
    pub jets: JetCuts,

    /// Jets closer than this to a tight lepton are removed
    pub overlap_dr: Float,

    /// Thresholds of the event-level cuts
    pub event_cuts: EventCuts,

    /// File where the results are written
    pub output_path: PathBuf,
}
//
impl Default for Configuration {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("events.jsonl"),
            signal_prefix: "GluGluH".to_owned(),
            normalization: Normalization::default(),
            leptons: LeptonCuts::default(),
            jets: JetCuts::default(),
            overlap_dr: DEFAULT_OVERLAP_DR,
            event_cuts: EventCuts::default(),
            output_path: PathBuf::from("haa4b_results.txt"),
        }
    }
}
//
impl Configuration {
    /// Load the configuration from a file, check it, and log it
    pub fn load(file_name: &Path) -> Result<Self> {
        let config_str = fs::read_to_string(file_name)
            .wrap_err_with(|| format!("Could not read {}", file_name.display()))?;
        let config = Self::parse(&config_str)?;
        config.log();
        Ok(config)
    }

    /// Decode and check configuration text
    ///
    /// Configuration items are the first non-whitespace chunk of text on each
    /// line, in a fixed order. Blank lines are ignored.
    ///
    pub fn parse(config_str: &str) -> Result<Self> {
        let mut config_iter = config_str
            .lines()
            .filter_map(|line| line.split_whitespace().next());

        // Fetch the next item, tagged with the field it fills
        let mut next_item = |name: &'static str| -> Result<ConfigItem> {
            config_iter
                .next()
                .map(|data| ConfigItem::new(name, data))
                .ok_or_else(|| eyre!("Missing configuration of {}", name))
        };

        let input_path = PathBuf::from(next_item("input_path")?.data);
        let signal_prefix = next_item("signal_prefix")?.data.to_owned();
        let normalization = Normalization {
            luminosity: next_item("luminosity")?.parse::<Float>()?,
            cross_section: next_item("cross_section")?.parse::<Float>()?,
        };
        let tight = KinematicGate::inclusive(
            next_item("lepton_pt_min")?.parse::<Float>()?,
            next_item("lepton_eta_max")?.parse::<Float>()?,
        );
        let loose = KinematicGate::exclusive(
            next_item("loose_lepton_pt_min")?.parse::<Float>()?,
            next_item("loose_lepton_eta_max")?.parse::<Float>()?,
        );
        let leptons = LeptonCuts {
            tight,
            loose,
            rel_iso_max: next_item("lepton_rel_iso_max")?.parse::<Float>()?,
            electron_tight_id: next_item("electron_tight_id")?.parse_tier()?,
            electron_loose_id: next_item("electron_loose_id")?.parse_tier()?,
        };
        let jets = JetCuts {
            gate: KinematicGate::inclusive(
                next_item("jet_pt_min")?.parse::<Float>()?,
                next_item("jet_eta_max")?.parse::<Float>()?,
            ),
        };
        let overlap_dr = next_item("overlap_dr")?.parse::<Float>()?;
        let event_cuts = EventCuts {
            leading_jet_pt_min: next_item("leading_jet_pt_min")?.parse::<Float>()?,
            btag_min_score: next_item("btag_min_score")?.parse::<Float>()?,
            met_max: next_item("met_max")?.parse::<Float>()?,
            ..EventCuts::default()
        };
        let output_path = PathBuf::from(next_item("output_path")?.data);

        let config = Self {
            input_path,
            signal_prefix,
            normalization,
            leptons,
            jets,
            overlap_dr,
            event_cuts,
            output_path,
        };
        config.check()?;
        Ok(config)
    }

    /// Reject configurations which make no physical sense
    fn check(&self) -> Result<()> {
        let norm = &self.normalization;
        ensure!(norm.luminosity > 0., "Luminosity must be positive");
        ensure!(norm.cross_section > 0., "Cross-section must be positive");
        let gates = [self.leptons.tight, self.leptons.loose, self.jets.gate];
        for gate in gates {
            ensure!(
                gate.pt_min >= 0. && gate.eta_max >= 0.,
                "Kinematic thresholds must not be negative"
            );
        }
        ensure!(
            self.leptons.rel_iso_max >= 0.,
            "Isolation threshold must not be negative"
        );
        ensure!(
            self.leptons.electron_tight_id >= self.leptons.electron_loose_id,
            "Tight electrons must pass the loose electron identification"
        );
        ensure!(self.overlap_dr >= 0., "Overlap distance must not be negative");
        ensure!(
            self.event_cuts.leading_jet_pt_min >= 0. && self.event_cuts.met_max >= 0.,
            "Event thresholds must not be negative"
        );
        ensure!(
            !self.signal_prefix.is_empty(),
            "Signal dataset prefix must not be empty"
        );
        Ok(())
    }

    /// Log the configuration
    pub fn log(&self) {
        let leptons = &self.leptons;
        let cuts = &self.event_cuts;
        info!("Input file             : {}", self.input_path.display());
        info!("Signal prefix          : {}", self.signal_prefix);
        info!("Luminosity (fb⁻¹)      : {}", self.normalization.luminosity);
        info!("Cross-section (pb)     : {}", self.normalization.cross_section);
        info!(
            "Leptons                : pT ≥ {}, |η| ≤ {}, iso < {}, ele ID ≥ {}",
            leptons.tight.pt_min, leptons.tight.eta_max, leptons.rel_iso_max, leptons.electron_tight_id
        );
        info!(
            "Loose leptons          : pT > {}, |η| < {}, ele ID ≥ {}",
            leptons.loose.pt_min, leptons.loose.eta_max, leptons.electron_loose_id
        );
        info!(
            "Jets                   : pT ≥ {}, |η| ≤ {}, ΔR(ℓ) > {}",
            self.jets.gate.pt_min, self.jets.gate.eta_max, self.overlap_dr
        );
        info!(
            "Event cuts             : pT(J1) > {}, b-tag > {}, MET < {}",
            cuts.leading_jet_pt_min, cuts.btag_min_score, cuts.met_max
        );
        info!("Output file            : {}", self.output_path.display());
    }
}

/// A value from the configuration file, tagged with the struct field which it
/// is supposed to map for error reporting purposes.
struct ConfigItem<'data> {
    name: &'static str,
    data: &'data str,
}
//
impl<'data> ConfigItem<'data> {
    /// Build a config item from a struct field tag and raw iterator data
    fn new(name: &'static str, data: &'data str) -> Self {
        Self { name, data }
    }

    /// Parse this data using Rust's standard parsing logic
    fn parse<T: FromStr>(self) -> Result<T>
    where
        <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
    {
        self.data
            .parse::<T>()
            .wrap_err_with(|| format!("Could not parse configuration of {}", self.name))
    }

    /// Parse an electron identification tier
    fn parse_tier(self) -> Result<ElectronId> {
        self.data
            .parse::<ElectronId>()
            .wrap_err_with(|| format!("Could not parse configuration of {}", self.name))
    }
}
