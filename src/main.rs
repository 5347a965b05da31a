//! H → AA → 4b: A cutflow analysis of collision events
//!
//!
//! # Introduction (for the physicist)
//!
//! This program looks for a Higgs boson decaying into two light pseudoscalars,
//! each of which decays into a pair of b quarks (H → AA → bb̄bb̄).
//!
//! Reconstructed electrons, muons and jets are selected by kinematic,
//! identification and isolation requirements. Jets overlapping with an
//! isolated lepton are removed, and events then go through a sequence of cuts
//! (loose lepton veto, jet multiplicity, hard leading jet, two b-tagged jets,
//! low missing transverse momentum). Surviving events are used to reconstruct
//! a candidate from the two leading jets.
//!
//! For signal samples, the generator-level decay chain is also looked up, and
//! distributions of the true Higgs boson, pseudoscalars and b quarks are
//! recorded.
//!
//!
//! # Introduction (for the computer guy)
//!
//! Every event is processed independently of the others:
//!
//! * read in the configuration and index the event file
//! * loop over events,
//!     * select physics objects and clean jets,
//!     * count the event in each cut it survives,
//!     * fill distributions, weighted to the expected yield,
//! * then display / store the result.
//!
//! Events are processed in batches, which are spread across threads when the
//! `multi-threading` feature is enabled.

#![warn(missing_docs)]

mod analysis;
mod cleaning;
mod config;
mod cutflow;
mod event;
mod geometry;
mod histogram;
mod momentum;
mod normalization;
mod numeric;
mod output;
mod reco;
mod resacc;
mod resfin;
mod scheduling;
mod selection;
mod source;
mod truth;

use crate::{
    analysis::Analysis,
    config::Configuration,
    source::{is_signal_dataset, EventSource, JsonLinesSource},
};
use eyre::WrapErr;
use log::info;
use std::{path::PathBuf, time::Instant};

/// Configuration file used when none is given on the command line
const DEFAULT_CONFIG_PATH: &str = "analysis.cfg";

/// This will act as our main function, with suitable error handling
fn main() -> eyre::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // ### CONFIGURATION READOUT ###

    let config_path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let cfg = Configuration::load(&config_path).wrap_err("Failed to load the configuration")?;

    // ### ANALYSIS INITIALIZATION ###

    let source = JsonLinesSource::open(&cfg.input_path).wrap_err("Failed to open the input")?;
    let num_events = source.num_events();
    info!("Found {num_events} events in {}", cfg.input_path.display());

    // Truth-level distributions only make sense for signal samples
    let is_signal = is_signal_dataset(&cfg.input_path, &cfg.signal_prefix);
    if is_signal {
        info!("Signal sample: truth-level distributions will be filled");
    } else {
        info!("Background sample: truth-level distributions are skipped");
    }

    // Normalize the sample to the expected yield
    let weight = cfg.normalization.event_weight(num_events);
    info!(
        "Expected events: {}, event weight: {weight}",
        cfg.normalization.expected_events()
    );

    let analysis = Analysis::new(&cfg, is_signal);

    // NOTE: We start the clock after configuration and input indexing I/O
    let saved_time = Instant::now();

    // ### ANALYSIS EXECUTION ###

    // The kernel processes a range of events and returns the accumulated
    // intermediary results
    let result = scheduling::run_analysis(num_events, |range| {
        let mut acc = analysis.accumulator(weight);
        for index in range {
            let event = source.event(index)?;
            analysis.process(&event, &mut acc);
        }
        Ok(acc)
    })
    .wrap_err("Failed to process the events")?;

    // ### RESULTS DISPLAY AND STORAGE ###

    let elapsed_time = saved_time.elapsed();
    info!(
        "Processed {} events in {:.3} s",
        result.processed_events,
        elapsed_time.as_secs_f64()
    );
    output::dump_results(&cfg, &result, elapsed_time).wrap_err("Failed to output the results")?;

    Ok(())
}
