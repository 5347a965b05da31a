//! This module contains the final results of the analysis: the cutflow table
//! and the filled distributions

use crate::{histogram::HistogramSet, numeric::Float};

/// One line of the cutflow table
#[derive(Clone, Debug, PartialEq)]
pub struct CutflowRow {
    /// Name of the stage
    pub label: &'static str,

    /// Number of simulated events surviving the stage
    pub count: u64,

    /// Fraction of the raw events surviving the stage
    pub efficiency: Float,

    /// Expected number of events surviving the stage
    pub weighted_count: Float,
}

/// Final results of the analysis
pub struct FinalResults {
    /// Number of processed events
    pub processed_events: usize,

    /// Weight applied to reconstructed-level fills
    pub weight: Float,

    /// Cutflow table, in stage order
    pub cutflow: Vec<CutflowRow>,

    /// Filled distributions
    pub histograms: HistogramSet,
}
//
impl FinalResults {
    /// Display the cutflow table
    pub fn print_cutflow(&self) {
        let rule = "-".repeat(67);
        println!();
        println!("Event flow (cutflow):");
        println!("{rule}");
        println!("{:<22}{:>15}{:>15}{:>15}", "Cut", "Nevents", "ε_cut", "WNevents");
        println!("{rule}");
        for row in &self.cutflow {
            println!(
                "{:<22}{:>15.1}{:>15.3}{:>15.1}",
                row.label, row.count as Float, row.efficiency, row.weighted_count
            );
        }
        println!("{rule}");
    }
}
