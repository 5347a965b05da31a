//! This module allows integrating analysis results across events
use crate::{
    cutflow::{Cutflow, CutflowCounts},
    histogram::HistogramSet,
    numeric::Float,
    resfin::{CutflowRow, FinalResults},
};

/// This struct will accumulate intermediary results while events are being
/// processed, and ultimately compute the final results (see FinalResults).
pub struct ResultsAccumulator<'a> {
    // ### RESULT ACCUMULATORS ###
    /// Number of processed events
    processed_events: usize,

    /// Number of events surviving each cutflow stage
    counts: CutflowCounts,

    /// Distributions filled so far
    histograms: HistogramSet,

    // ### RUN CONSTANTS (CACHED FOR FINALIZATION) ###
    /// Stages of the selection
    cutflow: &'a Cutflow,

    /// Weight of each reconstructed-level fill
    weight: Float,
}
//
impl<'a> ResultsAccumulator<'a> {
    /// Prepare for results integration
    pub fn new(cutflow: &'a Cutflow, weight: Float) -> Self {
        Self {
            processed_events: 0,
            counts: CutflowCounts::new(cutflow),
            histograms: HistogramSet::book_standard(),
            cutflow,
            weight,
        }
    }

    /// Record that one more event went through the analysis
    pub fn count_event(&mut self) {
        self.processed_events += 1;
    }

    /// Cutflow counters, for the cutflow engine to update
    pub fn counts_mut(&mut self) -> &mut CutflowCounts {
        &mut self.counts
    }

    /// Record a value with unit weight, as done for truth-level quantities
    pub fn fill(&mut self, name: &str, x: Float) {
        self.histograms.fill(name, x, 1.);
    }

    /// Record a value with the normalization weight of the sample
    pub fn fill_weighted(&mut self, name: &str, x: Float) {
        self.histograms.fill(name, x, self.weight);
    }

    /// Integrate results from another ResultsAccumulator
    #[allow(clippy::needless_pass_by_value)]
    pub fn merge(&mut self, other: Self) {
        debug_assert!(std::ptr::eq(self.cutflow, other.cutflow));
        debug_assert_eq!(self.weight, other.weight);
        self.processed_events += other.processed_events;
        self.counts.merge(&other.counts);
        self.histograms.merge(&other.histograms);
    }

    /// Turn integrated analysis data into finalized results
    pub fn finalize(self) -> FinalResults {
        let counts = self.counts.as_slice();
        let raw = counts.first().copied().unwrap_or(0);
        let cutflow = self
            .cutflow
            .labels()
            .zip(counts)
            .map(|(label, &count)| CutflowRow {
                label,
                count,
                efficiency: if raw > 0 { count as Float / raw as Float } else { 0. },
                weighted_count: count as Float * self.weight,
            })
            .collect();
        FinalResults {
            processed_events: self.processed_events,
            weight: self.weight,
            cutflow,
            histograms: self.histograms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_and_merge() {
        let cutflow = Cutflow::standard();
        let mut a = ResultsAccumulator::new(&cutflow, 2.5);
        let mut b = ResultsAccumulator::new(&cutflow, 2.5);
        a.count_event();
        a.fill("h_pt_H", 30.);
        a.fill_weighted("h_MET", 30.);
        b.count_event();
        b.fill_weighted("h_MET", 31.);
        a.merge(b);

        let res = a.finalize();
        assert_eq!(res.processed_events, 2);
        let met = res.histograms.get("h_MET").unwrap();
        assert_eq!(met.bin_content(6), 5.);
        assert_eq!(met.entries(), 2);
        assert_eq!(res.histograms.get("h_pt_H").unwrap().bin_content(6), 1.);
    }

    #[test]
    fn empty_run() {
        let cutflow = Cutflow::standard();
        let res = ResultsAccumulator::new(&cutflow, 1.).finalize();
        assert_eq!(res.processed_events, 0);
        assert_eq!(res.cutflow.len(), 6);
        for row in &res.cutflow {
            assert_eq!(row.count, 0);
            assert_eq!(row.efficiency, 0.);
            assert_eq!(row.weighted_count, 0.);
        }
    }
}
