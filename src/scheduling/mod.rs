//! This module takes care of scheduling the analysis work, encapsulating use
//! of multiple threads

#[cfg(feature = "multi-threading")]
mod multi_threading;
#[cfg(not(feature = "multi-threading"))]
mod sequential;

use crate::{resacc::ResultsAccumulator, resfin::FinalResults};
use eyre::Result;
use std::ops::Range;

/// Size of the processed event batches
///
/// Events are grouped in batches of a certain size in order to reduce
/// accumulation error and achieve perfect reproducibility between sequential
/// and parallel runs of the analysis.
///
const EVENT_BATCH_SIZE: usize = 10_000;

/// Split `num_events` into consecutive batches of event indices
///
/// An empty run still gets one (empty) batch, so that there is always an
/// accumulator to return.
///
fn batches(num_events: usize) -> impl Iterator<Item = Range<usize>> {
    let num_batches = num_events.div_ceil(EVENT_BATCH_SIZE).max(1);
    (0..num_batches).map(move |batch| {
        let start = batch * EVENT_BATCH_SIZE;
        start..num_events.min(start + EVENT_BATCH_SIZE)
    })
}

/// Run the analysis in the manner that was configured at build time.
///
/// Takes as parameters the total number of events to be processed, and a
/// kernel that processes a range of event indices into an accumulator.
///
/// Returns the finalized analysis results, or the first error encountered in
/// event index order.
///
pub fn run_analysis<'cfg>(
    num_events: usize,
    process_events: impl Send + Sync + Fn(Range<usize>) -> Result<ResultsAccumulator<'cfg>>,
) -> Result<FinalResults> {
    // Integrate analysis results...
    let accumulator = {
        // ...in sequential mode
        #[cfg(not(feature = "multi-threading"))]
        {
            sequential::run_analysis_impl(num_events, process_events)?
        }

        // ...in multi-threaded mode
        #[cfg(feature = "multi-threading")]
        {
            multi_threading::run_analysis_impl(num_events, process_events)?
        }
    };

    // Finalize the results
    Ok(accumulator.finalize())
}
