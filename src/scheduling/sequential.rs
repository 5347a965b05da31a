//! Sequential back-end of the analysis

use crate::{resacc::ResultsAccumulator, scheduling::batches};
use eyre::Result;
use std::ops::Range;

/// Process events in sequential mode
///
/// We use batched logic even in sequential mode, in order to achieve
/// reproducibility with respect to multi-threaded runs.
///
/// Note that this is anyways generally a good thing to do when accumulating
/// lots of weighted fills, as otherwise the histogram bins will eventually
/// grow much larger than the accumulated values and numerical accumulation
/// errors will start to blow up.
///
pub fn run_analysis_impl<'cfg>(
    num_events: usize,
    process_events: impl Fn(Range<usize>) -> Result<ResultsAccumulator<'cfg>>,
) -> Result<ResultsAccumulator<'cfg>> {
    let mut batches = batches(num_events);

    // Initialize the accumulator with the first batch of events
    let first_batch = batches.next().unwrap_or(0..0);
    let mut accumulator = process_events(first_batch)?;

    // Process and integrate the remaining batches
    for batch in batches {
        log::debug!("Processing events {batch:?}");
        accumulator.merge(process_events(batch)?);
    }
    Ok(accumulator)
}
