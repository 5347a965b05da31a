//! Multi-threaded back-end of the analysis

#[cfg(feature = "faster-threading")]
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{resacc::ResultsAccumulator, scheduling::batches};
use eyre::Result;
use std::{ops::Range, sync::Mutex};

/// Process events in multi-threaded mode
///
/// Does not finalize the output results, so should be readily amenable to
/// extra layers of parallelization (such as distribution across multiple
/// compute nodes).
///
pub fn run_analysis_impl<'cfg>(
    num_events: usize,
    process_events: impl Send + Sync + Fn(Range<usize>) -> Result<ResultsAccumulator<'cfg>>,
) -> Result<ResultsAccumulator<'cfg>> {
    let batches = batches(num_events).collect::<Vec<_>>();

    // The results of parallel tasks will be aggregated...
    let accumulator = {
        // ...in a way that is optimized for numerical reproduciblity
        #[cfg(not(feature = "faster-threading"))]
        {
            ReproducibleAccumulator::new(batches.len())
        }

        // ...in a way that is optimized for computational performance
        #[cfg(feature = "faster-threading")]
        {
            FastAccumulator::new(batches.len())
        }
    };

    // This function is a synchronization scope: it will only return
    // once all inner tasks have been executed
    rayon::scope(|scope| {
        for (batch_id, batch) in batches.into_iter().enumerate() {
            let accumulator_ref = &accumulator;
            let process_events_ref = &process_events;
            scope.spawn(move |_| {
                log::debug!("Processing events {batch:?}");
                let result = process_events_ref(batch);
                accumulator_ref.set_task_result(batch_id, result);
            });
        }
    });

    // Extract the results from the accumulator
    accumulator.get_merged_result()
}

/// Reproducibility-optimized results accumulation mechanism
#[cfg(not(feature = "faster-threading"))]
struct ReproducibleAccumulator<'cfg> {
    /// Storage for the intermediary analysis results of parallel tasks
    results: Box<[Mutex<Option<Result<ResultsAccumulator<'cfg>>>>]>,
}
//
#[cfg(not(feature = "faster-threading"))]
impl<'cfg> ReproducibleAccumulator<'cfg> {
    /// Set up results storage for N parallel tasks
    fn new(num_tasks: usize) -> Self {
        assert!(num_tasks > 0, "There should be at least one task");
        Self {
            results: (0..num_tasks)
                .map(|_| Mutex::new(None))
                .collect::<Vec<_>>()
                .into_boxed_slice(),
        }
    }

    /// Integrate the results of the n-th analysis task
    fn set_task_result(&self, task_id: usize, result: Result<ResultsAccumulator<'cfg>>) {
        let mut lock = self.results[task_id]
            .lock()
            .expect("Mutex data should be valid");
        assert!(lock.is_none(), "Tasks should not report results twice");
        *lock = Some(result);
    }

    /// Aggregate the results in a reproducible fashion
    fn get_merged_result(self) -> Result<ResultsAccumulator<'cfg>> {
        // Start iterating over the task results, in batch order
        let mut results_iter = self.results.into_vec().into_iter().map(|entry| {
            entry
                .into_inner()
                .expect("Mutex data should be valid")
                .expect("Result should be ready")
        });

        // Initialize results storage with the result of the first task
        let first_result = results_iter
            .next()
            .expect("There should be at least one task")?;

        // Merge the results of the other tasks, stopping at the first error
        results_iter.try_fold(first_result, |mut r1, r2| -> Result<_> {
            r1.merge(r2?);
            Ok(r1)
        })
    }
}

/// Speed-optimized results accumulation mechanism
#[cfg(feature = "faster-threading")]
struct FastAccumulator<'cfg> {
    /// Storage location in which results will be merged out of order
    merged_result: Mutex<Option<ResultsAccumulator<'cfg>>>,

    /// First error reported by a task, by batch order
    error: Mutex<Option<(usize, eyre::Report)>>,

    /// Truth that each task has reported its results
    task_finished: Box<[AtomicBool]>,
}
//
#[cfg(feature = "faster-threading")]
impl<'cfg> FastAccumulator<'cfg> {
    /// Set up results storage for N parallel tasks
    fn new(num_tasks: usize) -> Self {
        assert!(num_tasks > 0, "There should be at least one task");
        Self {
            merged_result: Mutex::new(None),
            error: Mutex::new(None),
            task_finished: (0..num_tasks)
                .map(|_| AtomicBool::new(false))
                .collect::<Vec<_>>()
                .into_boxed_slice(),
        }
    }

    /// Integrate the results of the n-th analysis task
    #[allow(unknown_lints, clippy::significant_drop_in_scrutinee)]
    fn set_task_result(&self, task_id: usize, result: Result<ResultsAccumulator<'cfg>>) {
        match result {
            Ok(result) => match *self
                .merged_result
                .lock()
                .expect("Mutex data should be valid")
            {
                // If we are the first, initialize the accumulator
                ref mut storage @ None => *storage = Some(result),

                // Otherwise, merge our results with those that are already here
                Some(ref mut accumulator) => accumulator.merge(result),
            },
            Err(report) => {
                let mut error = self.error.lock().expect("Mutex data should be valid");
                if error.as_ref().map_or(true, |(first_id, _)| task_id < *first_id) {
                    *error = Some((task_id, report));
                }
            }
        }

        // Remember that this task has completed its work
        let was_finished = self.task_finished[task_id].swap(true, Ordering::Relaxed);
        assert!(!was_finished, "Tasks should not set their result twice");
    }

    /// Collect the merged result
    fn get_merged_result(self) -> Result<ResultsAccumulator<'cfg>> {
        // Check that all tasks have completed their work
        for ready in self.task_finished.into_vec().into_iter() {
            assert!(
                ready.load(Ordering::Relaxed),
                "All tasks should have completed their work"
            );
        }

        if let Some((_, report)) = self.error.into_inner().expect("Mutex data should be valid") {
            return Err(report);
        }
        Ok(self
            .merged_result
            .into_inner()
            .expect("Mutex data should be valid")
            .expect("Result should be ready"))
    }
}
