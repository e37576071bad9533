//! Parallel batch extraction.
//!
//! Atlases run as independent jobs on a dedicated rayon pool. Each job owns
//! its decoded image and writes only to its own spritesheet directory, so the
//! only shared state is the stop flag and the progress counter.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use rayon::prelude::*;

use crate::discovery::AtlasJob;
use crate::error::{AtlasError, Result};
use crate::report::{AtlasOutcome, BatchSummary};

use super::pipeline::{extract_atlas, ExtractContext};

/// Worker pool and failure policy for a batch.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Worker threads; `None` uses [`default_threads`].
    pub threads: Option<usize>,
    /// Stop starting new atlases after the first failure.
    pub fail_fast: bool,
}

/// Progress notification sent after each atlas finishes.
pub struct Progress<'a> {
    pub completed: usize,
    pub total: usize,
    pub image: &'a Path,
    pub outcome: &'a AtlasOutcome,
}

/// Half the available CPUs, at least one.
pub fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get() / 2)
        .unwrap_or(1)
        .max(1)
}

/// Extract every job, returning outcomes in input order.
pub fn run_batch<F>(
    jobs: &[AtlasJob],
    ctx: &ExtractContext<'_>,
    options: &BatchOptions,
    on_progress: F,
) -> Result<BatchSummary>
where
    F: Fn(&Progress<'_>) + Sync,
{
    let threads = options.threads.unwrap_or_else(default_threads).max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| AtlasError::Config {
            message: format!("Failed to start {} worker threads: {}", threads, e),
            help: Some("Try a smaller --threads value".to_string()),
        })?;
    log::debug!("extracting {} atlases on {} threads", jobs.len(), threads);

    let stop = AtomicBool::new(false);
    let completed = AtomicUsize::new(0);
    let total = jobs.len();

    let outcomes = pool.install(|| {
        jobs.par_iter()
            .map(|job| {
                let outcome = if stop.load(Ordering::SeqCst) {
                    AtlasOutcome::Skipped
                } else {
                    let outcome = AtlasOutcome::from_result(extract_atlas(job, ctx));
                    if outcome.is_failure() && options.fail_fast {
                        stop.store(true, Ordering::SeqCst);
                    }
                    outcome
                };

                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                on_progress(&Progress {
                    completed: done,
                    total,
                    image: &job.image,
                    outcome: &outcome,
                });
                (job.image.clone(), outcome)
            })
            .collect::<Vec<_>>()
    });

    Ok(BatchSummary { outcomes })
}
