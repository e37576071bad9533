//! Export orchestration: file naming, per-atlas extraction and batches.

mod batch;
mod naming;
mod pipeline;

pub use batch::{default_threads, run_batch, BatchOptions, Progress};
pub use naming::{apply_replacements, expand_template, frame_index, output_stem, sanitize};
pub use pipeline::{extract_atlas, load_atlas, ExtractContext};
