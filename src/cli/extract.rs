//! Extract command implementation.
//!
//! Resolves inputs into atlas jobs, layers CLI flags over the manifest's
//! settings and runs the batch.

use std::path::{Path, PathBuf};

use clap::Args;

use crate::config::{Manifest, SettingsStore};
use crate::detect::{AutoPrompt, BackgroundPrompt, StdinPrompt};
use crate::discovery::{discover, AtlasJob};
use crate::error::{AtlasError, Result};
use crate::export::{run_batch, BatchOptions, ExtractContext, Progress};
use crate::output::{display_path, plural, Printer};
use crate::parser::ParserRegistry;
use crate::report::{print_diagnostics, AtlasOutcome, BatchSummary};
use crate::types::{AnimationFormat, CropOption, FrameFormat, FrameSelection, SettingsOverrides};

/// Extract frames and animations from texture atlases
#[derive(Args, Debug, Default)]
pub struct ExtractArgs {
    /// Atlas images, metadata files or directories to scan
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output directory (default: manifest `output`, else "extracted")
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Manifest to use instead of ./unatlas.yaml
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Animation frame rate
    #[arg(long)]
    pub fps: Option<f64>,

    /// Extra delay on the last frame, in milliseconds
    #[arg(long, value_name = "MS")]
    pub delay: Option<u32>,

    /// Minimum total animation duration, in milliseconds
    #[arg(long, value_name = "MS")]
    pub period: Option<u32>,

    /// Scale factor; negative flips horizontally
    #[arg(long, allow_negative_numbers = true)]
    pub scale: Option<f64>,

    /// GIF alpha cutoff in 0..=1
    #[arg(long)]
    pub threshold: Option<f32>,

    /// Frames to keep: All, First, Last, "First, Last", "No duplicates" or indices like 0,2-4,-1
    #[arg(long, allow_hyphen_values = true)]
    pub selection: Option<String>,

    /// Crop mode
    #[arg(long, value_enum)]
    pub crop: Option<CropOption>,

    /// Animation output format
    #[arg(long, value_enum)]
    pub animation_format: Option<AnimationFormat>,

    /// Individual frame output format
    #[arg(long, value_enum)]
    pub frame_format: Option<FrameFormat>,

    /// Round frame delays cumulatively to keep the exact frame rate
    #[arg(long)]
    pub variable_delay: bool,

    /// Prefix for output file names
    #[arg(long)]
    pub prefix: Option<String>,

    /// File name template: standard, no-spaces, no-special or a custom pattern
    #[arg(long)]
    pub template: Option<String>,

    /// Worker threads (default: half the CPUs)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Stop starting new atlases after the first failure
    #[arg(long)]
    pub fail_fast: bool,

    /// Remove the most frequent border colour without asking
    #[arg(long, short)]
    pub yes: bool,

    /// Engine character file to apply (single input only)
    #[arg(long)]
    pub character: Option<PathBuf>,

    /// Metadata file for the atlas image (single input only)
    #[arg(long)]
    pub metadata: Option<PathBuf>,
}

impl ExtractArgs {
    /// Flags that override the manifest's defaults tier.
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            fps: self.fps,
            end_delay_ms: self.delay,
            min_period_ms: self.period,
            scale: self.scale,
            alpha_threshold: self.threshold,
            frame_selection: self.selection.as_deref().map(FrameSelection::from),
            crop: self.crop,
            animation_format: self.animation_format,
            frame_format: self.frame_format,
            variable_delay: self.variable_delay.then_some(true),
            prefix: self.prefix.clone(),
            template: self.template.clone(),
            ..Default::default()
        }
    }
}

fn load_manifest(args: &ExtractArgs) -> Result<Manifest> {
    if let Some(path) = &args.config {
        return Manifest::load(path);
    }
    match Manifest::find(Path::new(".")) {
        Some(path) => Manifest::load(&path),
        None => Ok(Manifest::default()),
    }
}

fn single_input_error(flag: &str) -> AtlasError {
    AtlasError::Config {
        message: format!("--{} needs exactly one atlas input", flag),
        help: Some("Run extract once per atlas when pairing files by hand".to_string()),
    }
}

fn collect_jobs(
    args: &ExtractArgs,
    manifest: &Manifest,
    registry: &ParserRegistry,
    output: &Path,
) -> Result<Vec<AtlasJob>> {
    let mut jobs = match &args.metadata {
        Some(metadata) => {
            let [image] = args.inputs.as_slice() else {
                return Err(single_input_error("metadata"));
            };
            let mut job = AtlasJob::unknown(image);
            job.metadata = Some(metadata.clone());
            job.character = manifest.characters.get(&job.sheet_name()).cloned();
            vec![job]
        }
        None => discover(&args.inputs, manifest, registry, &[output.to_path_buf()])?,
    };

    if let Some(character) = &args.character {
        let [job] = jobs.as_mut_slice() else {
            return Err(single_input_error("character"));
        };
        job.character = Some(character.clone());
    }
    Ok(jobs)
}

fn report_progress(printer: &Printer, progress: &Progress<'_>) {
    let counter = printer.dim(&format!("[{}/{}]", progress.completed, progress.total));
    let path = display_path(progress.image);
    match progress.outcome {
        AtlasOutcome::Done(stats) => {
            printer.success(
                "Extracted",
                &format!(
                    "{} ({}, {}) {}",
                    path,
                    plural(stats.animations, "animation", "animations"),
                    plural(stats.frames, "frame", "frames"),
                    counter
                ),
            );
            if !stats.report.is_empty() {
                print_diagnostics(printer, &stats.report);
            }
        }
        AtlasOutcome::Cancelled => printer.warning("Skipped", &format!("{} (cancelled) {}", path, counter)),
        AtlasOutcome::Skipped => printer.verbose("Skipped", &path),
        AtlasOutcome::Failed(e) => printer.error("Failed", &format!("{}: {} {}", path, e, counter)),
    }
}

fn print_summary(printer: &Printer, summary: &BatchSummary) {
    let mut parts = vec![
        plural(summary.succeeded(), "atlas", "atlases"),
        plural(summary.total_animations(), "animation", "animations"),
        plural(summary.total_frames(), "frame", "frames"),
    ];
    if summary.total_warnings() > 0 {
        parts.push(plural(summary.total_warnings(), "warning", "warnings"));
    }
    printer.success("Finished", &parts.join(", "));

    if summary.cancelled() > 0 {
        printer.warning("Cancelled", &plural(summary.cancelled(), "atlas", "atlases"));
    }
    if summary.skipped() > 0 {
        printer.warning("Skipped", &format!("{} after failure", plural(summary.skipped(), "atlas", "atlases")));
    }
    for (path, error) in summary.failures() {
        printer.error("Failed", &format!("{}: {}", display_path(path), error));
    }
}

pub fn run(args: ExtractArgs, printer: &Printer) -> Result<BatchSummary> {
    let manifest = load_manifest(&args)?;
    let mut store: SettingsStore = manifest.store()?;
    store.override_defaults(&args.overrides());
    store.validate()?;

    let output = args.output.clone().unwrap_or_else(|| manifest.output.clone());
    let registry = ParserRegistry::new();
    let jobs = collect_jobs(&args, &manifest, &registry, &output)?;

    if jobs.is_empty() {
        printer.warning("Warning", "No atlases found");
        return Ok(BatchSummary::default());
    }

    printer.status(
        "Extracting",
        &format!("{} to {}", plural(jobs.len(), "atlas", "atlases"), display_path(&output)),
    );
    for job in &jobs {
        let metadata = job
            .metadata
            .as_deref()
            .map(display_path)
            .unwrap_or_else(|| "detect".to_string());
        printer.verbose("Found", &format!("{} <- {}", display_path(&job.image), metadata));
    }

    let auto = AutoPrompt;
    let interactive = StdinPrompt::default();
    let prompt: &dyn BackgroundPrompt = if args.yes { &auto } else { &interactive };

    let ctx = ExtractContext {
        registry: &registry,
        store: &store,
        output: &output,
        prompt,
    };
    let options = BatchOptions {
        threads: args.threads.or(manifest.threads),
        fail_fast: args.fail_fast,
    };
    let summary = run_batch(&jobs, &ctx, &options, |p| report_progress(printer, p))?;

    print_summary(printer, &summary);
    if summary.is_success() {
        Ok(summary)
    } else {
        Err(AtlasError::Export {
            message: format!("{} failed", plural(summary.failed(), "atlas", "atlases")),
            help: Some("Run with -v for details".to_string()),
        })
    }
}
