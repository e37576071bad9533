//! List command implementation.
//!
//! Prints the animations each atlas would produce without decoding images.

use std::path::PathBuf;

use clap::Args;

use crate::config::Manifest;
use crate::discovery::discover;
use crate::error::Result;
use crate::output::{display_path, plural, Printer};
use crate::parser::ParserRegistry;

/// List the animations in atlas metadata
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Atlas images, metadata files or directories (default: current directory)
    pub files: Vec<PathBuf>,
}

pub fn run(args: ListArgs, printer: &Printer) -> Result<()> {
    let inputs = if args.files.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        args.files
    };

    let registry = ParserRegistry::new();
    let jobs = discover(&inputs, &Manifest::default(), &registry, &[])?;

    for job in &jobs {
        let Some(metadata) = &job.metadata else {
            printer.info(&job.sheet_name(), &printer.dim("no metadata, regions are detected on extract"));
            continue;
        };

        match registry.extract_names_file(metadata) {
            Ok(names) => {
                printer.info(
                    &job.sheet_name(),
                    &format!(
                        "{} {}",
                        plural(names.len(), "animation", "animations"),
                        printer.dim(&display_path(metadata))
                    ),
                );
                for name in names {
                    println!("{}/{}", job.sheet_name(), name);
                }
            }
            Err(e) => printer.error("Failed", &format!("{}: {}", display_path(metadata), e)),
        }
    }

    Ok(())
}
