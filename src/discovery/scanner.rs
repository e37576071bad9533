//! File system scanner for discovering atlases.
//!
//! Recursively walks directories for atlas images and pairs each one with the
//! metadata and character files that share its stem.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::Manifest;
use crate::parser::character::CharacterData;
use crate::parser::{ParserRegistry, METADATA_EXTENSIONS};

use super::AtlasJob;

/// Atlas image extensions picked up by discovery.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tga", "webp"];

fn extension_in(path: &Path, set: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| set.iter().any(|s| e.eq_ignore_ascii_case(s)))
        .unwrap_or(false)
}

/// Whether the path looks like an atlas image.
pub fn is_atlas_image(path: &Path) -> bool {
    extension_in(path, IMAGE_EXTENSIONS)
}

/// Whether the path has a metadata extension.
pub fn is_metadata_file(path: &Path) -> bool {
    extension_in(path, METADATA_EXTENSIONS)
}

/// Build the job for one atlas image, looking for same-stem siblings.
///
/// A sibling that parses as an engine character file becomes the overlay;
/// the first sibling a geometry parser claims becomes the metadata.
pub fn job_for_image(image: &Path, registry: &ParserRegistry) -> AtlasJob {
    let mut job = AtlasJob::unknown(image);

    for ext in METADATA_EXTENSIONS {
        let candidate = image.with_extension(ext);
        if !candidate.is_file() {
            continue;
        }
        let data = match std::fs::read(&candidate) {
            Ok(data) => data,
            Err(e) => {
                log::warn!("{}: {}", candidate.display(), e);
                continue;
            }
        };

        if job.character.is_none() && CharacterData::candidate(&candidate) {
            if let Ok(Some(_)) = CharacterData::parse(&data, &candidate) {
                log::debug!("{}: character overlay", candidate.display());
                job.character = Some(candidate);
                continue;
            }
        }

        if job.metadata.is_none() && registry.detect(&candidate, &data).is_some() {
            job.metadata = Some(candidate);
        }
    }
    job
}

/// Scan a directory for atlas images.
///
/// Entries under any `skip` directory (usually the output directory) and
/// paths the manifest excludes are ignored. Order is deterministic.
pub fn scan_directory(
    root: &Path,
    manifest: &Manifest,
    registry: &ParserRegistry,
    skip: &[PathBuf],
) -> Vec<AtlasJob> {
    if !root.exists() {
        return Vec::new();
    }

    WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !skip.iter().any(|s| e.path().starts_with(s)))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| is_atlas_image(path) && !manifest.is_excluded(path))
        .map(|path| job_for_image(&path, registry))
        .collect()
}
