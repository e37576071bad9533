//! Input discovery.
//!
//! Turns the paths given on the command line into [`AtlasJob`]s. A path may
//! be an atlas image, a metadata file or a directory to scan.
//!
//! # Example
//!
//! ```ignore
//! use unatlas::discovery::discover;
//!
//! let jobs = discover(&[PathBuf::from("assets")], &manifest, &registry, &[])?;
//! println!("Found {} atlases", jobs.len());
//! ```

mod scanner;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::Manifest;
use crate::error::{AtlasError, Result};
use crate::parser::ParserRegistry;

pub use scanner::{
    is_atlas_image, is_metadata_file, job_for_image, scan_directory, IMAGE_EXTENSIONS,
};

/// One atlas to extract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtlasJob {
    /// The atlas image.
    pub image: PathBuf,
    /// Geometry metadata; `None` sends the atlas to the detector.
    pub metadata: Option<PathBuf>,
    /// Engine character file applied as a settings overlay.
    pub character: Option<PathBuf>,
}

impl AtlasJob {
    /// A job with no metadata and no overlay.
    pub fn unknown(image: &Path) -> Self {
        Self {
            image: image.to_path_buf(),
            metadata: None,
            character: None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.metadata.is_none()
    }

    /// Spritesheet name: the atlas file stem.
    pub fn sheet_name(&self) -> String {
        self.image
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Find the atlas image belonging to a metadata file.
///
/// Tries same-stem images first, then the image name recorded in the
/// metadata itself (relative to the metadata's directory).
fn image_for_metadata(metadata: &Path, registry: &ParserRegistry) -> Result<PathBuf> {
    for ext in IMAGE_EXTENSIONS {
        let candidate = metadata.with_extension(ext);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    let (_, sheet) = registry.parse_file(metadata)?;
    if let Some(name) = sheet.image {
        let candidate = metadata
            .parent()
            .map(|dir| dir.join(&name))
            .unwrap_or_else(|| PathBuf::from(&name));
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    Err(AtlasError::Io {
        path: metadata.to_path_buf(),
        message: "No atlas image found next to metadata".to_string(),
    })
}

/// Resolve input paths into jobs, in input order without duplicates.
///
/// Character files named in the manifest are attached to jobs whose sheet
/// has no same-stem overlay.
pub fn discover(
    inputs: &[PathBuf],
    manifest: &Manifest,
    registry: &ParserRegistry,
    skip: &[PathBuf],
) -> Result<Vec<AtlasJob>> {
    let mut jobs = Vec::new();

    for input in inputs {
        if input.is_dir() {
            jobs.extend(scan_directory(input, manifest, registry, skip));
        } else if input.is_file() {
            if is_atlas_image(input) {
                jobs.push(job_for_image(input, registry));
            } else if is_metadata_file(input) {
                let image = image_for_metadata(input, registry)?;
                let mut job = job_for_image(&image, registry);
                job.metadata = Some(input.clone());
                jobs.push(job);
            } else {
                return Err(AtlasError::format(input, "not an atlas image or metadata file"));
            }
        } else {
            return Err(AtlasError::Io {
                path: input.clone(),
                message: "No such file or directory".to_string(),
            });
        }
    }

    let mut seen = HashSet::new();
    jobs.retain(|job| seen.insert(job.image.clone()));

    for job in &mut jobs {
        if job.character.is_none() {
            job.character = manifest.characters.get(&job.sheet_name()).cloned();
        }
    }

    log::debug!("discovered {} atlases", jobs.len());
    Ok(jobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    const STARLING: &str = r#"<TextureAtlas imagePath="sheet.png"><SubTexture name="a0" x="0" y="0" width="1" height="1"/></TextureAtlas>"#;

    #[test]
    fn test_discover_image_and_directory_dedup() {
        let dir = tempdir().unwrap();
        let image = dir.path().join("bf.png");
        fs::write(&image, b"").unwrap();
        fs::write(dir.path().join("bf.xml"), STARLING).unwrap();

        let jobs = discover(
            &[image.clone(), dir.path().to_path_buf()],
            &Manifest::default(),
            &ParserRegistry::new(),
            &[],
        )
        .unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].sheet_name(), "bf");
        assert_eq!(jobs[0].metadata, Some(dir.path().join("bf.xml")));
    }

    #[test]
    fn test_discover_metadata_uses_recorded_image() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("sheet.png"), b"").unwrap();
        let metadata = dir.path().join("player.xml");
        fs::write(&metadata, STARLING).unwrap();

        let jobs = discover(&[metadata.clone()], &Manifest::default(), &ParserRegistry::new(), &[]).unwrap();
        assert_eq!(jobs[0].image, dir.path().join("sheet.png"));
        assert_eq!(jobs[0].metadata, Some(metadata));
    }

    #[test]
    fn test_discover_attaches_manifest_character() {
        let dir = tempdir().unwrap();
        let image = dir.path().join("bf.png");
        fs::write(&image, b"").unwrap();

        let mut manifest = Manifest::default();
        manifest
            .characters
            .insert("bf".to_string(), PathBuf::from("chars/bf.json"));

        let jobs = discover(&[image], &manifest, &ParserRegistry::new(), &[]).unwrap();
        assert!(jobs[0].is_unknown());
        assert_eq!(jobs[0].character, Some(PathBuf::from("chars/bf.json")));
    }

    #[test]
    fn test_discover_missing_input() {
        let err = discover(
            &[PathBuf::from("/nonexistent/bf.png")],
            &Manifest::default(),
            &ParserRegistry::new(),
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, AtlasError::Io { .. }));
    }
}
