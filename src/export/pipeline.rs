//! Per-atlas extraction.
//!
//! One call to [`extract_atlas`] reads a job's metadata and image, rebuilds
//! its frames, groups them into animations and writes every requested
//! output under `<output>/<spritesheet>/`.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use crate::animation::{apply_indices, frame_durations, group_frames, is_single_frame, select_frames};
use crate::config::SettingsStore;
use crate::detect::{detect_sprites, BackgroundPrompt};
use crate::discovery::AtlasJob;
use crate::error::{AtlasError, Result};
use crate::parser::character::CharacterData;
use crate::parser::{ParsedSheet, ParserRegistry};
use crate::render::{compose, encoder_for, generator_comment, reconstruct_all, threshold_alpha, write_frame, Target};
use crate::report::{AtlasStats, Diagnostic, ANIMATION_FAILED, EMPTY_SELECTION, FRAME_FAILED};
use crate::types::{AnimationFormat, AnimationGroup, ExportSettings, Frame, FrameFormat};

use super::naming::{frame_index, output_stem, sanitize};

/// Shared, read-only inputs for every job in a batch.
pub struct ExtractContext<'a> {
    pub registry: &'a ParserRegistry,
    pub store: &'a SettingsStore,
    pub output: &'a Path,
    pub prompt: &'a dyn BackgroundPrompt,
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| AtlasError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to create output directory: {}", e),
    })
}

/// Load the atlas image as RGBA.
pub fn load_atlas(path: &Path) -> Result<image::RgbaImage> {
    image::open(path)
        .map(|img| img.to_rgba8())
        .map_err(|e| AtlasError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read atlas image: {}", e),
        })
}

/// Settings store with the job's character overlay applied, if any.
fn store_for<'s>(job: &AtlasJob, store: &'s SettingsStore, sheet: &str) -> Result<Cow<'s, SettingsStore>> {
    let Some(path) = &job.character else {
        return Ok(Cow::Borrowed(store));
    };
    match CharacterData::from_file(path)? {
        Some(character) => {
            log::debug!(
                "{}: {} character, {} animations",
                path.display(),
                character.dialect,
                character.animations.len()
            );
            let mut store = store.clone();
            store.apply_character(sheet, &character);
            Ok(Cow::Owned(store))
        }
        None => {
            log::warn!("{}: not a character file, ignoring", path.display());
            Ok(Cow::Borrowed(store))
        }
    }
}

/// Extract every animation of one atlas.
///
/// Failures reading or parsing inputs abort the atlas. Failures writing a
/// single animation or frame set are recorded in the returned report and
/// the remaining animations still export.
pub fn extract_atlas(job: &AtlasJob, ctx: &ExtractContext<'_>) -> Result<AtlasStats> {
    let sheet_name = job.sheet_name();

    let parsed = match &job.metadata {
        Some(path) => {
            let (format, sheet) = ctx.registry.parse_file(path)?;
            log::debug!("{}: {} sprites ({})", path.display(), sheet.sprites.len(), format);
            Some(sheet)
        }
        None => None,
    };

    let mut atlas = load_atlas(&job.image)?;
    let sheet = match parsed {
        Some(sheet) => sheet,
        None => ParsedSheet::new(detect_sprites(&mut atlas, &job.image, ctx.prompt)?),
    };

    let store = store_for(job, ctx.store, &sheet_name)?;
    let mut stats = AtlasStats::default();
    let frames = reconstruct_all(&atlas, &sheet.sprites, &mut stats.report);
    drop(atlas);

    let sheet_dir = ctx.output.join(sanitize(&sheet_name));
    let exporter = GroupExporter {
        sheet: &sheet_name,
        dir: sheet_dir,
        unknown_atlas: job.is_unknown(),
    };

    for group in group_frames(frames, &sheet.tags) {
        let settings = store.resolve(&sheet_name, &group.name);
        let group = match &settings.explicit_indices {
            Some(indices) => apply_indices(&group, indices),
            None => group,
        };
        let single = is_single_frame(&group);
        let selected = select_frames(&group, &settings.frame_selection, single);
        if selected.is_empty() {
            stats.report.push(
                Diagnostic::warning(EMPTY_SELECTION, "no frames selected")
                    .with_subject(group.name.clone()),
            );
            continue;
        }

        exporter.export(&group, &selected, single, &settings, &mut stats);
    }

    log::debug!(
        "{}: {} frames, {} animations",
        job.image.display(),
        stats.frames,
        stats.animations
    );
    Ok(stats)
}

/// Writes the outputs of one spritesheet's groups.
struct GroupExporter<'a> {
    sheet: &'a str,
    dir: PathBuf,
    unknown_atlas: bool,
}

impl GroupExporter<'_> {
    fn export(
        &self,
        group: &AnimationGroup,
        selected: &[usize],
        single: bool,
        settings: &ExportSettings,
        stats: &mut AtlasStats,
    ) {
        let frames: Vec<&Frame> = selected.iter().map(|&i| &group.frames[i]).collect();
        let wants_frames = settings.frame_format != FrameFormat::None;
        let wants_animation = settings.animation_format != AnimationFormat::None;
        if !wants_frames && !wants_animation {
            return;
        }

        let stem = match output_stem(settings, self.sheet, &group.name) {
            Ok(stem) => stem,
            Err(e) => {
                self.fail(stats, ANIMATION_FAILED, &group.name, e);
                return;
            }
        };

        if single {
            match self.write_still(frames[0], &stem, settings) {
                Ok(()) => stats.animations += 1,
                Err(e) => self.fail(stats, ANIMATION_FAILED, &group.name, e),
            }
            return;
        }

        if wants_frames {
            match self.write_frames(&frames, selected, group, &stem, settings) {
                Ok(n) => stats.frames += n,
                Err(e) => self.fail(stats, FRAME_FAILED, &group.name, e),
            }
        }

        if wants_animation {
            match self.write_animation(&frames, &stem, settings) {
                Ok(()) => stats.animations += 1,
                Err(e) => self.fail(stats, ANIMATION_FAILED, &group.name, e),
            }
        }
    }

    fn fail(&self, stats: &mut AtlasStats, code: &str, animation: &str, error: AtlasError) {
        log::warn!("{}/{}: {}", self.sheet, animation, error);
        let mut diagnostic = Diagnostic::error(code, error.to_string()).with_subject(animation.to_string());
        if let Some(help) = miette::Diagnostic::help(&error) {
            diagnostic = diagnostic.with_help(help.to_string());
        }
        stats.report.push(diagnostic);
    }

    /// One still image in place of an animation.
    fn write_still(&self, frame: &Frame, stem: &str, settings: &ExportSettings) -> Result<()> {
        let format = match settings.frame_format {
            FrameFormat::None => FrameFormat::Png,
            other => other,
        };
        let images = compose(&[frame], settings, Target::Frames, self.unknown_atlas);
        create_dir(&self.dir)?;
        let path = self.dir.join(format!("{}.{}", stem, extension(format)));
        write_frame(&images[0], format, &path)
    }

    fn write_frames(
        &self,
        frames: &[&Frame],
        selected: &[usize],
        group: &AnimationGroup,
        stem: &str,
        settings: &ExportSettings,
    ) -> Result<usize> {
        let format = settings.frame_format;
        let images = compose(frames, settings, Target::Frames, self.unknown_atlas);
        let dir = self.dir.join(sanitize(&group.name));
        create_dir(&dir)?;

        for (image, &index) in images.iter().zip(selected) {
            let name = format!("{} {}.{}", stem, frame_index(index, group.len()), extension(format));
            write_frame(image, format, &dir.join(name))?;
        }
        Ok(images.len())
    }

    fn write_animation(&self, frames: &[&Frame], stem: &str, settings: &ExportSettings) -> Result<()> {
        let format = settings.animation_format;
        let Some(encoder) = encoder_for(format) else {
            return Ok(());
        };

        let mut images = compose(frames, settings, Target::Animation, self.unknown_atlas);
        if format == AnimationFormat::Gif {
            for image in &mut images {
                threshold_alpha(image, settings.alpha_threshold);
            }
        }

        let explicit: Vec<Option<u32>> = frames.iter().map(|f| f.duration_ms).collect();
        let durations = frame_durations(&explicit, settings, format.delay_granularity());

        create_dir(&self.dir)?;
        let path = self
            .dir
            .join(format!("{}.{}", stem, format.extension().unwrap_or("bin")));
        encoder.encode(&images, &durations, settings.loop_forever, &generator_comment(), &path)
    }
}

fn extension(format: FrameFormat) -> &'static str {
    format.extension().unwrap_or("png")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::AutoPrompt;
    use crate::report::Severity;
    use crate::types::SettingsOverrides;
    use image::{Rgba, RgbaImage};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const STARLING: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<TextureAtlas imagePath="walk.png">
  <SubTexture name="Walk0000" x="0" y="0" width="10" height="10"/>
  <SubTexture name="Walk0001" x="10" y="0" width="10" height="10"/>
  <SubTexture name="Idle0000" x="0" y="0" width="10" height="10"/>
</TextureAtlas>"#;

    fn atlas(dir: &Path) -> AtlasJob {
        let mut img = RgbaImage::new(20, 10);
        for y in 2..8 {
            for x in 2..8 {
                img.put_pixel(x, y, Rgba([255, 0, 0, 255]));
                img.put_pixel(x + 10, y, Rgba([0, 0, 255, 255]));
            }
        }
        let image = dir.join("walk.png");
        img.save(&image).unwrap();
        fs::write(dir.join("walk.xml"), STARLING).unwrap();
        AtlasJob {
            image,
            metadata: Some(dir.join("walk.xml")),
            character: None,
        }
    }

    fn run(job: &AtlasJob, store: &SettingsStore, output: &Path) -> Result<AtlasStats> {
        let registry = ParserRegistry::new();
        let ctx = ExtractContext {
            registry: &registry,
            store,
            output,
            prompt: &AutoPrompt,
        };
        extract_atlas(job, &ctx)
    }

    #[test]
    fn test_extract_writes_animation_and_still() {
        let dir = TempDir::new().unwrap();
        let job = atlas(dir.path());
        let out = dir.path().join("out");

        let stats = run(&job, &SettingsStore::new(), &out).unwrap();
        assert_eq!(stats.animations, 2);
        assert_eq!(stats.frames, 0);
        assert!(out.join("walk/walk - Walk.gif").is_file());
        assert!(out.join("walk/walk - Idle.png").is_file());
    }

    #[test]
    fn test_extract_frames_cropped_and_indexed() {
        let dir = TempDir::new().unwrap();
        let job = atlas(dir.path());
        let out = dir.path().join("out");

        let mut store = SettingsStore::new();
        store.defaults = SettingsOverrides {
            frame_format: Some(FrameFormat::Png),
            animation_format: Some(AnimationFormat::None),
            ..Default::default()
        };
        let stats = run(&job, &store, &out).unwrap();
        assert_eq!(stats.frames, 2);

        let frame = image::open(out.join("walk/Walk/walk - Walk 0001.png"))
            .unwrap()
            .to_rgba8();
        assert_eq!(frame.dimensions(), (6, 6));
        assert_eq!(frame.get_pixel(0, 0), &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_export_failure_is_recorded_not_fatal() {
        let dir = TempDir::new().unwrap();
        let job = atlas(dir.path());
        let out = dir.path().join("out");

        let mut store = SettingsStore::new();
        store.defaults = SettingsOverrides {
            frame_format: Some(FrameFormat::Dds),
            ..Default::default()
        };
        let stats = run(&job, &store, &out).unwrap();
        assert_eq!(stats.report.count_code(FRAME_FAILED), 1);
        // The single-frame group's DDS still fails too.
        assert_eq!(stats.report.count_code(ANIMATION_FAILED), 1);
        assert!(stats.report.iter().all(|d| d.severity == Severity::Error));
        assert!(stats.report.iter().all(|d| d.help.is_some()));
        // The Walk animation still exports.
        assert_eq!(stats.animations, 1);
        assert!(out.join("walk/walk - Walk.gif").is_file());
    }

    #[test]
    fn test_extract_writes_webp_animation() {
        let dir = TempDir::new().unwrap();
        let job = atlas(dir.path());
        let out = dir.path().join("out");

        let mut store = SettingsStore::new();
        store.defaults = SettingsOverrides {
            animation_format: Some(AnimationFormat::Webp),
            ..Default::default()
        };
        let stats = run(&job, &store, &out).unwrap();
        assert!(stats.report.is_empty());
        assert_eq!(stats.animations, 2);
        assert!(out.join("walk/walk - Walk.webp").is_file());
    }

    #[test]
    fn test_empty_selection_warns() {
        let dir = TempDir::new().unwrap();
        let job = atlas(dir.path());
        let out = dir.path().join("out");

        let mut store = SettingsStore::new();
        store.set_animation(
            "walk",
            "Walk",
            SettingsOverrides {
                frame_selection: Some("7".into()),
                ..Default::default()
            },
        );
        let stats = run(&job, &store, &out).unwrap();
        assert_eq!(stats.report.count_code(EMPTY_SELECTION), 1);
        assert_eq!(stats.animations, 1);
    }

    #[test]
    fn test_missing_image_is_io_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("walk.xml"), STARLING).unwrap();
        let job = AtlasJob {
            image: dir.path().join("walk.png"),
            metadata: Some(dir.path().join("walk.xml")),
            character: None,
        };
        let err = run(&job, &SettingsStore::new(), dir.path()).unwrap_err();
        assert!(matches!(err, AtlasError::Io { .. }));
    }

    #[test]
    fn test_unknown_atlas_detects_sprites() {
        let dir = TempDir::new().unwrap();
        let mut img = RgbaImage::new(12, 4);
        img.put_pixel(1, 1, Rgba([9, 9, 9, 255]));
        img.put_pixel(8, 2, Rgba([9, 9, 9, 255]));
        let image = dir.path().join("coins.png");
        img.save(&image).unwrap();

        let mut store = SettingsStore::new();
        store.defaults = SettingsOverrides {
            frame_format: Some(FrameFormat::Png),
            animation_format: Some(AnimationFormat::None),
            ..Default::default()
        };
        let stats = run(&AtlasJob::unknown(&image), &store, &dir.path().join("out")).unwrap();
        // Both detected sprites normalize to the same name.
        assert_eq!(stats.frames, 2);
    }
}
