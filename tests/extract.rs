//! End-to-end extraction tests.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, Rgba, RgbaImage};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use unatlas::animation::{frame_durations, group_frames, is_single_frame, select_frames};
use unatlas::detect::AutoPrompt;
use unatlas::render::reconstruct_all;
use unatlas::report::Report;
use unatlas::{
    discover, run_batch, AnimationFormat, AtlasError, BatchOptions, ExtractContext, FrameSelection,
    Manifest, ParserRegistry, SettingsOverrides, SettingsStore,
};

const WALK_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<TextureAtlas imagePath="walk.png">
  <SubTexture name="Walk0" x="0" y="0" width="10" height="10"/>
  <SubTexture name="Walk1" x="10" y="0" width="10" height="10"/>
</TextureAtlas>
"#;

/// 20x10 atlas with a red left half and a blue right half.
fn walk_atlas() -> RgbaImage {
    RgbaImage::from_fn(20, 10, |x, _| {
        if x < 10 {
            Rgba([255, 0, 0, 255])
        } else {
            Rgba([0, 0, 255, 255])
        }
    })
}

fn gif_delays(path: &Path) -> Vec<u32> {
    let decoder = GifDecoder::new(BufReader::new(File::open(path).unwrap())).unwrap();
    decoder
        .into_frames()
        .collect_frames()
        .unwrap()
        .iter()
        .map(|f| {
            let (n, d) = f.delay().numer_denom_ms();
            n / d
        })
        .collect()
}

fn walk_settings() -> SettingsOverrides {
    SettingsOverrides {
        fps: Some(10.0),
        end_delay_ms: Some(100),
        min_period_ms: Some(0),
        frame_selection: Some(FrameSelection::All),
        ..Default::default()
    }
}

#[test]
fn test_starling_walk_in_memory() {
    let registry = ParserRegistry::new();
    let (_, sheet) = registry
        .parse(Path::new("walk.xml"), WALK_XML.as_bytes())
        .unwrap();

    let mut report = Report::new();
    let frames = reconstruct_all(&walk_atlas(), &sheet.sprites, &mut report);
    assert!(report.is_empty());

    let groups = group_frames(frames, &sheet.tags);
    assert_eq!(groups.len(), 1);
    let walk = &groups[0];
    assert_eq!(walk.name, "Walk");
    assert_eq!(walk.len(), 2);
    assert_eq!(walk.frames[0].image.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
    assert_eq!(walk.frames[1].image.get_pixel(0, 0), &Rgba([0, 0, 255, 255]));

    let mut store = SettingsStore::new();
    store.defaults = walk_settings();
    let settings = store.resolve("walk", "Walk");

    let selected = select_frames(walk, &settings.frame_selection, is_single_frame(walk));
    assert_eq!(selected, vec![0, 1]);

    let explicit: Vec<Option<u32>> = selected.iter().map(|&i| walk.frames[i].duration_ms).collect();
    assert_eq!(frame_durations(&explicit, &settings, 1), vec![100, 200]);
}

#[test]
fn test_starling_walk_on_disk() {
    let dir = TempDir::new().unwrap();
    walk_atlas().save(dir.path().join("walk.png")).unwrap();
    fs::write(dir.path().join("walk.xml"), WALK_XML).unwrap();
    let out = dir.path().join("out");

    let manifest = Manifest::default();
    let registry = ParserRegistry::new();
    let jobs = discover(&[dir.path().to_path_buf()], &manifest, &registry, &[out.clone()]).unwrap();
    assert_eq!(jobs.len(), 1);

    let mut store = manifest.store().unwrap();
    store.override_defaults(&walk_settings());
    let ctx = ExtractContext {
        registry: &registry,
        store: &store,
        output: &out,
        prompt: &AutoPrompt,
    };
    let summary = run_batch(&jobs, &ctx, &BatchOptions::default(), |_| {}).unwrap();

    assert!(summary.is_success());
    assert_eq!(summary.total_animations(), 1);
    assert_eq!(gif_delays(&out.join("walk/walk - Walk.gif")), vec![100, 200]);
}

#[test]
fn test_character_overlay_reorders_and_times() {
    let dir = TempDir::new().unwrap();
    let atlas = RgbaImage::from_fn(30, 10, |x, _| Rgba([(x / 10 * 100) as u8, 0, 0, 255]));
    atlas.save(dir.path().join("bf.png")).unwrap();
    fs::write(
        dir.path().join("bf.xml"),
        r#"<TextureAtlas imagePath="bf.png">
  <SubTexture name="BF idle dance0000" x="0" y="0" width="10" height="10"/>
  <SubTexture name="BF idle dance0001" x="10" y="0" width="10" height="10"/>
  <SubTexture name="BF idle dance0002" x="20" y="0" width="10" height="10"/>
</TextureAtlas>"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("bf.json"),
        r#"{"image": "characters/bf", "animations": [
            {"anim": "idle", "name": "BF idle dance", "fps": 10, "loop": false,
             "indices": [2, 0], "offsets": [0, 0]}
        ]}"#,
    )
    .unwrap();
    let out = dir.path().join("out");

    let registry = ParserRegistry::new();
    let manifest = Manifest::default();
    let jobs = discover(&[dir.path().join("bf.png")], &manifest, &registry, &[]).unwrap();
    assert_eq!(jobs[0].character, Some(dir.path().join("bf.json")));
    assert_eq!(jobs[0].metadata, Some(dir.path().join("bf.xml")));

    let store = manifest.store().unwrap();
    let ctx = ExtractContext {
        registry: &registry,
        store: &store,
        output: &out,
        prompt: &AutoPrompt,
    };
    let summary = run_batch(&jobs, &ctx, &BatchOptions::default(), |_| {}).unwrap();
    assert!(summary.is_success());

    // Two frames from the overlay's indices; the last carries the 250ms end delay.
    assert_eq!(
        gif_delays(&out.join("bf/bf - BF idle dance.gif")),
        vec![100, 350]
    );
}

#[test]
fn test_unknown_atlas_background_removed() {
    let dir = TempDir::new().unwrap();
    let mut atlas = RgbaImage::from_pixel(16, 8, Rgba([255, 0, 255, 255]));
    for y in 2..6 {
        for x in 1..4 {
            atlas.put_pixel(x, y, Rgba([0, 0, 0, 255]));
        }
        for x in 9..14 {
            atlas.put_pixel(x, y, Rgba([0, 0, 0, 255]));
        }
    }
    atlas.save(dir.path().join("coins.png")).unwrap();
    let out = dir.path().join("out");

    let registry = ParserRegistry::new();
    let manifest = Manifest::default();
    let jobs = discover(&[dir.path().join("coins.png")], &manifest, &registry, &[]).unwrap();
    assert!(jobs[0].is_unknown());

    let mut store = SettingsStore::new();
    store.defaults = SettingsOverrides {
        frame_format: Some(unatlas::FrameFormat::Png),
        animation_format: Some(AnimationFormat::None),
        crop: Some(unatlas::CropOption::FrameBased),
        ..Default::default()
    };
    let ctx = ExtractContext {
        registry: &registry,
        store: &store,
        output: &out,
        prompt: &AutoPrompt,
    };
    let summary = run_batch(&jobs, &ctx, &BatchOptions::default(), |_| {}).unwrap();
    assert_eq!(summary.total_frames(), 2);

    let second = image::open(out.join("coins/coins/coins - coins 0001.png"))
        .unwrap()
        .to_rgba8();
    assert_eq!(second.dimensions(), (5, 4));
    assert_eq!(second.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
}

#[test]
fn test_comment_only_txt_is_content_error() {
    let registry = ParserRegistry::new();
    let err = registry
        .parse(Path::new("empty.txt"), b"# nothing here\n")
        .unwrap_err();
    assert!(matches!(err, AtlasError::Content { .. }));
}
