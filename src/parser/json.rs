//! TexturePacker JSON parsers (hash and array layouts).
//!
//! Both layouts share one frame schema:
//!
//! ```json
//! { "frame": {"x": 2, "y": 2, "w": 30, "h": 40},
//!   "rotated": false, "trimmed": true,
//!   "spriteSourceSize": {"x": 1, "y": 3, "w": 30, "h": 40},
//!   "sourceSize": {"w": 32, "h": 44} }
//! ```
//!
//! The hash layout keys frames by name; the array layout carries a
//! `filename` field. Frame order is file order in both cases.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{AtlasError, Result};
use crate::types::SpriteMetadata;

use super::{has_extension, non_empty, text, MetadataFormat, MetadataParser, ParsedSheet};

#[derive(Debug, Deserialize)]
pub(super) struct JsonRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

#[derive(Debug, Deserialize)]
pub(super) struct JsonPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Deserialize)]
pub(super) struct JsonSize {
    pub w: f64,
    pub h: f64,
}

#[derive(Debug, Deserialize)]
pub(super) struct JsonFrame {
    #[serde(default)]
    pub filename: Option<String>,
    pub frame: JsonRect,
    #[serde(default)]
    pub rotated: bool,
    #[serde(rename = "spriteSourceSize", default)]
    pub sprite_source_size: Option<JsonPoint>,
    #[serde(rename = "sourceSize", default)]
    pub source_size: Option<JsonSize>,
    #[serde(default)]
    pub pivot: Option<JsonPoint>,
    #[serde(default)]
    pub duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct JsonTag {
    pub name: String,
    pub from: usize,
    pub to: usize,
    #[serde(default)]
    pub direction: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct JsonMeta {
    #[serde(default)]
    pub app: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(rename = "frameTags", default)]
    pub frame_tags: Vec<JsonTag>,
}

/// A parsed JSON document: named frames in file order plus `meta`.
pub(super) struct JsonDocument {
    pub frames: Vec<(String, JsonFrame)>,
    pub meta: JsonMeta,
}

fn px(v: f64) -> u32 {
    v.round().max(0.0) as u32
}

fn load_value(data: &[u8], path: &Path) -> Result<Value> {
    serde_json::from_str(text(data, path)?)
        .map_err(|e| AtlasError::format(path, format!("invalid JSON: {}", e)))
}

/// Shape of the `frames` member, if the document looks like a sprite sheet.
pub(super) fn frames_kind(path: &Path, data: &[u8]) -> Option<(bool, Option<String>)> {
    if !(has_extension(path, "json") || data.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'{')) {
        return None;
    }
    let value = load_value(data, path).ok()?;
    let app = value
        .pointer("/meta/app")
        .and_then(Value::as_str)
        .map(str::to_string);
    match value.get("frames")? {
        Value::Object(_) => Some((true, app)),
        Value::Array(_) => Some((false, app)),
        _ => None,
    }
}

pub(super) fn load_document(data: &[u8], path: &Path) -> Result<JsonDocument> {
    let mut value = load_value(data, path)?;

    let meta = match value.get_mut("meta").map(Value::take) {
        Some(Value::Null) | None => JsonMeta::default(),
        Some(meta) => serde_json::from_value(meta)
            .map_err(|e| AtlasError::format(path, format!("invalid meta block: {}", e)))?,
    };

    let frames = match value.get_mut("frames").map(Value::take) {
        Some(Value::Object(map)) => map
            .into_iter()
            .map(|(name, v)| {
                let frame: JsonFrame = serde_json::from_value(v).map_err(|e| {
                    AtlasError::format(path, format!("frame '{}': {}", name, e))
                })?;
                Ok((name, frame))
            })
            .collect::<Result<Vec<_>>>()?,
        Some(Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                let frame: JsonFrame = serde_json::from_value(v)
                    .map_err(|e| AtlasError::format(path, format!("frame #{}: {}", i, e)))?;
                let name = frame.filename.clone().ok_or_else(|| {
                    AtlasError::format(path, format!("frame #{} has no filename", i))
                })?;
                Ok((name, frame))
            })
            .collect::<Result<Vec<_>>>()?,
        _ => {
            return Err(AtlasError::Format {
                path: path.to_path_buf(),
                message: "missing 'frames' object or array".to_string(),
                help: Some("TexturePacker JSON needs a top-level \"frames\" member".to_string()),
            })
        }
    };

    Ok(JsonDocument { frames, meta })
}

/// Convert one JSON frame into sprite metadata.
pub(super) fn sprite_from(name: &str, frame: &JsonFrame) -> SpriteMetadata {
    let (w, h) = (px(frame.frame.w), px(frame.frame.h));
    // The JSON rect holds the unrotated size; the atlas region is swapped.
    let (atlas_w, atlas_h) = if frame.rotated { (h, w) } else { (w, h) };

    let (offset_x, offset_y) = frame
        .sprite_source_size
        .as_ref()
        .map(|p| (p.x.round() as i32, p.y.round() as i32))
        .unwrap_or((0, 0));
    let (frame_w, frame_h) = frame
        .source_size
        .as_ref()
        .map(|s| (px(s.w), px(s.h)))
        .unwrap_or((w, h));

    let mut sprite = SpriteMetadata::new(name, px(frame.frame.x), px(frame.frame.y), atlas_w, atlas_h)
        .with_rotated(frame.rotated)
        .with_frame(-offset_x, -offset_y, frame_w, frame_h);
    sprite.pivot = frame.pivot.as_ref().map(|p| (p.x as f32, p.y as f32));
    sprite.duration_ms = frame.duration.map(|d| d.round().max(0.0) as u32);
    sprite
}

fn parse_sprites(data: &[u8], path: &Path) -> Result<ParsedSheet> {
    let doc = load_document(data, path)?;
    let sprites = doc
        .frames
        .iter()
        .map(|(name, frame)| sprite_from(name, frame))
        .collect();

    non_empty(
        ParsedSheet {
            sprites,
            image: doc.meta.image,
            ..Default::default()
        },
        path,
    )
}

fn is_aseprite(app: &Option<String>) -> bool {
    app.as_deref()
        .map(|a| a.to_ascii_lowercase().contains("aseprite"))
        .unwrap_or(false)
}

/// JSON with `frames` as an object keyed by sprite name.
pub struct JsonHashParser;

impl MetadataParser for JsonHashParser {
    fn format(&self) -> MetadataFormat {
        MetadataFormat::JsonHash
    }

    fn detect(&self, path: &Path, data: &[u8]) -> bool {
        matches!(frames_kind(path, data), Some((true, ref app)) if !is_aseprite(app))
    }

    fn parse(&self, data: &[u8], path: &Path) -> Result<ParsedSheet> {
        parse_sprites(data, path)
    }
}

/// JSON with `frames` as an array of records with a `filename`.
pub struct JsonArrayParser;

impl MetadataParser for JsonArrayParser {
    fn format(&self) -> MetadataFormat {
        MetadataFormat::JsonArray
    }

    fn detect(&self, path: &Path, data: &[u8]) -> bool {
        matches!(frames_kind(path, data), Some((false, ref app)) if !is_aseprite(app))
    }

    fn parse(&self, data: &[u8], path: &Path) -> Result<ParsedSheet> {
        parse_sprites(data, path)
    }
}
