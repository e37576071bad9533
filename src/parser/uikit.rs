//! Apple / UIKit / cocos2d property-list parser.
//!
//! Two layouts of the `frames` dictionary are read:
//!
//! - rect records: `frame` (or `textureRect`), `offset` (or `spriteOffset`),
//!   `sourceColorRect`, `sourceSize` (or `spriteSourceSize`) and `rotated`
//!   (or `textureRotated`). Rectangles are either `{{x,y},{w,h}}` strings or
//!   nested arrays.
//! - flat records: `x`, `y`, `w|width`, `h|height`, `oX|offsetX`,
//!   `oY|offsetY`, `oW|originalWidth`, `oH|originalHeight`.
//!
//! Like JSON, rect records store the unrotated size of rotated sprites.
//! Both XML and binary plists are accepted.

use std::io::Cursor;
use std::path::Path;
use std::sync::OnceLock;

use plist::{Dictionary, Value};
use regex::Regex;

use crate::error::{AtlasError, Result};
use crate::types::SpriteMetadata;

use super::{has_extension, non_empty, MetadataFormat, MetadataParser, ParsedSheet};

pub struct PlistParser;

/// Every number in a value, depth first. Strings like `{{1,2},{3,4}}` yield
/// their numeric tokens.
fn numbers(value: &Value) -> Vec<f64> {
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    match value {
        Value::Real(v) => vec![*v],
        Value::Integer(i) => i
            .as_signed()
            .map(|v| v as f64)
            .or_else(|| i.as_unsigned().map(|v| v as f64))
            .into_iter()
            .collect(),
        Value::String(s) => {
            let re = NUMBER.get_or_init(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("valid regex"));
            re.find_iter(s)
                .filter_map(|m| m.as_str().parse().ok())
                .collect()
        }
        Value::Array(items) => items.iter().flat_map(numbers).collect(),
        _ => Vec::new(),
    }
}

fn px(v: f64) -> u32 {
    v.round().max(0.0) as u32
}

struct Record<'a> {
    name: &'a str,
    dict: &'a Dictionary,
    path: &'a Path,
}

impl<'a> Record<'a> {
    fn first(&self, keys: &[&str]) -> Option<&'a Value> {
        keys.iter().find_map(|k| self.dict.get(k))
    }

    /// Exactly `n` numbers from the first present key.
    fn tuple(&self, keys: &[&str], n: usize) -> Result<Option<Vec<f64>>> {
        let Some(value) = self.first(keys) else {
            return Ok(None);
        };
        let nums = numbers(value);
        if nums.len() != n {
            return Err(AtlasError::format(
                self.path,
                format!("frame '{}': malformed '{}'", self.name, keys[0]),
            ));
        }
        Ok(Some(nums))
    }

    fn scalar(&self, keys: &[&str]) -> Result<Option<f64>> {
        Ok(self.tuple(keys, 1)?.map(|v| v[0]))
    }

    fn require(&self, keys: &[&str]) -> Result<f64> {
        self.scalar(keys)?.ok_or_else(|| {
            AtlasError::format(
                self.path,
                format!("frame '{}': missing required key '{}'", self.name, keys[0]),
            )
        })
    }

    fn flag(&self, keys: &[&str]) -> bool {
        match self.first(keys) {
            Some(Value::Boolean(b)) => *b,
            Some(Value::String(s)) => matches!(s.trim(), "true" | "YES" | "yes" | "1"),
            Some(Value::Integer(i)) => i.as_signed() == Some(1),
            _ => false,
        }
    }
}

fn rect_sprite(rec: &Record<'_>, rect: &[f64]) -> Result<SpriteMetadata> {
    let rotated = rec.flag(&["rotated", "textureRotated"]);
    let (w, h) = (px(rect[2]), px(rect[3]));
    let (atlas_w, atlas_h) = if rotated { (h, w) } else { (w, h) };

    let (source_w, source_h) = match rec.tuple(&["sourceSize", "spriteSourceSize"], 2)? {
        Some(s) => (px(s[0]), px(s[1])),
        None => (w, h),
    };

    let (trim_x, trim_y) = match rec.tuple(&["sourceColorRect"], 4)? {
        Some(r) => (r[0].round() as i32, r[1].round() as i32),
        None => {
            // Offsets are measured from the frame centre, y pointing up.
            let (ox, oy) = match rec.tuple(&["offset", "spriteOffset"], 2)? {
                Some(o) => (o[0], o[1]),
                None => (0.0, 0.0),
            };
            (
                ((source_w as f64 - w as f64) / 2.0 + ox).round() as i32,
                ((source_h as f64 - h as f64) / 2.0 - oy).round() as i32,
            )
        }
    };

    Ok(
        SpriteMetadata::new(rec.name, px(rect[0]), px(rect[1]), atlas_w, atlas_h)
            .with_rotated(rotated)
            .with_frame(-trim_x, -trim_y, source_w, source_h),
    )
}

fn flat_sprite(rec: &Record<'_>) -> Result<SpriteMetadata> {
    let w = px(rec.require(&["w", "width"])?);
    let h = px(rec.require(&["h", "height"])?);
    let ox = rec.scalar(&["oX", "offsetX"])?.unwrap_or(0.0).round() as i32;
    let oy = rec.scalar(&["oY", "offsetY"])?.unwrap_or(0.0).round() as i32;
    let ow = rec.scalar(&["oW", "originalWidth"])?.map(px).unwrap_or(w);
    let oh = rec.scalar(&["oH", "originalHeight"])?.map(px).unwrap_or(h);

    Ok(SpriteMetadata::new(
        rec.name,
        px(rec.require(&["x"])?),
        px(rec.require(&["y"])?),
        w,
        h,
    )
    .with_rotated(rec.flag(&["rotated", "r"]))
    .with_frame(-ox, -oy, ow, oh))
}

fn sprite_from(name: &str, value: &Value, path: &Path) -> Result<SpriteMetadata> {
    let dict = value.as_dictionary().ok_or_else(|| {
        AtlasError::format(path, format!("frame '{}' is not a dictionary", name))
    })?;
    let rec = Record { name, dict, path };
    match rec.tuple(&["frame", "textureRect"], 4)? {
        Some(rect) => rect_sprite(&rec, &rect),
        None => flat_sprite(&rec),
    }
}

fn load(data: &[u8], path: &Path) -> Result<Value> {
    Value::from_reader(Cursor::new(data))
        .map_err(|e| AtlasError::format(path, format!("invalid plist: {}", e)))
}

impl MetadataParser for PlistParser {
    fn format(&self) -> MetadataFormat {
        MetadataFormat::Plist
    }

    fn detect(&self, path: &Path, data: &[u8]) -> bool {
        if data.starts_with(b"bplist") {
            return true;
        }
        let head = String::from_utf8_lossy(&data[..data.len().min(512)]);
        has_extension(path, "plist") || head.contains("<plist") || head.contains("DTD PLIST")
    }

    fn parse(&self, data: &[u8], path: &Path) -> Result<ParsedSheet> {
        let root = load(data, path)?;
        let root = root
            .as_dictionary()
            .ok_or_else(|| AtlasError::format(path, "plist root is not a dictionary"))?;

        let frames = root
            .get("frames")
            .and_then(Value::as_dictionary)
            .ok_or_else(|| AtlasError::Format {
                path: path.to_path_buf(),
                message: "missing 'frames' dictionary".to_string(),
                help: Some("Sprite plists keep one entry per sprite under \"frames\"".to_string()),
            })?;

        let sprites = frames
            .iter()
            .map(|(name, value)| sprite_from(name, value, path))
            .collect::<Result<Vec<_>>>()?;

        let image = root
            .get("metadata")
            .and_then(Value::as_dictionary)
            .and_then(|m| {
                m.get("realTextureFileName")
                    .or_else(|| m.get("textureFileName"))
            })
            .and_then(Value::as_string)
            .map(str::to_string);

        non_empty(
            ParsedSheet {
                sprites,
                image,
                ..Default::default()
            },
            path,
        )
    }
}
