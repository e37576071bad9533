//! Engine character files.
//!
//! Rhythm-game engines ship a character file next to each atlas describing
//! how its animations play. They carry no geometry; each animation entry
//! becomes a settings overlay keyed by the sprite-name prefix it animates.
//!
//! Three dialects are read:
//!
//! - Psych Engine JSON: `animations[] { anim, name, fps, loop, indices, offsets }`
//! - V-Slice JSON: `animations[] { name, prefix, frameRate, looped, frameIndices, offsets }`
//! - Codename Engine XML: `<character sprite=..><anim name anim fps loop x y indices/></character>`

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{AtlasError, Result};
use crate::types::{Alignment, SettingsOverrides};

use super::xml::{read_elements, root_name, XmlElement};
use super::{has_extension, text};

/// Which engine wrote a character file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterDialect {
    Psych,
    VSlice,
    Codename,
}

impl fmt::Display for CharacterDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CharacterDialect::Psych => write!(f, "Psych Engine"),
            CharacterDialect::VSlice => write!(f, "V-Slice"),
            CharacterDialect::Codename => write!(f, "Codename Engine"),
        }
    }
}

/// Playback settings for one animation prefix.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CharacterAnimation {
    /// Engine-side animation name (e.g. `idle`).
    pub name: String,
    /// Sprite-name prefix in the atlas (e.g. `BF idle dance`).
    pub prefix: String,
    pub fps: Option<f64>,
    pub looped: Option<bool>,
    /// Explicit frame order; empty means "all frames in order".
    pub indices: Vec<usize>,
    pub offset: (i32, i32),
}

impl CharacterAnimation {
    /// Settings overlay for this animation.
    pub fn overrides(&self) -> SettingsOverrides {
        let alignment = (self.offset != (0, 0)).then(|| Alignment {
            // Engines subtract the offset from the draw position.
            offset: (-self.offset.0, -self.offset.1),
            ..Default::default()
        });
        SettingsOverrides {
            fps: self.fps.filter(|f| *f > 0.0),
            loop_forever: self.looped,
            explicit_indices: (!self.indices.is_empty()).then(|| self.indices.clone()),
            alignment,
            ..Default::default()
        }
    }
}

/// Everything read from a character file.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterData {
    pub dialect: CharacterDialect,
    /// Atlas path as recorded by the engine, without extension.
    pub image: Option<String>,
    pub animations: Vec<CharacterAnimation>,
}

#[derive(Deserialize)]
struct PsychFile {
    #[serde(default)]
    image: Option<String>,
    animations: Vec<PsychAnimation>,
}

#[derive(Deserialize)]
struct PsychAnimation {
    anim: String,
    name: String,
    #[serde(default)]
    fps: Option<f64>,
    #[serde(rename = "loop", default)]
    looped: Option<bool>,
    #[serde(default)]
    indices: Vec<i64>,
    #[serde(default)]
    offsets: Vec<f64>,
}

#[derive(Deserialize)]
struct VSliceFile {
    #[serde(rename = "assetPath", default)]
    asset_path: Option<String>,
    animations: Vec<VSliceAnimation>,
}

#[derive(Deserialize)]
struct VSliceAnimation {
    name: String,
    prefix: String,
    #[serde(rename = "frameRate", default)]
    frame_rate: Option<f64>,
    #[serde(default)]
    looped: Option<bool>,
    #[serde(rename = "frameIndices", default)]
    frame_indices: Vec<i64>,
    #[serde(default)]
    offsets: Vec<f64>,
}

fn offset_pair(offsets: &[f64]) -> (i32, i32) {
    match offsets {
        [x, y, ..] => (x.round() as i32, y.round() as i32),
        [x] => (x.round() as i32, 0),
        [] => (0, 0),
    }
}

fn non_negative(indices: Vec<i64>) -> Vec<usize> {
    indices
        .into_iter()
        .filter_map(|i| usize::try_from(i).ok())
        .collect()
}

/// `0,1,2` or `0..3` (inclusive), mixed freely.
fn codename_indices(raw: &str, path: &Path) -> Result<Vec<usize>> {
    let bad = || AtlasError::format(path, format!("invalid indices '{}'", raw));
    let mut out = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once("..") {
            Some((lo, hi)) => {
                let lo: usize = lo.trim().parse().map_err(|_| bad())?;
                let hi: usize = hi.trim().parse().map_err(|_| bad())?;
                if lo <= hi {
                    out.extend(lo..=hi);
                } else {
                    out.extend((hi..=lo).rev());
                }
            }
            None => out.push(part.parse().map_err(|_| bad())?),
        }
    }
    Ok(out)
}

fn json_dialect(value: &Value) -> Option<CharacterDialect> {
    let first = value.get("animations")?.as_array()?.first()?;
    if first.get("anim").is_some() {
        Some(CharacterDialect::Psych)
    } else if first.get("prefix").is_some() {
        Some(CharacterDialect::VSlice)
    } else {
        None
    }
}

fn parse_json(value: Value, dialect: CharacterDialect, path: &Path) -> Result<CharacterData> {
    let invalid = |e: serde_json::Error| {
        AtlasError::format(path, format!("invalid {} character file: {}", dialect, e))
    };
    let (image, animations) = match dialect {
        CharacterDialect::Psych => {
            let file: PsychFile = serde_json::from_value(value).map_err(invalid)?;
            let anims = file
                .animations
                .into_iter()
                .map(|a| CharacterAnimation {
                    name: a.anim,
                    prefix: a.name,
                    fps: a.fps,
                    looped: a.looped,
                    indices: non_negative(a.indices),
                    offset: offset_pair(&a.offsets),
                })
                .collect();
            (file.image, anims)
        }
        _ => {
            let file: VSliceFile = serde_json::from_value(value).map_err(invalid)?;
            let anims = file
                .animations
                .into_iter()
                .map(|a| CharacterAnimation {
                    name: a.name,
                    prefix: a.prefix,
                    fps: a.frame_rate,
                    looped: a.looped,
                    indices: non_negative(a.frame_indices),
                    offset: offset_pair(&a.offsets),
                })
                .collect();
            (file.asset_path, anims)
        }
    };
    Ok(CharacterData {
        dialect,
        image,
        animations,
    })
}

fn codename_animation(el: &XmlElement, path: &Path) -> Result<CharacterAnimation> {
    let name = el.get("name").unwrap_or_default().to_string();
    let prefix = el
        .get("anim")
        .ok_or_else(|| AtlasError::format(path, format!("anim '{}' has no 'anim' prefix", name)))?
        .to_string();
    Ok(CharacterAnimation {
        name,
        prefix,
        fps: el.number("fps", path)?,
        looped: el.get("loop").map(|_| el.flag("loop")),
        indices: match el.get("indices") {
            Some(raw) => codename_indices(raw, path)?,
            None => Vec::new(),
        },
        offset: (
            el.opt_i32("x", path)?.unwrap_or(0),
            el.opt_i32("y", path)?.unwrap_or(0),
        ),
    })
}

fn parse_codename(src: &str, path: &Path) -> Result<CharacterData> {
    let elements = read_elements(src, path)?;
    let image = elements
        .iter()
        .find(|e| e.name == "character")
        .and_then(|e| e.get("sprite"))
        .map(str::to_string);
    let animations = elements
        .iter()
        .filter(|e| e.name == "anim")
        .map(|e| codename_animation(e, path))
        .collect::<Result<Vec<_>>>()?;
    Ok(CharacterData {
        dialect: CharacterDialect::Codename,
        image,
        animations,
    })
}

impl CharacterData {
    /// Parse a character file, or `Ok(None)` if the data is not one.
    pub fn parse(data: &[u8], path: &Path) -> Result<Option<CharacterData>> {
        let Ok(src) = text(data, path) else {
            return Ok(None);
        };
        let trimmed = src.trim_start();

        if trimmed.starts_with('{') {
            let Ok(value) = serde_json::from_str::<Value>(src) else {
                return Ok(None);
            };
            return match json_dialect(&value) {
                Some(dialect) => parse_json(value, dialect, path).map(Some),
                None => Ok(None),
            };
        }

        if trimmed.starts_with('<') && root_name(src).as_deref() == Some("character") {
            return parse_codename(src, path).map(Some);
        }

        Ok(None)
    }

    /// Read and parse a character file from disk.
    pub fn from_file(path: &Path) -> Result<Option<CharacterData>> {
        let data = fs::read(path).map_err(|e| AtlasError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read character file: {}", e),
        })?;
        CharacterData::parse(&data, path)
    }

    /// Whether a path could hold a character file.
    pub fn candidate(path: &Path) -> bool {
        has_extension(path, "json") || has_extension(path, "xml")
    }
}
