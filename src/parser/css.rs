//! CSS sprite-sheet parser.
//!
//! Reads `.name { ... }` rule blocks. Legacy sheets give only
//! `background-position`, `width` and `height`:
//!
//! ```css
//! .Walk0000 { background-position: -2px -2px; width: 30px; height: 40px; }
//! ```
//!
//! Extended sheets may use the `background` shorthand, record trim through
//! `margin-left`/`margin-top`, and mark rotated regions with
//! `transform: rotate(-90deg)`. Blocks without a position and size (shared
//! base classes) are skipped.

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{AtlasError, Result};
use crate::types::SpriteMetadata;

use super::{has_extension, non_empty, text, MetadataFormat, MetadataParser, ParsedSheet};

pub struct CssParser;

struct Patterns {
    block: Regex,
    position: Regex,
    url: Regex,
    rotate: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        block: Regex::new(r"\.((?:\\.|[^\s{,])+)\s*\{([^}]*)\}").expect("valid regex"),
        position: Regex::new(r"(-?\d+(?:\.\d+)?)(?:px)?\s+(-?\d+(?:\.\d+)?)(?:px)?")
            .expect("valid regex"),
        url: Regex::new(r#"url\(\s*['"]?([^'")]+)['"]?\s*\)"#).expect("valid regex"),
        rotate: Regex::new(r"rotate\(\s*-90deg\s*\)").expect("valid regex"),
    })
}

fn declarations(body: &str) -> HashMap<String, String> {
    body.split(';')
        .filter_map(|decl| decl.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect()
}

fn length(value: &str, name: &str, key: &str, path: &Path) -> Result<f64> {
    let raw = value.trim().trim_end_matches("px").trim();
    raw.parse::<f64>().map_err(|_| {
        AtlasError::format(path, format!(".{}: invalid {} '{}'", name, key, value))
    })
}

fn unescape(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn sprite_from(name: &str, decls: &HashMap<String, String>, path: &Path) -> Result<Option<SpriteMetadata>> {
    let p = patterns();
    let position = decls.get("background-position").cloned().or_else(|| {
        decls
            .get("background")
            .map(|bg| p.url.replace_all(bg, "").into_owned())
    });

    let (Some(position), Some(width), Some(height)) = (position, decls.get("width"), decls.get("height"))
    else {
        return Ok(None);
    };

    let caps = p.position.captures(&position).ok_or_else(|| {
        AtlasError::format(path, format!(".{}: malformed background position '{}'", name, position))
    })?;
    let bx: f64 = caps[1].parse().unwrap_or(0.0);
    let by: f64 = caps[2].parse().unwrap_or(0.0);

    let w = length(width, name, "width", path)?.round().max(0.0) as u32;
    let h = length(height, name, "height", path)?.round().max(0.0) as u32;

    let margin = |key: &str| -> Result<i32> {
        decls
            .get(key)
            .map(|v| length(v, name, key, path).map(|m| m.round() as i32))
            .transpose()
            .map(|m| m.unwrap_or(0))
    };
    let (ml, mt) = (margin("margin-left")?, margin("margin-top")?);

    let rotated = decls
        .get("transform")
        .map(|t| p.rotate.is_match(t))
        .unwrap_or(false);

    let sprite = SpriteMetadata::new(
        unescape(name),
        (-bx).round().max(0.0) as u32,
        (-by).round().max(0.0) as u32,
        w,
        h,
    )
    .with_rotated(rotated);
    let (uw, uh) = sprite.upright_size();
    let frame_w = (uw as i64 + ml.max(0) as i64) as u32;
    let frame_h = (uh as i64 + mt.max(0) as i64) as u32;
    Ok(Some(sprite.with_frame(-ml, -mt, frame_w, frame_h)))
}

impl MetadataParser for CssParser {
    fn format(&self) -> MetadataFormat {
        MetadataFormat::Css
    }

    fn detect(&self, path: &Path, data: &[u8]) -> bool {
        has_extension(path, "css")
            || text(data, path)
                .map(|s| s.trim_start().starts_with('.') && s.contains("background"))
                .unwrap_or(false)
    }

    fn parse(&self, data: &[u8], path: &Path) -> Result<ParsedSheet> {
        let src = text(data, path)?;
        let p = patterns();

        let mut sprites = Vec::new();
        let mut image = None;
        for caps in p.block.captures_iter(src) {
            let decls = declarations(&caps[2]);
            if image.is_none() {
                image = decls
                    .get("background-image")
                    .or_else(|| decls.get("background"))
                    .and_then(|v| p.url.captures(v))
                    .map(|c| c[1].trim().to_string());
            }
            match sprite_from(&caps[1], &decls, path)? {
                Some(sprite) => sprites.push(sprite),
                None => log::debug!("{}: skipping rule .{}", path.display(), &caps[1]),
            }
        }

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

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(src: &str) -> Result<ParsedSheet> {
        CssParser.parse(src.as_bytes(), Path::new("sheet.css"))
    }

    #[test]
    fn test_legacy_blocks() {
        let sheet = parse(
            ".Walk0000 { background-position: -2px -4px; width: 30px; height: 40px; }\n\
             .Walk0001 { background-position: -32px -4px; width: 30px; height: 40px; }",
        )
        .unwrap();
        assert_eq!(sheet.sprites.len(), 2);
        assert_eq!(sheet.sprites[0], SpriteMetadata::new("Walk0000", 2, 4, 30, 40));
        assert_eq!(sheet.sprites[1].x, 32);
    }

    #[test]
    fn test_extended_trim_and_rotation() {
        let sheet = parse(
            ".sprite { display: inline-block; background-image: url('atlas.png'); }\n\
             .Idle0000 { background: url(atlas.png) no-repeat -10px -20px; width: 8px; height: 6px;\n\
                         margin-left: 2px; margin-top: 1px; transform: rotate(-90deg); }",
        )
        .unwrap();

        assert_eq!(sheet.image.as_deref(), Some("atlas.png"));
        assert_eq!(sheet.sprites.len(), 1);
        let s = &sheet.sprites[0];
        assert_eq!((s.x, s.y, s.width, s.height), (10, 20, 8, 6));
        assert!(s.rotated);
        assert_eq!((s.frame_x, s.frame_y), (-2, -1));
        assert_eq!((s.frame_width, s.frame_height), (8, 9));
    }

    #[test]
    fn test_escaped_class_name() {
        let sheet = parse(r".Idle\ 0000 { background-position: 0 0; width: 1px; height: 1px; }").unwrap();
        assert_eq!(sheet.sprites[0].name, "Idle 0000");
    }

    #[test]
    fn test_bad_width_is_format_error() {
        let err = parse(".a { background-position: 0 0; width: wide; height: 1px; }").unwrap_err();
        assert!(matches!(err, AtlasError::Format { .. }));
    }

    #[test]
    fn test_no_sprite_blocks_is_content_error() {
        let err = parse(".base { display: block; }").unwrap_err();
        assert!(matches!(err, AtlasError::Content { .. }));
    }
}
