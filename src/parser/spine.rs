//! Spine / libGDX `.atlas` parser.
//!
//! ```text
//! hero.png
//! size: 256,256
//! format: RGBA8888
//! filter: Linear,Linear
//! repeat: none
//! Walk0000
//!   rotate: false
//!   xy: 2, 2
//!   size: 30, 40
//!   orig: 32, 44
//!   offset: 1, 3
//!   index: -1
//! ```
//!
//! A page starts with an image name at the top of the file or after a blank
//! line. Only the first page is extracted. Spine 4 `bounds`/`offsets` keys are
//! read as well. Records missing their position or size are dropped.
//!
//! `size` is the unrotated size and `offset` is measured from the bottom-left
//! corner of the original image.

use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;
use crate::types::SpriteMetadata;

use super::{has_extension, non_empty, text, MetadataFormat, MetadataParser, ParsedSheet};

pub struct SpineParser;

fn ints(value: &str) -> Option<Vec<i64>> {
    value
        .split(',')
        .map(|v| v.trim().parse::<f64>().ok().map(|f| f.round() as i64))
        .collect()
}

fn pair(props: &HashMap<String, String>, key: &str) -> Option<(i64, i64)> {
    match ints(props.get(key)?)?.as_slice() {
        [a, b] => Some((*a, *b)),
        _ => None,
    }
}

fn quad(props: &HashMap<String, String>, key: &str) -> Option<(i64, i64, i64, i64)> {
    match ints(props.get(key)?)?.as_slice() {
        [a, b, c, d] => Some((*a, *b, *c, *d)),
        _ => None,
    }
}

fn to_u32(v: i64) -> u32 {
    v.clamp(0, u32::MAX as i64) as u32
}

/// Build a sprite from one record, or `None` if it lacks geometry.
fn sprite_from(name: &str, props: &HashMap<String, String>) -> Option<SpriteMetadata> {
    let (x, y, w, h) = quad(props, "bounds").or_else(|| {
        let (x, y) = pair(props, "xy")?;
        let (w, h) = pair(props, "size")?;
        Some((x, y, w, h))
    })?;

    let rotated = props
        .get("rotate")
        .map(|r| match r.trim() {
            "true" => true,
            "false" => false,
            degrees => degrees.parse::<i32>().map(|d| d.rem_euclid(180) == 90).unwrap_or(false),
        })
        .unwrap_or(false);

    let (ox, oy, ow, oh) = quad(props, "offsets").unwrap_or_else(|| {
        let (ox, oy) = pair(props, "offset").unwrap_or((0, 0));
        let (ow, oh) = pair(props, "orig").unwrap_or((w, h));
        (ox, oy, ow, oh)
    });

    let (atlas_w, atlas_h) = if rotated { (h, w) } else { (w, h) };
    let trim_y = oh - h - oy;

    Some(
        SpriteMetadata::new(name, to_u32(x), to_u32(y), to_u32(atlas_w), to_u32(atlas_h))
            .with_rotated(rotated)
            .with_frame(-(ox as i32), -(trim_y as i32), to_u32(ow), to_u32(oh)),
    )
}

/// Parsed `.atlas` text: first page image and its records.
fn read_first_page(src: &str, path: &Path) -> (Option<String>, Vec<SpriteMetadata>) {
    let mut image = None;
    let mut sprites = Vec::new();
    let mut pages = 0;
    let mut record: Option<(String, HashMap<String, String>)> = None;
    let mut after_blank = true;

    let mut flush = |record: &mut Option<(String, HashMap<String, String>)>| {
        if let Some((name, props)) = record.take() {
            match sprite_from(&name, &props) {
                Some(sprite) => sprites.push(sprite),
                None => log::debug!("{}: dropping incomplete region '{}'", path.display(), name),
            }
        }
    };

    for line in src.lines() {
        if line.trim().is_empty() {
            flush(&mut record);
            after_blank = true;
            continue;
        }

        let indented = line.starts_with(|c: char| c.is_whitespace());
        if indented || line.contains(':') {
            if let (Some((_, props)), Some((key, value))) = (record.as_mut(), line.split_once(':')) {
                props.insert(key.trim().to_string(), value.trim().to_string());
            }
        } else {
            flush(&mut record);
            if after_blank {
                pages += 1;
                if pages > 1 {
                    break;
                }
                image = Some(line.trim().to_string());
            } else {
                record = Some((line.trim().to_string(), HashMap::new()));
            }
        }
        after_blank = false;
    }
    flush(&mut record);

    (image, sprites)
}

impl MetadataParser for SpineParser {
    fn format(&self) -> MetadataFormat {
        MetadataFormat::Spine
    }

    fn detect(&self, path: &Path, data: &[u8]) -> bool {
        if has_extension(path, "atlas") {
            return true;
        }
        let Ok(src) = text(data, path) else {
            return false;
        };
        let keys: Vec<&str> = src.lines().take(8).map(str::trim).collect();
        keys.iter().any(|l| l.starts_with("filter:")) && keys.iter().any(|l| l.starts_with("size:"))
    }

    fn parse(&self, data: &[u8], path: &Path) -> Result<ParsedSheet> {
        let (image, sprites) = read_first_page(text(data, path)?, path);
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
    use crate::error::AtlasError;
    use pretty_assertions::assert_eq;

    const ATLAS: &str = "\nhero.png\nsize: 64,64\nformat: RGBA8888\nfilter: Linear,Linear\nrepeat: none\n\
Walk0000\n  rotate: false\n  xy: 2, 2\n  size: 30, 40\n  orig: 32, 44\n  offset: 1, 3\n  index: -1\n\
Walk0001\n  rotate: true\n  xy: 34, 2\n  size: 10, 20\n  orig: 10, 20\n  offset: 0, 0\n  index: -1\n";

    fn parse(src: &str) -> Result<ParsedSheet> {
        SpineParser.parse(src.as_bytes(), Path::new("hero.atlas"))
    }

    #[test]
    fn test_parse_page() {
        let sheet = parse(ATLAS).unwrap();
        assert_eq!(sheet.image.as_deref(), Some("hero.png"));
        assert_eq!(sheet.sprites.len(), 2);

        let s = &sheet.sprites[0];
        assert_eq!((s.x, s.y, s.width, s.height), (2, 2, 30, 40));
        // Bottom-left offset (1, 3) with 44 - 40 - 3 = 1 from the top.
        assert_eq!((s.frame_x, s.frame_y), (-1, -1));
        assert_eq!((s.frame_width, s.frame_height), (32, 44));
    }

    #[test]
    fn test_rotated_region_swaps() {
        let sheet = parse(ATLAS).unwrap();
        let s = &sheet.sprites[1];
        assert!(s.rotated);
        assert_eq!((s.width, s.height), (20, 10));
        assert_eq!(s.upright_size(), (10, 20));
    }

    #[test]
    fn test_incomplete_trailing_record_dropped() {
        let src = format!("{}Walk0002\n  rotate: false\n  xy: 1, 1\n", ATLAS);
        let sheet = parse(&src).unwrap();
        assert_eq!(sheet.sprites.len(), 2);
    }

    #[test]
    fn test_only_first_page() {
        let src = format!(
            "{}\nhero2.png\nsize: 64,64\nformat: RGBA8888\nfilter: Linear,Linear\nrepeat: none\nJump0000\n  rotate: false\n  xy: 0, 0\n  size: 4, 4\n  orig: 4, 4\n  offset: 0, 0\n",
            ATLAS
        );
        let sheet = parse(&src).unwrap();
        let names: Vec<&str> = sheet.sprites.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Walk0000", "Walk0001"]);
    }

    #[test]
    fn test_spine4_bounds() {
        let src = "hero.png\n\tsize: 64, 64\n\tfilter: Linear, Linear\nIdle\n\tbounds: 4, 5, 6, 7\n\toffsets: 1, 2, 8, 10\n\trotate: 90\n";
        let sheet = parse(src).unwrap();
        let s = &sheet.sprites[0];
        assert!(s.rotated);
        assert_eq!((s.x, s.y, s.width, s.height), (4, 5, 7, 6));
        assert_eq!((s.frame_x, s.frame_y), (-1, -1));
        assert_eq!((s.frame_width, s.frame_height), (8, 10));
    }

    #[test]
    fn test_header_only_is_content_error() {
        let err = parse("hero.png\nsize: 1,1\nformat: RGBA8888\n").unwrap_err();
        assert!(matches!(err, AtlasError::Content { .. }));
    }
}
