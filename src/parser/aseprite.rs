//! Aseprite JSON export parser.
//!
//! Same frame schema as TexturePacker JSON (hash or array), plus a per-frame
//! `duration` in milliseconds and `meta.frameTags` ranges that define
//! animations explicitly instead of by name suffix.

use std::path::Path;

use crate::error::{AtlasError, Result};

use super::json::{frames_kind, load_document, sprite_from};
use super::{non_empty, FrameTag, MetadataFormat, MetadataParser, ParsedSheet, TagDirection};

pub struct AsepriteParser;

fn direction(raw: Option<&str>) -> TagDirection {
    match raw.map(str::to_ascii_lowercase).as_deref() {
        Some("reverse") => TagDirection::Reverse,
        Some("pingpong") | Some("pingpong_reverse") => TagDirection::PingPong,
        _ => TagDirection::Forward,
    }
}

impl MetadataParser for AsepriteParser {
    fn format(&self) -> MetadataFormat {
        MetadataFormat::Aseprite
    }

    fn detect(&self, path: &Path, data: &[u8]) -> bool {
        matches!(
            frames_kind(path, data),
            Some((_, Some(app))) if app.to_ascii_lowercase().contains("aseprite")
        )
    }

    fn parse(&self, data: &[u8], path: &Path) -> Result<ParsedSheet> {
        let doc = load_document(data, path)?;
        let sprites: Vec<_> = doc
            .frames
            .iter()
            .map(|(name, frame)| sprite_from(name, frame))
            .collect();

        let mut tags = Vec::with_capacity(doc.meta.frame_tags.len());
        for tag in &doc.meta.frame_tags {
            if tag.from >= sprites.len() || tag.to >= sprites.len() {
                return Err(AtlasError::format(
                    path,
                    format!(
                        "frame tag '{}' range {}..={} exceeds {} frames",
                        tag.name,
                        tag.from,
                        tag.to,
                        sprites.len()
                    ),
                ));
            }
            tags.push(FrameTag {
                name: tag.name.clone(),
                from: tag.from,
                to: tag.to,
                direction: direction(tag.direction.as_deref()),
            });
        }

        non_empty(
            ParsedSheet {
                sprites,
                tags,
                image: doc.meta.image,
            },
            path,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SHEET: &str = r#"{
        "frames": [
            {"filename": "hero 0.aseprite", "frame": {"x": 0, "y": 0, "w": 16, "h": 16},
             "rotated": false, "trimmed": false,
             "spriteSourceSize": {"x": 0, "y": 0, "w": 16, "h": 16},
             "sourceSize": {"w": 16, "h": 16}, "duration": 100},
            {"filename": "hero 1.aseprite", "frame": {"x": 16, "y": 0, "w": 16, "h": 16},
             "rotated": false, "trimmed": false,
             "spriteSourceSize": {"x": 0, "y": 0, "w": 16, "h": 16},
             "sourceSize": {"w": 16, "h": 16}, "duration": 150},
            {"filename": "hero 2.aseprite", "frame": {"x": 32, "y": 0, "w": 16, "h": 16},
             "rotated": false, "trimmed": false,
             "spriteSourceSize": {"x": 0, "y": 0, "w": 16, "h": 16},
             "sourceSize": {"w": 16, "h": 16}, "duration": 80}
        ],
        "meta": {
            "app": "https://www.aseprite.org/",
            "image": "hero.png",
            "frameTags": [
                {"name": "idle", "from": 0, "to": 1, "direction": "forward"},
                {"name": "hit", "from": 1, "to": 2, "direction": "reverse"}
            ]
        }
    }"#;

    #[test]
    fn test_durations_threaded_through() {
        let sheet = AsepriteParser.parse(SHEET.as_bytes(), Path::new("hero.json")).unwrap();
        let durations: Vec<Option<u32>> = sheet.sprites.iter().map(|s| s.duration_ms).collect();
        assert_eq!(durations, vec![Some(100), Some(150), Some(80)]);
    }

    #[test]
    fn test_frame_tags() {
        let sheet = AsepriteParser.parse(SHEET.as_bytes(), Path::new("hero.json")).unwrap();
        assert_eq!(sheet.tags.len(), 2);
        assert_eq!(sheet.tags[0].indices(), vec![0, 1]);
        assert_eq!(sheet.tags[1].direction, TagDirection::Reverse);
        assert_eq!(sheet.tags[1].indices(), vec![2, 1]);
    }

    #[test]
    fn test_detect_requires_aseprite_app() {
        assert!(AsepriteParser.detect(Path::new("hero.json"), SHEET.as_bytes()));
        let tp = r#"{"frames": [], "meta": {"app": "texturepacker"}}"#;
        assert!(!AsepriteParser.detect(Path::new("a.json"), tp.as_bytes()));
    }

    #[test]
    fn test_tag_out_of_range_is_format_error() {
        let src = r#"{"frames": [{"filename": "a", "frame": {"x":0,"y":0,"w":1,"h":1}}],
                      "meta": {"app": "aseprite", "frameTags": [{"name": "x", "from": 0, "to": 4}]}}"#;
        let err = AsepriteParser.parse(src.as_bytes(), Path::new("a.json")).unwrap_err();
        assert!(matches!(err, AtlasError::Format { .. }));
    }
}
