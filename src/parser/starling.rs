//! Starling / Sparrow XML parser.
//!
//! ```xml
//! <TextureAtlas imagePath="player.png">
//!     <SubTexture name="Walk0000" x="0" y="0" width="32" height="40"
//!                 frameX="-2" frameY="-1" frameWidth="36" frameHeight="42"
//!                 rotated="true"/>
//! </TextureAtlas>
//! ```
//!
//! `width`/`height` describe the region as stored in the atlas; for rotated
//! regions the logical frame defaults to the swapped size.

use std::collections::BTreeSet;
use std::path::Path;

use crate::error::{AtlasError, Result};
use crate::types::SpriteMetadata;

use super::xml::{read_elements, XmlElement};
use super::{has_extension, non_empty, normalize_name, text, MetadataFormat, MetadataParser, ParsedSheet};

pub struct StarlingXmlParser;

fn sprite_from(el: &XmlElement, path: &Path) -> Result<SpriteMetadata> {
    let name = el.get("name").ok_or_else(|| {
        AtlasError::format(path, "SubTexture is missing its 'name' attribute")
    })?;

    let mut sprite = SpriteMetadata::new(
        name,
        el.require_u32("x", path)?,
        el.require_u32("y", path)?,
        el.require_u32("width", path)?,
        el.require_u32("height", path)?,
    )
    .with_rotated(el.flag("rotated"));

    let (upright_w, upright_h) = sprite.upright_size();
    sprite = sprite.with_frame(
        el.opt_i32("frameX", path)?.unwrap_or(0),
        el.opt_i32("frameY", path)?.unwrap_or(0),
        el.opt_u32("frameWidth", path)?.unwrap_or(upright_w),
        el.opt_u32("frameHeight", path)?.unwrap_or(upright_h),
    );

    if let (Some(px), Some(py)) = (el.number("pivotX", path)?, el.number("pivotY", path)?) {
        sprite.pivot = Some((px as f32, py as f32));
    }

    Ok(sprite)
}

impl MetadataParser for StarlingXmlParser {
    fn format(&self) -> MetadataFormat {
        MetadataFormat::StarlingXml
    }

    fn detect(&self, path: &Path, data: &[u8]) -> bool {
        let Ok(src) = text(data, path) else {
            return false;
        };
        (has_extension(path, "xml") || src.trim_start().starts_with('<'))
            && src.contains("<SubTexture")
    }

    fn parse(&self, data: &[u8], path: &Path) -> Result<ParsedSheet> {
        let elements = read_elements(text(data, path)?, path)?;

        let image = elements
            .iter()
            .find(|e| e.name == "TextureAtlas")
            .and_then(|e| e.get("imagePath"))
            .map(str::to_string);

        let sprites = elements
            .iter()
            .filter(|e| e.name == "SubTexture")
            .map(|e| sprite_from(e, path))
            .collect::<Result<Vec<_>>>()?;

        non_empty(
            ParsedSheet {
                sprites,
                image,
                ..Default::default()
            },
            path,
        )
    }

    fn extract_names(&self, data: &[u8], path: &Path) -> Result<BTreeSet<String>> {
        let elements = read_elements(text(data, path)?, path)?;
        Ok(elements
            .iter()
            .filter(|e| e.name == "SubTexture")
            .filter_map(|e| e.get("name"))
            .map(normalize_name)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(src: &str) -> Result<ParsedSheet> {
        StarlingXmlParser.parse(src.as_bytes(), Path::new("sheet.xml"))
    }

    #[test]
    fn test_parse_untrimmed() {
        let sheet = parse(
            r#"<TextureAtlas imagePath="walk.png">
                <SubTexture name="Walk0" x="0" y="0" width="10" height="10"/>
                <SubTexture name="Walk1" x="10" y="0" width="10" height="10"/>
            </TextureAtlas>"#,
        )
        .unwrap();

        assert_eq!(sheet.image.as_deref(), Some("walk.png"));
        assert_eq!(sheet.sprites.len(), 2);
        assert_eq!(sheet.sprites[1], SpriteMetadata::new("Walk1", 10, 0, 10, 10));
    }

    #[test]
    fn test_parse_trimmed_frame() {
        let sheet = parse(
            r#"<TextureAtlas>
                <SubTexture name="Idle0000" x="4" y="6" width="8" height="9"
                    frameX="-3" frameY="-1" frameWidth="14" frameHeight="12"/>
            </TextureAtlas>"#,
        )
        .unwrap();

        let s = &sheet.sprites[0];
        assert_eq!((s.frame_x, s.frame_y), (-3, -1));
        assert_eq!((s.frame_width, s.frame_height), (14, 12));
    }

    #[test]
    fn test_parse_rotated_defaults_frame_to_upright_size() {
        let sheet = parse(
            r#"<TextureAtlas><SubTexture name="R" x="0" y="0" width="4" height="9" rotated="true"/></TextureAtlas>"#,
        )
        .unwrap();

        let s = &sheet.sprites[0];
        assert!(s.rotated);
        assert_eq!((s.frame_width, s.frame_height), (9, 4));
    }

    #[test]
    fn test_missing_coordinate_is_format_error() {
        let err = parse(r#"<TextureAtlas><SubTexture name="A" x="0" width="1" height="1"/></TextureAtlas>"#)
            .unwrap_err();
        assert!(matches!(err, AtlasError::Format { .. }));
        assert!(err.to_string().contains("'A'"));
    }

    #[test]
    fn test_no_subtextures_is_content_error() {
        let err = parse(r#"<TextureAtlas imagePath="x.png"></TextureAtlas>"#).unwrap_err();
        assert!(matches!(err, AtlasError::Content { .. }));
    }

    #[test]
    fn test_malformed_xml_is_format_error() {
        let err = parse(r#"<TextureAtlas><SubTexture name="A" x="0" y="0" width="1" height="1"/></Atlas>"#).unwrap_err();
        assert!(matches!(err, AtlasError::Format { .. }));
    }

    #[test]
    fn test_extract_names() {
        let src = r#"<TextureAtlas>
            <SubTexture name="Walk0000" x="0" y="0" width="1" height="1"/>
            <SubTexture name="Walk0001" x="0" y="0" width="1" height="1"/>
            <SubTexture name="Idle0000" x="0" y="0" width="1" height="1"/>
        </TextureAtlas>"#;
        let names = StarlingXmlParser
            .extract_names(src.as_bytes(), Path::new("a.xml"))
            .unwrap();
        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["Idle", "Walk"]);
    }
}
