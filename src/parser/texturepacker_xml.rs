//! Generic TexturePacker XML parser.
//!
//! ```xml
//! <TextureAtlas imagePath="sheet.png" width="256" height="256">
//!     <sprite n="Walk0000" x="2" y="2" w="30" h="40" oX="1" oY="3" oW="32" oH="44" r="y" pX="0.5" pY="0.5"/>
//! </TextureAtlas>
//! ```
//!
//! `oX/oY` is the position of the trimmed region inside the original sprite,
//! so the frame offset is its negation. Pivots are carried through untouched.

use std::path::Path;

use crate::error::{AtlasError, Result};
use crate::types::SpriteMetadata;

use super::xml::{read_elements, XmlElement};
use super::{has_extension, non_empty, text, MetadataFormat, MetadataParser, ParsedSheet};

pub struct TexturePackerXmlParser;

fn sprite_from(el: &XmlElement, path: &Path) -> Result<SpriteMetadata> {
    let name = el
        .get("n")
        .ok_or_else(|| AtlasError::format(path, "sprite is missing its 'n' attribute"))?;

    let sprite = SpriteMetadata::new(
        name,
        el.require_u32("x", path)?,
        el.require_u32("y", path)?,
        el.require_u32("w", path)?,
        el.require_u32("h", path)?,
    )
    .with_rotated(el.flag("r"));

    let (upright_w, upright_h) = sprite.upright_size();
    let mut sprite = sprite.with_frame(
        -el.opt_i32("oX", path)?.unwrap_or(0),
        -el.opt_i32("oY", path)?.unwrap_or(0),
        el.opt_u32("oW", path)?.unwrap_or(upright_w),
        el.opt_u32("oH", path)?.unwrap_or(upright_h),
    );

    if let (Some(px), Some(py)) = (el.number("pX", path)?, el.number("pY", path)?) {
        sprite.pivot = Some((px as f32, py as f32));
    }

    Ok(sprite)
}

impl MetadataParser for TexturePackerXmlParser {
    fn format(&self) -> MetadataFormat {
        MetadataFormat::TexturePackerXml
    }

    fn detect(&self, path: &Path, data: &[u8]) -> bool {
        let Ok(src) = text(data, path) else {
            return false;
        };
        (has_extension(path, "xml") || src.trim_start().starts_with('<'))
            && src.contains("<sprite")
            && src.contains(" n=")
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
            .filter(|e| e.name == "sprite")
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
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Result<ParsedSheet> {
        TexturePackerXmlParser.parse(src.as_bytes(), Path::new("sheet.xml"))
    }

    #[test]
    fn test_parse_shorthand_attributes() {
        let sheet = parse(
            r#"<TextureAtlas imagePath="sheet.png">
                <sprite n="Walk0000" x="2" y="3" w="30" h="40" oX="1" oY="4" oW="32" oH="44" pX="0.5" pY="1"/>
            </TextureAtlas>"#,
        )
        .unwrap();

        let s = &sheet.sprites[0];
        assert_eq!(s.name, "Walk0000");
        assert_eq!((s.x, s.y, s.width, s.height), (2, 3, 30, 40));
        assert_eq!((s.frame_x, s.frame_y), (-1, -4));
        assert_eq!((s.frame_width, s.frame_height), (32, 44));
        assert_eq!(s.pivot, Some((0.5, 1.0)));
        assert_eq!(sheet.image.as_deref(), Some("sheet.png"));
    }

    #[test]
    fn test_parse_rotated_flag() {
        let sheet = parse(r#"<TextureAtlas><sprite n="a" x="0" y="0" w="2" h="5" r="y"/></TextureAtlas>"#)
            .unwrap();
        assert!(sheet.sprites[0].rotated);
        assert_eq!(sheet.sprites[0].frame_width, 5);
    }

    #[test]
    fn test_missing_width_is_format_error() {
        let err = parse(r#"<TextureAtlas><sprite n="a" x="0" y="0" h="5"/></TextureAtlas>"#).unwrap_err();
        assert!(matches!(err, AtlasError::Format { .. }));
    }
}
