//! Sprite-sheet metadata parsers.
//!
//! Each supported dialect implements [`MetadataParser`], converting raw file
//! bytes into a list of [`SpriteMetadata`] records. A [`ParserRegistry`] sniffs
//! the content of a metadata file and dispatches to the first parser that
//! claims it; extensions alone are not enough because JSON and plist
//! sub-dialects share them.
//!
//! Engine character files (Psych Engine, V-Slice, Codename Engine) are not
//! geometry sources; they live in [`character`] and feed the settings store.
//!
//! # Usage
//!
//! ```ignore
//! use unatlas::parser::ParserRegistry;
//!
//! let registry = ParserRegistry::new();
//! let (format, sheet) = registry.parse_file(Path::new("player.xml"))?;
//! println!("{} sprites ({})", sheet.sprites.len(), format);
//! ```

mod aseprite;
mod css;
mod format;
mod json;
mod spine;
mod starling;
mod texturepacker_xml;
mod txt;
mod uikit;
mod xml;
pub mod character;

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{AtlasError, Result};
use crate::types::SpriteMetadata;

pub use aseprite::AsepriteParser;
pub use css::CssParser;
pub use format::{MetadataFormat, METADATA_EXTENSIONS};
pub use json::{JsonArrayParser, JsonHashParser};
pub use spine::SpineParser;
pub use starling::StarlingXmlParser;
pub use texturepacker_xml::TexturePackerXmlParser;
pub use txt::TxtParser;
pub use uikit::PlistParser;

/// Direction of an Aseprite frame tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagDirection {
    #[default]
    Forward,
    Reverse,
    PingPong,
}

/// An explicit animation range over the sheet's frame list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameTag {
    pub name: String,
    pub from: usize,
    pub to: usize,
    pub direction: TagDirection,
}

impl FrameTag {
    /// Frame indices in playback order.
    pub fn indices(&self) -> Vec<usize> {
        let (lo, hi) = (self.from.min(self.to), self.from.max(self.to));
        let forward: Vec<usize> = (lo..=hi).collect();
        match self.direction {
            TagDirection::Forward => forward,
            TagDirection::Reverse => forward.into_iter().rev().collect(),
            TagDirection::PingPong => {
                let mut seq = forward.clone();
                if forward.len() > 2 {
                    seq.extend(forward[1..forward.len() - 1].iter().rev());
                }
                seq
            }
        }
    }
}

/// Everything a geometry parser extracts from one metadata file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSheet {
    /// Sprites in file order.
    pub sprites: Vec<SpriteMetadata>,
    /// Explicit animation ranges (Aseprite).
    pub tags: Vec<FrameTag>,
    /// Atlas image name recorded in the metadata, if any.
    pub image: Option<String>,
}

impl ParsedSheet {
    pub fn new(sprites: Vec<SpriteMetadata>) -> Self {
        Self {
            sprites,
            ..Default::default()
        }
    }

    /// Animation names this sheet will produce.
    pub fn animation_names(&self) -> BTreeSet<String> {
        let mut names: BTreeSet<String> = self.tags.iter().map(|t| t.name.clone()).collect();
        let tagged: BTreeSet<usize> = self.tags.iter().flat_map(|t| t.indices()).collect();
        for (i, sprite) in self.sprites.iter().enumerate() {
            if !tagged.contains(&i) {
                names.insert(normalize_name(&sprite.name));
            }
        }
        names
    }
}

/// A parser for one metadata dialect.
pub trait MetadataParser: Send + Sync {
    /// The dialect this parser reads.
    fn format(&self) -> MetadataFormat;

    /// Whether `data` looks like this dialect.
    fn detect(&self, path: &Path, data: &[u8]) -> bool;

    /// Parse the full sprite list.
    fn parse(&self, data: &[u8], path: &Path) -> Result<ParsedSheet>;

    /// Animation names only, for listing without building geometry.
    fn extract_names(&self, data: &[u8], path: &Path) -> Result<BTreeSet<String>> {
        Ok(self.parse(data, path)?.animation_names())
    }
}

/// Strip 1–4 trailing digits and an optional `.png` suffix, then trailing
/// whitespace. This is the animation grouping key everywhere.
///
/// ```
/// use unatlas::parser::normalize_name;
/// assert_eq!(normalize_name("Idle0007.png"), "Idle");
/// assert_eq!(normalize_name("Attack"), "Attack");
/// ```
pub fn normalize_name(name: &str) -> String {
    static SUFFIX: OnceLock<Regex> = OnceLock::new();
    let re = SUFFIX.get_or_init(|| Regex::new(r"\d{1,4}(?:\.png)?$").expect("valid regex"));
    let stripped = re.replace(name, "");
    let trimmed = stripped.trim_end();
    if trimmed.is_empty() {
        name.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Decode metadata bytes as UTF-8, dropping a byte-order mark.
pub(crate) fn text<'a>(data: &'a [u8], path: &Path) -> Result<&'a str> {
    let s = std::str::from_utf8(data)
        .map_err(|e| AtlasError::format(path, format!("file is not valid UTF-8: {}", e)))?;
    Ok(s.strip_prefix('\u{feff}').unwrap_or(s))
}

/// Case-insensitive extension check.
pub(crate) fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

/// Fail with a content error when a parser produced nothing.
pub(crate) fn non_empty(sheet: ParsedSheet, path: &Path) -> Result<ParsedSheet> {
    if sheet.sprites.is_empty() {
        Err(AtlasError::empty(path))
    } else {
        Ok(sheet)
    }
}

/// Content-sniffing dispatcher over every geometry dialect.
pub struct ParserRegistry {
    parsers: Vec<Box<dyn MetadataParser>>,
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserRegistry {
    /// Registry with every built-in dialect in sniffing priority order.
    pub fn new() -> Self {
        let parsers: Vec<Box<dyn MetadataParser>> = vec![
            Box::new(AsepriteParser),
            Box::new(JsonHashParser),
            Box::new(JsonArrayParser),
            Box::new(StarlingXmlParser),
            Box::new(TexturePackerXmlParser),
            Box::new(PlistParser),
            Box::new(SpineParser),
            Box::new(CssParser),
            Box::new(TxtParser),
        ];
        Self { parsers }
    }

    /// Empty registry, for callers registering their own dialects.
    pub fn empty() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// Append a parser; earlier parsers win ties.
    pub fn register(&mut self, parser: Box<dyn MetadataParser>) {
        self.parsers.push(parser);
    }

    pub fn get(&self, format: MetadataFormat) -> Option<&dyn MetadataParser> {
        self.parsers
            .iter()
            .find(|p| p.format() == format)
            .map(|p| p.as_ref())
    }

    /// First parser that claims the data.
    pub fn detect(&self, path: &Path, data: &[u8]) -> Option<&dyn MetadataParser> {
        self.parsers
            .iter()
            .find(|p| p.detect(path, data))
            .map(|p| p.as_ref())
    }

    fn require(&self, path: &Path, data: &[u8]) -> Result<&dyn MetadataParser> {
        self.detect(path, data).ok_or_else(|| AtlasError::Format {
            path: path.to_path_buf(),
            message: "unrecognized sprite-sheet metadata format".to_string(),
            help: Some(format!(
                "Supported extensions: {}",
                METADATA_EXTENSIONS.join(", ")
            )),
        })
    }

    /// Sniff and parse in-memory metadata.
    pub fn parse(&self, path: &Path, data: &[u8]) -> Result<(MetadataFormat, ParsedSheet)> {
        let parser = self.require(path, data)?;
        log::debug!("{}: detected {}", path.display(), parser.format());
        let sheet = parser.parse(data, path)?;
        Ok((parser.format(), sheet))
    }

    /// Read, sniff and parse a metadata file.
    pub fn parse_file(&self, path: &Path) -> Result<(MetadataFormat, ParsedSheet)> {
        let data = read(path)?;
        self.parse(path, &data)
    }

    /// Animation names of a metadata file via the lightweight path.
    pub fn extract_names_file(&self, path: &Path) -> Result<BTreeSet<String>> {
        let data = read(path)?;
        self.require(path, &data)?.extract_names(&data, path)
    }
}

/// Read a metadata file, mapping failures to a file error.
pub(crate) fn read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| AtlasError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to read metadata: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_name_strips_digits_and_png() {
        assert_eq!(normalize_name("Idle0007.png"), "Idle");
        assert_eq!(normalize_name("Walk0001"), "Walk");
        assert_eq!(normalize_name("BF idle dance0012"), "BF idle dance");
    }

    #[test]
    fn test_normalize_name_unchanged_without_digits() {
        assert_eq!(normalize_name("Attack"), "Attack");
    }

    #[test]
    fn test_normalize_name_only_four_digits() {
        assert_eq!(normalize_name("Run12345"), "Run1");
    }

    #[test]
    fn test_normalize_name_all_digits_falls_back() {
        assert_eq!(normalize_name("0001"), "0001");
    }

    #[test]
    fn test_tag_indices() {
        let tag = |direction| FrameTag {
            name: "t".to_string(),
            from: 2,
            to: 5,
            direction,
        };
        assert_eq!(tag(TagDirection::Forward).indices(), vec![2, 3, 4, 5]);
        assert_eq!(tag(TagDirection::Reverse).indices(), vec![5, 4, 3, 2]);
        assert_eq!(tag(TagDirection::PingPong).indices(), vec![2, 3, 4, 5, 4, 3]);
    }

    #[test]
    fn test_registry_detects_each_dialect() {
        let registry = ParserRegistry::new();
        let cases: &[(&str, &str, MetadataFormat)] = &[
            (
                "a.xml",
                r#"<TextureAtlas><SubTexture name="a0" x="0" y="0" width="1" height="1"/></TextureAtlas>"#,
                MetadataFormat::StarlingXml,
            ),
            (
                "a.xml",
                r#"<TextureAtlas><sprite n="a0" x="0" y="0" w="1" h="1"/></TextureAtlas>"#,
                MetadataFormat::TexturePackerXml,
            ),
            (
                "a.json",
                r#"{"frames":{"a0":{"frame":{"x":0,"y":0,"w":1,"h":1}}}}"#,
                MetadataFormat::JsonHash,
            ),
            (
                "a.json",
                r#"{"frames":[{"filename":"a0","frame":{"x":0,"y":0,"w":1,"h":1}}]}"#,
                MetadataFormat::JsonArray,
            ),
            (
                "a.json",
                r#"{"frames":[{"filename":"a0","frame":{"x":0,"y":0,"w":1,"h":1},"duration":100}],"meta":{"app":"http://www.aseprite.org/"}}"#,
                MetadataFormat::Aseprite,
            ),
            ("a.txt", "a0 = 0 0 1 1\n", MetadataFormat::Txt),
            (
                "a.css",
                ".a0 { background-position: -0px -0px; width: 1px; height: 1px; }",
                MetadataFormat::Css,
            ),
            (
                "a.atlas",
                "a.png\nsize: 1,1\nformat: RGBA8888\nfilter: Linear,Linear\nrepeat: none\na0\n  rotate: false\n  xy: 0, 0\n  size: 1, 1\n  orig: 1, 1\n",
                MetadataFormat::Spine,
            ),
        ];

        for (name, src, expected) in cases {
            let parser = registry
                .detect(Path::new(name), src.as_bytes())
                .unwrap_or_else(|| panic!("no parser for {}", name));
            assert_eq!(parser.format(), *expected, "{}", src);
        }
    }

    #[test]
    fn test_registry_rejects_unknown() {
        let registry = ParserRegistry::new();
        let err = registry
            .parse(Path::new("notes.md"), b"# hello")
            .unwrap_err();
        assert!(matches!(err, AtlasError::Format { .. }));
    }

    #[test]
    fn test_parse_file_missing_is_file_error() {
        let registry = ParserRegistry::new();
        let err = registry
            .parse_file(Path::new("/nonexistent/atlas.xml"))
            .unwrap_err();
        assert!(matches!(err, AtlasError::Io { .. }));
    }

    #[test]
    fn test_animation_names_mix_tags_and_names() {
        let sheet = ParsedSheet {
            sprites: vec![
                SpriteMetadata::new("x 0", 0, 0, 1, 1),
                SpriteMetadata::new("x 1", 0, 0, 1, 1),
                SpriteMetadata::new("Jump0000", 0, 0, 1, 1),
            ],
            tags: vec![FrameTag {
                name: "Idle".to_string(),
                from: 0,
                to: 1,
                direction: TagDirection::Forward,
            }],
            image: None,
        };
        let names: Vec<String> = sheet.animation_names().into_iter().collect();
        assert_eq!(names, vec!["Idle".to_string(), "Jump".to_string()]);
    }
}
