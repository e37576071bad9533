//! Plain-text sprite list parser.
//!
//! One sprite per line as `name = x y w h`. No trim or rotation. Lines that
//! don't match are skipped; a file with no matching lines is a content error.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::Result;
use crate::types::SpriteMetadata;

use super::{has_extension, non_empty, normalize_name, text, MetadataFormat, MetadataParser, ParsedSheet};

pub struct TxtParser;

fn line_pattern() -> &'static Regex {
    static LINE: OnceLock<Regex> = OnceLock::new();
    LINE.get_or_init(|| {
        Regex::new(r"^\s*(.+?)\s*=\s*(\d+)\s+(\d+)\s+(\d+)\s+(\d+)\s*$").expect("valid regex")
    })
}

fn parse_line(line: &str) -> Option<SpriteMetadata> {
    let caps = line_pattern().captures(line)?;
    let num = |i: usize| caps[i].parse::<u32>().ok();
    Some(SpriteMetadata::new(&caps[1], num(2)?, num(3)?, num(4)?, num(5)?))
}

impl MetadataParser for TxtParser {
    fn format(&self) -> MetadataFormat {
        MetadataFormat::Txt
    }

    fn detect(&self, path: &Path, _data: &[u8]) -> bool {
        has_extension(path, "txt")
    }

    fn parse(&self, data: &[u8], path: &Path) -> Result<ParsedSheet> {
        let mut sprites = Vec::new();
        for (n, line) in text(data, path)?.lines().enumerate() {
            match parse_line(line) {
                Some(sprite) => sprites.push(sprite),
                None if !line.trim().is_empty() => {
                    log::debug!("{}:{}: skipping unrecognized line", path.display(), n + 1)
                }
                None => {}
            }
        }
        non_empty(ParsedSheet::new(sprites), path)
    }

    fn extract_names(&self, data: &[u8], path: &Path) -> Result<BTreeSet<String>> {
        Ok(text(data, path)?
            .lines()
            .filter_map(|line| line_pattern().captures(line))
            .map(|caps| normalize_name(&caps[1]))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AtlasError;

    #[test]
    fn test_parse_lines() {
        let src = "Walk0000 = 0 0 10 12\nWalk0001 = 10 0 10 12\n";
        let sheet = TxtParser.parse(src.as_bytes(), Path::new("walk.txt")).unwrap();
        assert_eq!(sheet.sprites.len(), 2);
        assert_eq!(sheet.sprites[1], SpriteMetadata::new("Walk0001", 10, 0, 10, 12));
    }

    #[test]
    fn test_names_with_spaces() {
        let src = "BF idle dance0000 = 1 2 3 4";
        let sheet = TxtParser.parse(src.as_bytes(), Path::new("bf.txt")).unwrap();
        assert_eq!(sheet.sprites[0].name, "BF idle dance0000");
    }

    #[test]
    fn test_skips_malformed_lines() {
        let src = "# comment\nbad line\nA0 = 0 0 1 1\nB0 = 1 2 three 4\n";
        let sheet = TxtParser.parse(src.as_bytes(), Path::new("a.txt")).unwrap();
        assert_eq!(sheet.sprites.len(), 1);
        assert_eq!(sheet.sprites[0].name, "A0");
    }

    #[test]
    fn test_comment_only_file_is_content_error() {
        let src = "# nothing here\n\n   \n// still nothing\n";
        let err = TxtParser.parse(src.as_bytes(), Path::new("empty.txt")).unwrap_err();
        assert!(matches!(err, AtlasError::Content { .. }));
    }
}
