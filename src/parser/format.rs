//! Metadata dialect identifiers.

use std::fmt;

/// A sprite-sheet metadata dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataFormat {
    StarlingXml,
    TexturePackerXml,
    JsonHash,
    JsonArray,
    Aseprite,
    Plist,
    Txt,
    Css,
    Spine,
}

impl MetadataFormat {
    /// Every geometry dialect, in sniffing priority order.
    pub const ALL: [MetadataFormat; 9] = [
        MetadataFormat::Aseprite,
        MetadataFormat::JsonHash,
        MetadataFormat::JsonArray,
        MetadataFormat::StarlingXml,
        MetadataFormat::TexturePackerXml,
        MetadataFormat::Plist,
        MetadataFormat::Spine,
        MetadataFormat::Css,
        MetadataFormat::Txt,
    ];

    /// Get the usual file extension for this dialect.
    pub fn extension(&self) -> &'static str {
        match self {
            MetadataFormat::StarlingXml | MetadataFormat::TexturePackerXml => "xml",
            MetadataFormat::JsonHash | MetadataFormat::JsonArray | MetadataFormat::Aseprite => {
                "json"
            }
            MetadataFormat::Plist => "plist",
            MetadataFormat::Txt => "txt",
            MetadataFormat::Css => "css",
            MetadataFormat::Spine => "atlas",
        }
    }

    /// Get the short name for this dialect.
    pub fn name(&self) -> &'static str {
        match self {
            MetadataFormat::StarlingXml => "starling-xml",
            MetadataFormat::TexturePackerXml => "texturepacker-xml",
            MetadataFormat::JsonHash => "json-hash",
            MetadataFormat::JsonArray => "json-array",
            MetadataFormat::Aseprite => "aseprite",
            MetadataFormat::Plist => "plist",
            MetadataFormat::Txt => "txt",
            MetadataFormat::Css => "css",
            MetadataFormat::Spine => "spine",
        }
    }
}

impl fmt::Display for MetadataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Every metadata file extension unatlas understands.
pub const METADATA_EXTENSIONS: &[&str] = &["xml", "json", "plist", "txt", "css", "atlas"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extensions_are_known() {
        for format in MetadataFormat::ALL {
            assert!(METADATA_EXTENSIONS.contains(&format.extension()));
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(MetadataFormat::StarlingXml.to_string(), "starling-xml");
        assert_eq!(MetadataFormat::Spine.to_string(), "spine");
    }
}
