//! unatlas - Texture atlas sprite extraction
//!
//! A library for cutting the frames of a texture atlas back out using its
//! metadata (Sparrow/Starling XML, TexturePacker XML, JSON, Aseprite, plist,
//! TXT, CSS, Spine), grouping them into animations and exporting frame images
//! and encoded GIF/APNG animations. Atlases without metadata go through a
//! connected-region detector.

pub mod animation;
pub mod cli;
pub mod config;
pub mod detect;
pub mod discovery;
pub mod error;
pub mod export;
pub mod output;
pub mod parser;
pub mod render;
pub mod report;
pub mod types;

pub use config::{Manifest, SettingsStore};
pub use discovery::{discover, AtlasJob};
pub use error::{AtlasError, Result};
pub use export::{extract_atlas, run_batch, BatchOptions, ExtractContext};
pub use parser::{normalize_name, MetadataFormat, MetadataParser, ParsedSheet, ParserRegistry};
pub use report::{AtlasOutcome, AtlasStats, BatchSummary, Diagnostic, Report, Severity};
pub use types::{
    AnimationFormat, AnimationGroup, CropOption, ExportSettings, Frame, FrameFormat,
    FrameSelection, Rect, SettingsOverrides, SpriteMetadata,
};
