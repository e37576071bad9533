//! Core types for unatlas.

pub mod frame;
pub mod settings;
pub mod sprite;

pub use frame::{AnimationGroup, Frame};
pub use settings::{
    Alignment, AnimationFormat, CropOption, ExportSettings, FrameFormat, FrameSelection,
    ReplaceRule, SettingsOverrides,
};
pub use sprite::{Rect, RegionKey, SpriteMetadata};
