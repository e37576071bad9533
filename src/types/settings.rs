//! Export settings.
//!
//! `ExportSettings` is the fully resolved record the export pipeline works
//! from. `SettingsOverrides` is the partial form stored at each tier of the
//! `SettingsStore`; unset fields fall through to the tier below.

use std::collections::BTreeMap;
use std::fmt;

use clap::ValueEnum;
use image::ImageFormat;
use serde::{Deserialize, Serialize};

/// Frame selection policy for an animation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FrameSelection {
    #[default]
    All,
    First,
    Last,
    FirstLast,
    NoDuplicates,
    /// Comma-separated indices and ranges, e.g. `0,2,4-6,-3--1`.
    Custom(String),
}

impl From<&str> for FrameSelection {
    fn from(s: &str) -> Self {
        match s.trim() {
            "All" | "all" => FrameSelection::All,
            "First" | "first" => FrameSelection::First,
            "Last" | "last" => FrameSelection::Last,
            "First, Last" | "first-last" => FrameSelection::FirstLast,
            "No duplicates" | "no-duplicates" => FrameSelection::NoDuplicates,
            other => FrameSelection::Custom(other.to_string()),
        }
    }
}

impl From<String> for FrameSelection {
    fn from(s: String) -> Self {
        FrameSelection::from(s.as_str())
    }
}

impl From<FrameSelection> for String {
    fn from(sel: FrameSelection) -> Self {
        sel.to_string()
    }
}

impl fmt::Display for FrameSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameSelection::All => write!(f, "All"),
            FrameSelection::First => write!(f, "First"),
            FrameSelection::Last => write!(f, "Last"),
            FrameSelection::FirstLast => write!(f, "First, Last"),
            FrameSelection::NoDuplicates => write!(f, "No duplicates"),
            FrameSelection::Custom(s) => write!(f, "{}", s),
        }
    }
}

/// How frames are cropped before export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CropOption {
    None,
    /// One bounding box shared by every frame of the animation.
    #[default]
    AnimationBased,
    /// Each frame cropped to its own bounding box (frame export only).
    FrameBased,
}

/// Encoded animation format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum AnimationFormat {
    None,
    #[default]
    Gif,
    Webp,
    Apng,
}

impl AnimationFormat {
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            AnimationFormat::None => None,
            AnimationFormat::Gif => Some("gif"),
            AnimationFormat::Webp => Some("webp"),
            AnimationFormat::Apng => Some("png"),
        }
    }

    /// Codec delay granularity in milliseconds.
    pub fn delay_granularity(&self) -> u32 {
        match self {
            AnimationFormat::Gif => 10,
            _ => 1,
        }
    }
}

/// Still-image format for individual frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FrameFormat {
    #[default]
    None,
    Png,
    Webp,
    Avif,
    Bmp,
    Tga,
    Tiff,
    Dds,
}

impl FrameFormat {
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            FrameFormat::None => None,
            FrameFormat::Png => Some("png"),
            FrameFormat::Webp => Some("webp"),
            FrameFormat::Avif => Some("avif"),
            FrameFormat::Bmp => Some("bmp"),
            FrameFormat::Tga => Some("tga"),
            FrameFormat::Tiff => Some("tiff"),
            FrameFormat::Dds => Some("dds"),
        }
    }

    pub fn image_format(&self) -> Option<ImageFormat> {
        match self {
            FrameFormat::None => None,
            FrameFormat::Png => Some(ImageFormat::Png),
            FrameFormat::Webp => Some(ImageFormat::WebP),
            FrameFormat::Avif => Some(ImageFormat::Avif),
            FrameFormat::Bmp => Some(ImageFormat::Bmp),
            FrameFormat::Tga => Some(ImageFormat::Tga),
            FrameFormat::Tiff => Some(ImageFormat::Tiff),
            FrameFormat::Dds => Some(ImageFormat::Dds),
        }
    }
}

/// Pixel offsets used to realign frames of an animation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Alignment {
    /// Offset applied to every frame.
    pub offset: (i32, i32),
    /// Extra per-sprite offsets keyed by sprite name.
    pub frames: BTreeMap<String, (i32, i32)>,
}

impl Alignment {
    pub fn is_identity(&self) -> bool {
        self.offset == (0, 0) && self.frames.values().all(|o| *o == (0, 0))
    }

    /// Total offset for one sprite.
    pub fn offset_for(&self, sprite: &str) -> (i32, i32) {
        let (fx, fy) = self.frames.get(sprite).copied().unwrap_or((0, 0));
        (self.offset.0 + fx, self.offset.1 + fy)
    }
}

/// A find/replace rule applied to output file names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceRule {
    pub find: String,
    #[serde(default)]
    pub replace: String,
    /// Treat `find` as a regular expression.
    #[serde(default)]
    pub regex: bool,
}

/// Fully resolved export settings for one animation.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    pub fps: f64,
    pub end_delay_ms: u32,
    pub min_period_ms: u32,
    /// Nonzero; negative flips horizontally.
    pub scale: f64,
    pub alpha_threshold: f32,
    pub frame_selection: FrameSelection,
    pub crop: CropOption,
    pub explicit_indices: Option<Vec<usize>>,
    pub animation_format: AnimationFormat,
    pub frame_format: FrameFormat,
    pub variable_delay: bool,
    pub loop_forever: bool,
    pub alignment: Alignment,
    pub prefix: String,
    pub template: String,
    pub replace: Vec<ReplaceRule>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            fps: 24.0,
            end_delay_ms: 250,
            min_period_ms: 0,
            scale: 1.0,
            alpha_threshold: 0.5,
            frame_selection: FrameSelection::All,
            crop: CropOption::AnimationBased,
            explicit_indices: None,
            animation_format: AnimationFormat::Gif,
            frame_format: FrameFormat::None,
            variable_delay: false,
            loop_forever: true,
            alignment: Alignment::default(),
            prefix: String::new(),
            template: "standard".to_string(),
            replace: Vec::new(),
        }
    }
}

/// A partial settings record; `None` means "inherit".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsOverrides {
    pub fps: Option<f64>,
    #[serde(alias = "delay")]
    pub end_delay_ms: Option<u32>,
    #[serde(alias = "period")]
    pub min_period_ms: Option<u32>,
    pub scale: Option<f64>,
    #[serde(alias = "threshold")]
    pub alpha_threshold: Option<f32>,
    #[serde(alias = "selection")]
    pub frame_selection: Option<FrameSelection>,
    pub crop: Option<CropOption>,
    #[serde(alias = "indices")]
    pub explicit_indices: Option<Vec<usize>>,
    pub animation_format: Option<AnimationFormat>,
    pub frame_format: Option<FrameFormat>,
    pub variable_delay: Option<bool>,
    #[serde(alias = "loop")]
    pub loop_forever: Option<bool>,
    pub alignment: Option<Alignment>,
    pub prefix: Option<String>,
    pub template: Option<String>,
    pub replace: Option<Vec<ReplaceRule>>,
}

impl SettingsOverrides {
    /// Write every set field onto `settings`.
    pub fn apply_to(&self, settings: &mut ExportSettings) {
        macro_rules! take {
            ($($field:ident),* $(,)?) => {
                $(if let Some(v) = &self.$field {
                    settings.$field = v.clone();
                })*
            };
        }
        take!(
            fps,
            end_delay_ms,
            min_period_ms,
            scale,
            alpha_threshold,
            frame_selection,
            crop,
            animation_format,
            frame_format,
            variable_delay,
            loop_forever,
            alignment,
            prefix,
            template,
            replace,
        );
        if let Some(indices) = &self.explicit_indices {
            settings.explicit_indices = Some(indices.clone());
        }
    }

    /// Fill fields unset here from `lower`, keeping this tier's values.
    pub fn layered_over(&self, lower: &SettingsOverrides) -> SettingsOverrides {
        macro_rules! pick {
            ($($field:ident),* $(,)?) => {
                SettingsOverrides {
                    $($field: self.$field.clone().or_else(|| lower.$field.clone()),)*
                }
            };
        }
        pick!(
            fps,
            end_delay_ms,
            min_period_ms,
            scale,
            alpha_threshold,
            frame_selection,
            crop,
            explicit_indices,
            animation_format,
            frame_format,
            variable_delay,
            loop_forever,
            alignment,
            prefix,
            template,
            replace,
        )
    }

    /// Reject values the pipeline cannot honour.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if let Some(scale) = self.scale {
            if scale == 0.0 || !scale.is_finite() {
                return Err(format!("scale must be a nonzero number, got {}", scale));
            }
        }
        if let Some(t) = self.alpha_threshold {
            if !(0.0..=1.0).contains(&t) {
                return Err(format!("alpha threshold must be within 0..=1, got {}", t));
            }
        }
        for rule in self.replace.iter().flatten().filter(|r| r.regex) {
            regex::Regex::new(&rule.find)
                .map_err(|e| format!("invalid replace pattern '{}': {}", rule.find, e))?;
        }
        Ok(())
    }
}
