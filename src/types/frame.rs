//! Reconstructed frames and the animations built from them.

use image::RgbaImage;

use super::sprite::RegionKey;

/// A reconstructed logical frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Source sprite name.
    pub name: String,
    /// Full logical-frame pixels.
    pub image: RgbaImage,
    /// Geometry of the source region.
    pub region: RegionKey,
    /// Explicit duration from the metadata, if any.
    pub duration_ms: Option<u32>,
    /// Explicit position within its animation, if assigned upstream.
    pub sequence: Option<usize>,
}

impl Frame {
    pub fn new(name: impl Into<String>, image: RgbaImage, region: RegionKey) -> Self {
        Self {
            name: name.into(),
            image,
            region,
            duration_ms: None,
            sequence: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Same geometry and same pixels.
    pub fn same_content(&self, other: &Frame) -> bool {
        self.region == other.region && self.image == other.image
    }
}

/// A named, ordered sequence of frames.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationGroup {
    pub name: String,
    pub frames: Vec<Frame>,
}

impl AnimationGroup {
    pub fn new(name: impl Into<String>, frames: Vec<Frame>) -> Self {
        Self {
            name: name.into(),
            frames,
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
