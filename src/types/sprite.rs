//! Normalized sprite metadata.
//!
//! Every format parser produces `SpriteMetadata` records regardless of the
//! dialect it reads. Field names follow the Starling convention: `x/y/width/
//! height` locate the packed region in the atlas, `frame_*` describe the
//! untrimmed logical frame.

use serde::Serialize;

/// One packed region in an atlas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpriteMetadata {
    /// Sprite name, usually animation name plus frame number (e.g. `Walk0007`).
    pub name: String,

    /// Region in the atlas, in atlas space (already swapped for rotated sprites).
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,

    /// Offset of the trimmed region relative to the logical frame.
    ///
    /// The region is pasted back at `(-frame_x, -frame_y)`, so a sprite trimmed
    /// 5px from the left carries `frame_x = -5`.
    pub frame_x: i32,
    pub frame_y: i32,

    /// Logical (untrimmed) frame size.
    pub frame_width: u32,
    pub frame_height: u32,

    /// Region is stored rotated 90° clockwise in the atlas.
    pub rotated: bool,

    /// Normalized pivot, carried through for dialects that record one.
    pub pivot: Option<(f32, f32)>,

    /// Explicit frame duration in milliseconds (Aseprite).
    pub duration_ms: Option<u32>,
}

impl SpriteMetadata {
    /// Create an untrimmed, unrotated sprite covering the given region.
    pub fn new(name: impl Into<String>, x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            width,
            height,
            frame_x: 0,
            frame_y: 0,
            frame_width: width,
            frame_height: height,
            rotated: false,
            pivot: None,
            duration_ms: None,
        }
    }

    /// Set the trim offset and logical frame size.
    pub fn with_frame(mut self, frame_x: i32, frame_y: i32, frame_width: u32, frame_height: u32) -> Self {
        self.frame_x = frame_x;
        self.frame_y = frame_y;
        self.frame_width = frame_width;
        self.frame_height = frame_height;
        self
    }

    /// Mark the region as rotated in the atlas.
    pub fn with_rotated(mut self, rotated: bool) -> Self {
        self.rotated = rotated;
        self
    }

    /// Region size once the packer's rotation has been undone.
    pub fn upright_size(&self) -> (u32, u32) {
        if self.rotated {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }

    /// Geometry tuple used for deduplication and alignment matching.
    pub fn region_key(&self) -> RegionKey {
        RegionKey {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            frame_x: self.frame_x,
            frame_y: self.frame_y,
        }
    }
}

/// `(x, y, width, height, frame_x, frame_y)` of a sprite's source region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RegionKey {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub frame_x: i32,
    pub frame_y: i32,
}

/// An axis-aligned pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }

    /// Whether the rectangles share at least one pixel.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Grow by `margin` on every side, clamped to `0..max_w` x `0..max_h`.
    pub fn expand(&self, margin: u32, max_w: u32, max_h: u32) -> Rect {
        let x = self.x.saturating_sub(margin);
        let y = self.y.saturating_sub(margin);
        let right = (self.right() + margin).min(max_w);
        let bottom = (self.bottom() + margin).min(max_h);
        Rect {
            x,
            y,
            width: right.saturating_sub(x),
            height: bottom.saturating_sub(y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults_frame_to_region() {
        let s = SpriteMetadata::new("Walk0000", 4, 8, 10, 12);
        assert_eq!((s.frame_width, s.frame_height), (10, 12));
        assert_eq!((s.frame_x, s.frame_y), (0, 0));
        assert!(!s.rotated);
    }

    #[test]
    fn test_upright_size_swaps_when_rotated() {
        let s = SpriteMetadata::new("a", 0, 0, 3, 7).with_rotated(true);
        assert_eq!(s.upright_size(), (7, 3));
    }

    #[test]
    fn test_rect_union() {
        let a = Rect::new(2, 2, 4, 4);
        let b = Rect::new(5, 0, 2, 3);
        assert_eq!(a.union(&b), Rect::new(2, 0, 5, 6));
    }

    #[test]
    fn test_rect_overlaps() {
        let a = Rect::new(0, 0, 2, 2);
        assert!(a.overlaps(&Rect::new(1, 1, 3, 3)));
        assert!(!a.overlaps(&Rect::new(2, 0, 1, 1)));
    }

    #[test]
    fn test_rect_expand_clamps() {
        let r = Rect::new(1, 1, 4, 4).expand(2, 6, 6);
        assert_eq!(r, Rect::new(0, 0, 6, 6));
    }
}
