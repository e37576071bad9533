//! Rebuild logical frames from packed atlas regions.
//!
//! Packers trim transparent borders and may rotate regions to pack tighter.
//! Reconstruction undoes both: the region is cut from the atlas, turned back
//! upright and pasted onto a canvas of the logical frame size.

use image::{imageops, RgbaImage};

use crate::report::{Diagnostic, Report, GEOMETRY_CLAMPED};
use crate::types::{Frame, SpriteMetadata};

/// The part of `sprite`'s region that lies inside the atlas, as
/// `(x, y, width, height)`, and whether anything was cut off.
fn clamp_region(sprite: &SpriteMetadata, atlas_w: u32, atlas_h: u32) -> ((u32, u32, u32, u32), bool) {
    let x0 = sprite.x.min(atlas_w);
    let y0 = sprite.y.min(atlas_h);
    let x1 = (sprite.x as u64 + sprite.width as u64).min(atlas_w as u64) as u32;
    let y1 = (sprite.y as u64 + sprite.height as u64).min(atlas_h as u64) as u32;
    let clamped = (x0, y0, x1 - x0, y1 - y0);
    (clamped, clamped.2 != sprite.width || clamped.3 != sprite.height)
}

/// Reconstruct one sprite's logical frame.
///
/// A region outside the atlas or a frame smaller than its region is clamped
/// and reported; nothing here fails.
pub fn reconstruct(atlas: &RgbaImage, sprite: &SpriteMetadata, report: &mut Report) -> Frame {
    let ((x, y, w, h), clamped) = clamp_region(sprite, atlas.width(), atlas.height());
    if clamped {
        log::warn!(
            "sprite '{}' region {}x{}+{}+{} exceeds the {}x{} atlas",
            sprite.name,
            sprite.width,
            sprite.height,
            sprite.x,
            sprite.y,
            atlas.width(),
            atlas.height()
        );
        report.push(
            Diagnostic::warning(
                GEOMETRY_CLAMPED,
                format!(
                    "region {}x{} at ({}, {}) clamped to {}x{} inside the {}x{} atlas",
                    sprite.width,
                    sprite.height,
                    sprite.x,
                    sprite.y,
                    w,
                    h,
                    atlas.width(),
                    atlas.height()
                ),
            )
            .with_subject(&sprite.name),
        );
    }

    let mut frame = Frame::new(&sprite.name, RgbaImage::new(1, 1), sprite.region_key());
    frame.duration_ms = sprite.duration_ms;

    if w == 0 || h == 0 {
        return frame;
    }

    let mut region = imageops::crop_imm(atlas, x, y, w, h).to_image();
    if sprite.rotated {
        region = imageops::rotate270(&region);
    }

    if sprite.frame_width < region.width() || sprite.frame_height < region.height() {
        log::warn!(
            "sprite '{}' frame {}x{} is smaller than its {}x{} region",
            sprite.name,
            sprite.frame_width,
            sprite.frame_height,
            region.width(),
            region.height()
        );
        report.push(
            Diagnostic::warning(
                GEOMETRY_CLAMPED,
                format!(
                    "frame {}x{} grown to fit the {}x{} region",
                    sprite.frame_width,
                    sprite.frame_height,
                    region.width(),
                    region.height()
                ),
            )
            .with_subject(&sprite.name),
        );
    }
    let frame_w = sprite.frame_width.max(region.width()).max(1);
    let frame_h = sprite.frame_height.max(region.height()).max(1);

    let untouched = region.width() == frame_w
        && region.height() == frame_h
        && sprite.frame_x == 0
        && sprite.frame_y == 0;
    if untouched {
        frame.image = region;
        return frame;
    }

    let mut canvas = RgbaImage::new(frame_w, frame_h);
    imageops::replace(
        &mut canvas,
        &region,
        -(sprite.frame_x as i64),
        -(sprite.frame_y as i64),
    );
    frame.image = canvas;
    frame
}

/// Reconstruct every sprite in order.
pub fn reconstruct_all(atlas: &RgbaImage, sprites: &[SpriteMetadata], report: &mut Report) -> Vec<Frame> {
    sprites
        .iter()
        .map(|sprite| reconstruct(atlas, sprite, report))
        .collect()
}
