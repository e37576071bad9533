//! Sprite detection for atlases without metadata.
//!
//! Sprites are the bounding boxes of 8-connected groups of non-transparent
//! pixels. Images without any transparency first have a background colour
//! keyed out; candidates are the most frequent border colours and the
//! operator confirms the choice through a [`BackgroundPrompt`].

mod prompt;

pub use prompt::{hex, parse_answer, AutoPrompt, BackgroundChoice, BackgroundPrompt, StdinPrompt};

use std::collections::HashMap;
use std::path::Path;

use image::{Rgba, RgbaImage};

use crate::error::{AtlasError, Result};
use crate::types::{Rect, SpriteMetadata};

/// Most candidates offered for one image.
pub const MAX_CANDIDATES: usize = 3;

/// Whether any pixel is less than fully opaque.
pub fn has_transparency(image: &RgbaImage) -> bool {
    image.pixels().any(|p| p[3] < 255)
}

/// Most frequent border colours, most frequent first.
pub fn background_candidates(image: &RgbaImage) -> Vec<Rgba<u8>> {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return Vec::new();
    }

    let mut counts: HashMap<[u8; 4], (usize, usize)> = HashMap::new();
    let mut order = 0;
    let mut count = |px: &Rgba<u8>| {
        let entry = counts.entry(px.0).or_insert((0, order));
        entry.0 += 1;
        order += 1;
    };

    for x in 0..w {
        count(image.get_pixel(x, 0));
        if h > 1 {
            count(image.get_pixel(x, h - 1));
        }
    }
    for y in 1..h.saturating_sub(1) {
        count(image.get_pixel(0, y));
        if w > 1 {
            count(image.get_pixel(w - 1, y));
        }
    }

    let mut ranked: Vec<([u8; 4], (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
    ranked
        .into_iter()
        .take(MAX_CANDIDATES)
        .map(|(c, _)| Rgba(c))
        .collect()
}

/// Make every pixel of exactly `colour` (ignoring alpha) transparent.
pub fn key_out(image: &mut RgbaImage, colour: Rgba<u8>) {
    for px in image.pixels_mut() {
        if px[0] == colour[0] && px[1] == colour[1] && px[2] == colour[2] {
            *px = Rgba([0, 0, 0, 0]);
        }
    }
}

/// Bounding boxes of 8-connected non-transparent regions, in scan order.
pub fn find_components(image: &RgbaImage) -> Vec<Rect> {
    let (w, h) = image.dimensions();
    let idx = |x: u32, y: u32| y as usize * w as usize + x as usize;
    let mut seen = vec![false; w as usize * h as usize];
    let mut boxes = Vec::new();
    let mut stack = Vec::new();

    for y in 0..h {
        for x in 0..w {
            if seen[idx(x, y)] || image.get_pixel(x, y)[3] == 0 {
                continue;
            }
            let (mut x0, mut y0, mut x1, mut y1) = (x, y, x, y);
            seen[idx(x, y)] = true;
            stack.push((x, y));

            while let Some((cx, cy)) = stack.pop() {
                x0 = x0.min(cx);
                y0 = y0.min(cy);
                x1 = x1.max(cx);
                y1 = y1.max(cy);

                for ny in cy.saturating_sub(1)..=(cy + 1).min(h - 1) {
                    for nx in cx.saturating_sub(1)..=(cx + 1).min(w - 1) {
                        let i = idx(nx, ny);
                        if !seen[i] && image.get_pixel(nx, ny)[3] > 0 {
                            seen[i] = true;
                            stack.push((nx, ny));
                        }
                    }
                }
            }
            boxes.push(Rect::new(x0, y0, x1 - x0 + 1, y1 - y0 + 1));
        }
    }
    boxes
}

/// Merge overlapping boxes until none overlap.
pub fn merge_overlapping(mut boxes: Vec<Rect>) -> Vec<Rect> {
    loop {
        let mut merged = false;
        let mut out: Vec<Rect> = Vec::with_capacity(boxes.len());
        for b in boxes {
            match out.iter_mut().find(|o| o.overlaps(&b)) {
                Some(o) => {
                    *o = o.union(&b);
                    merged = true;
                }
                None => out.push(b),
            }
        }
        boxes = out;
        if !merged {
            return boxes;
        }
    }
}

/// Infer sprite regions for an atlas that has no metadata.
///
/// May key the background out of `image` in place. Returns
/// [`AtlasError::Cancelled`] when the operator declines.
pub fn detect_sprites(
    image: &mut RgbaImage,
    path: &Path,
    prompt: &dyn BackgroundPrompt,
) -> Result<Vec<SpriteMetadata>> {
    if !has_transparency(image) {
        let candidates = background_candidates(image);
        match prompt.choose(path, &candidates) {
            BackgroundChoice::Remove(colour) => {
                log::debug!("{}: keying out {}", path.display(), hex(colour));
                key_out(image, colour);
            }
            BackgroundChoice::AsIs => {}
            BackgroundChoice::Cancel => {
                return Err(AtlasError::Cancelled {
                    path: path.to_path_buf(),
                })
            }
        }
    }

    let mut boxes = merge_overlapping(find_components(image));
    boxes.sort_by_key(|r| (r.y, r.x));

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let sprites: Vec<SpriteMetadata> = boxes
        .iter()
        .enumerate()
        .map(|(i, r)| SpriteMetadata::new(format!("{}{:04}", stem, i), r.x, r.y, r.width, r.height))
        .collect();

    if sprites.is_empty() {
        return Err(AtlasError::empty(path));
    }
    log::debug!("{}: detected {} regions", path.display(), sprites.len());
    Ok(sprites)
}
