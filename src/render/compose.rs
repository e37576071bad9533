//! Crop, scale and alignment of frame sequences.
//!
//! Frames of one animation are first padded to a common canvas (anchored
//! top-left), shifted by any alignment offsets, cropped to their opaque
//! content and finally scaled with nearest-neighbour sampling. Horizontal
//! flips for negative scales happen last, so crop boxes are always computed
//! in unflipped space.

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::types::{CropOption, ExportSettings, Frame, Rect};

/// Safety margin kept around content when re-cropping unknown atlases.
const EXTRA_CROP_MARGIN: u32 = 2;

/// What the composed frames are for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// One encoded animation; every frame must share a size.
    Animation,
    /// Individual frame files.
    Frames,
}

/// Bounding box of pixels with nonzero alpha.
pub fn opaque_bbox(image: &RgbaImage) -> Option<Rect> {
    let (mut x0, mut y0, mut x1, mut y1) = (u32::MAX, u32::MAX, 0, 0);
    for (x, y, px) in image.enumerate_pixels() {
        if px[3] > 0 {
            x0 = x0.min(x);
            y0 = y0.min(y);
            x1 = x1.max(x);
            y1 = y1.max(y);
        }
    }
    (x0 != u32::MAX).then(|| Rect::new(x0, y0, x1 - x0 + 1, y1 - y0 + 1))
}

/// Union of every frame's opaque box; `None` when all are transparent.
pub fn union_bbox<'a>(images: impl IntoIterator<Item = &'a RgbaImage>) -> Option<Rect> {
    images
        .into_iter()
        .filter_map(opaque_bbox)
        .reduce(|a, b| a.union(&b))
}

/// Pad every image to the largest width and height, anchored top-left.
pub fn normalize_canvas(images: Vec<RgbaImage>) -> Vec<RgbaImage> {
    let w = images.iter().map(|i| i.width()).max().unwrap_or(0);
    let h = images.iter().map(|i| i.height()).max().unwrap_or(0);
    images
        .into_iter()
        .map(|img| {
            if img.dimensions() == (w, h) {
                img
            } else {
                let mut canvas = RgbaImage::new(w, h);
                imageops::replace(&mut canvas, &img, 0, 0);
                canvas
            }
        })
        .collect()
}

/// Translate each image by its offset on a canvas grown to fit them all.
pub fn apply_offsets(images: Vec<RgbaImage>, offsets: &[(i32, i32)]) -> Vec<RgbaImage> {
    if offsets.iter().all(|o| *o == (0, 0)) {
        return images;
    }
    let min_x = offsets.iter().map(|o| o.0).min().unwrap_or(0).min(0) as i64;
    let min_y = offsets.iter().map(|o| o.1).min().unwrap_or(0).min(0) as i64;
    let max_x = offsets.iter().map(|o| o.0).max().unwrap_or(0).max(0) as i64;
    let max_y = offsets.iter().map(|o| o.1).max().unwrap_or(0).max(0) as i64;

    images
        .into_iter()
        .zip(offsets)
        .map(|(img, &(dx, dy))| {
            let w = (img.width() as i64 + max_x - min_x) as u32;
            let h = (img.height() as i64 + max_y - min_y) as u32;
            let mut canvas = RgbaImage::new(w, h);
            imageops::replace(&mut canvas, &img, dx as i64 - min_x, dy as i64 - min_y);
            canvas
        })
        .collect()
}

pub fn crop(image: &RgbaImage, rect: Rect) -> RgbaImage {
    imageops::crop_imm(image, rect.x, rect.y, rect.width, rect.height).to_image()
}

/// Nearest-neighbour scale by `|factor|`, flipping horizontally when the
/// factor is negative.
pub fn scale(image: &RgbaImage, factor: f64) -> RgbaImage {
    let magnitude = factor.abs();
    let w = ((image.width() as f64 * magnitude).round() as u32).max(1);
    let h = ((image.height() as f64 * magnitude).round() as u32).max(1);

    let scaled = if (w, h) == image.dimensions() {
        image.clone()
    } else {
        imageops::resize(image, w, h, FilterType::Nearest)
    };
    if factor < 0.0 {
        imageops::flip_horizontal(&scaled)
    } else {
        scaled
    }
}

/// Re-crop with a small margin if that shrinks the canvas by at least 25%.
pub fn extra_crop(images: Vec<RgbaImage>) -> Vec<RgbaImage> {
    let Some(first) = images.first() else {
        return images;
    };
    let (w, h) = first.dimensions();
    let Some(bbox) = union_bbox(&images) else {
        return images;
    };
    let tight = bbox.expand(EXTRA_CROP_MARGIN, w, h);
    let before = w as u64 * h as u64;
    if tight.area() * 4 > before * 3 {
        return images;
    }
    images.iter().map(|img| crop(img, tight)).collect()
}

/// Binarize alpha: below `threshold * 255` becomes fully transparent,
/// everything else fully opaque. Alpha 0 stays transparent at any threshold.
pub fn threshold_alpha(image: &mut RgbaImage, threshold: f32) {
    let cutoff = threshold.clamp(0.0, 1.0) * 255.0;
    for px in image.pixels_mut() {
        px[3] = if px[3] > 0 && px[3] as f32 >= cutoff { 255 } else { 0 };
    }
}

/// Run the full crop and scale pipeline over a frame sequence.
///
/// `unknown_atlas` enables the extra re-crop pass used for atlases whose
/// regions were detected rather than read from metadata.
pub fn compose(frames: &[&Frame], settings: &ExportSettings, target: Target, unknown_atlas: bool) -> Vec<RgbaImage> {
    let images = normalize_canvas(frames.iter().map(|f| f.image.clone()).collect());

    let images = if settings.alignment.is_identity() {
        images
    } else {
        let offsets: Vec<(i32, i32)> = frames
            .iter()
            .map(|f| settings.alignment.offset_for(&f.name))
            .collect();
        apply_offsets(images, &offsets)
    };

    let per_frame = settings.crop == CropOption::FrameBased && target == Target::Frames;
    let images: Vec<RgbaImage> = match settings.crop {
        CropOption::None => images,
        _ if per_frame => images
            .into_iter()
            .map(|img| match opaque_bbox(&img) {
                Some(rect) => crop(&img, rect),
                None => img,
            })
            .collect(),
        _ => match union_bbox(&images) {
            Some(rect) => images.iter().map(|img| crop(img, rect)).collect(),
            None => images,
        },
    };

    let images = if unknown_atlas && !per_frame {
        extra_crop(images)
    } else {
        images
    };

    images.iter().map(|img| scale(img, settings.scale)).collect()
}
