//! Pixel work for unatlas.
//!
//! This module rebuilds logical frames from atlas regions, crops and scales
//! frame sequences, and encodes them to disk.

mod compose;
mod encode;
mod reconstruct;

pub use compose::{
    apply_offsets, compose, crop, extra_crop, normalize_canvas, opaque_bbox, scale,
    threshold_alpha, union_bbox, Target,
};
pub use encode::{
    encoder_for, generator_comment, write_frame, AnimationEncoder, ApngEncoder,
    GifAnimationEncoder, WebpAnimationEncoder,
};
pub use reconstruct::{reconstruct, reconstruct_all};
