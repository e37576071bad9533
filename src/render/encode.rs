//! Animation and still-frame encoders.
//!
//! An [`AnimationEncoder`] takes equally sized RGBA frames with one duration
//! per frame and writes a single animated file. GIF goes through `gif` so the
//! generator comment lands in a comment extension, APNG through `png` so
//! delays keep millisecond precision and the comment lands in a `tEXt` chunk.
//! Animated WebP is written with `webp-animation`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::RgbaImage;

use crate::error::{AtlasError, Result};
use crate::types::{AnimationFormat, FrameFormat};

/// Comment embedded in encoded animations.
pub fn generator_comment() -> String {
    format!("Generated by unatlas {}", env!("CARGO_PKG_VERSION"))
}

/// Writes one animated file from a frame sequence.
pub trait AnimationEncoder: Send + Sync {
    fn format(&self) -> AnimationFormat;

    fn encode(
        &self,
        frames: &[RgbaImage],
        durations_ms: &[u32],
        loop_forever: bool,
        comment: &str,
        path: &Path,
    ) -> Result<()>;
}

/// Built-in encoder for a format, if any.
pub fn encoder_for(format: AnimationFormat) -> Option<Box<dyn AnimationEncoder>> {
    match format {
        AnimationFormat::None => None,
        AnimationFormat::Gif => Some(Box::new(GifAnimationEncoder)),
        AnimationFormat::Apng => Some(Box::new(ApngEncoder)),
        AnimationFormat::Webp => Some(Box::new(WebpAnimationEncoder)),
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    File::create(path).map(BufWriter::new).map_err(|e| AtlasError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to create output: {}", e),
    })
}

fn encode_error(path: &Path, e: impl std::fmt::Display) -> AtlasError {
    AtlasError::export(format!("{}: {}", path.display(), e))
}

fn check_frames(frames: &[RgbaImage], durations_ms: &[u32], path: &Path) -> Result<()> {
    if frames.is_empty() {
        return Err(encode_error(path, "no frames to encode"));
    }
    if frames.len() != durations_ms.len() {
        return Err(encode_error(
            path,
            format!("{} frames but {} durations", frames.len(), durations_ms.len()),
        ));
    }
    let size = frames[0].dimensions();
    if frames.iter().any(|f| f.dimensions() != size) {
        return Err(encode_error(path, "frames differ in size"));
    }
    Ok(())
}

pub struct GifAnimationEncoder;

/// GIF delay in hundredths of a second.
fn gif_delay(ms: u32) -> u16 {
    ((ms + 5) / 10).min(u16::MAX as u32) as u16
}

impl AnimationEncoder for GifAnimationEncoder {
    fn format(&self) -> AnimationFormat {
        AnimationFormat::Gif
    }

    fn encode(
        &self,
        frames: &[RgbaImage],
        durations_ms: &[u32],
        loop_forever: bool,
        comment: &str,
        path: &Path,
    ) -> Result<()> {
        check_frames(frames, durations_ms, path)?;
        let (w, h) = frames[0].dimensions();
        let (Ok(w), Ok(h)) = (u16::try_from(w), u16::try_from(h)) else {
            return Err(encode_error(path, "GIF frames are limited to 65535x65535"));
        };

        let mut encoder = gif::Encoder::new(create(path)?, w, h, &[]).map_err(|e| encode_error(path, e))?;
        let repeat = if loop_forever {
            gif::Repeat::Infinite
        } else {
            gif::Repeat::Finite(0)
        };
        encoder.set_repeat(repeat).map_err(|e| encode_error(path, e))?;
        if !comment.is_empty() {
            let blocks: Vec<&[u8]> = comment.as_bytes().chunks(255).collect();
            encoder
                .write_raw_extension(gif::AnyExtension(gif::Extension::Comment as u8), &blocks)
                .map_err(|e| encode_error(path, e))?;
        }

        for (image, &ms) in frames.iter().zip(durations_ms) {
            let mut rgba = image.as_raw().clone();
            let mut frame = gif::Frame::from_rgba_speed(w, h, &mut rgba, 10);
            frame.delay = gif_delay(ms);
            frame.dispose = gif::DisposalMethod::Background;
            encoder.write_frame(&frame).map_err(|e| encode_error(path, e))?;
        }
        encoder
            .into_inner()
            .and_then(|mut out| out.flush())
            .map_err(|e| encode_error(path, e))
    }
}

pub struct ApngEncoder;

/// APNG delay as a `u16` fraction of a second.
fn apng_delay(ms: u32) -> (u16, u16) {
    if ms <= u16::MAX as u32 {
        (ms as u16, 1000)
    } else {
        ((ms / 10).min(u16::MAX as u32) as u16, 100)
    }
}

impl AnimationEncoder for ApngEncoder {
    fn format(&self) -> AnimationFormat {
        AnimationFormat::Apng
    }

    fn encode(
        &self,
        frames: &[RgbaImage],
        durations_ms: &[u32],
        loop_forever: bool,
        comment: &str,
        path: &Path,
    ) -> Result<()> {
        check_frames(frames, durations_ms, path)?;
        let (w, h) = frames[0].dimensions();

        let mut encoder = png::Encoder::new(create(path)?, w, h);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder
            .set_animated(frames.len() as u32, if loop_forever { 0 } else { 1 })
            .map_err(|e| encode_error(path, e))?;
        encoder
            .add_text_chunk("Comment".to_string(), comment.to_string())
            .map_err(|e| encode_error(path, e))?;

        let mut writer = encoder.write_header().map_err(|e| encode_error(path, e))?;
        for (image, &ms) in frames.iter().zip(durations_ms) {
            let (num, den) = apng_delay(ms);
            writer
                .set_frame_delay(num, den)
                .map_err(|e| encode_error(path, e))?;
            writer
                .write_image_data(image.as_raw())
                .map_err(|e| encode_error(path, e))?;
        }
        writer.finish().map_err(|e| encode_error(path, e))
    }
}

pub struct WebpAnimationEncoder;

impl AnimationEncoder for WebpAnimationEncoder {
    fn format(&self) -> AnimationFormat {
        AnimationFormat::Webp
    }

    fn encode(
        &self,
        frames: &[RgbaImage],
        durations_ms: &[u32],
        loop_forever: bool,
        _comment: &str,
        path: &Path,
    ) -> Result<()> {
        check_frames(frames, durations_ms, path)?;
        let options = webp_animation::EncoderOptions {
            anim_params: webp_animation::AnimParams {
                loop_count: if loop_forever { 0 } else { 1 },
            },
            ..Default::default()
        };
        let mut encoder = webp_animation::Encoder::new_with_options(frames[0].dimensions(), options)
            .map_err(|e| encode_error(path, format!("{:?}", e)))?;

        let mut timestamp: i32 = 0;
        for (image, &ms) in frames.iter().zip(durations_ms) {
            encoder
                .add_frame(image.as_raw(), timestamp)
                .map_err(|e| encode_error(path, format!("{:?}", e)))?;
            timestamp = timestamp.saturating_add(ms.min(i32::MAX as u32) as i32);
        }
        let data = encoder
            .finalize(timestamp)
            .map_err(|e| encode_error(path, format!("{:?}", e)))?;

        let mut out = create(path)?;
        out.write_all(&data).and_then(|_| out.flush()).map_err(|e| AtlasError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to write animation: {}", e),
        })
    }
}

/// Write one still frame in the requested format.
pub fn write_frame(image: &RgbaImage, format: FrameFormat, path: &Path) -> Result<()> {
    let Some(image_format) = format.image_format() else {
        return Err(AtlasError::export("no frame format selected"));
    };
    if format == FrameFormat::Dds {
        return Err(AtlasError::Export {
            message: format!("{}: DDS output is not supported", path.display()),
            help: Some("Choose png, webp, avif, bmp, tga or tiff".to_string()),
        });
    }
    image
        .save_with_format(path, image_format)
        .map_err(|e| AtlasError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to write frame: {}", e),
        })
}
