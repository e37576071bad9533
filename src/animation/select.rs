//! Frame selection policies.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeSet, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use image::RgbaImage;
use regex::Regex;

use crate::types::{AnimationGroup, FrameSelection};

/// Largest sampling grid used for duplicate detection.
const SIGNATURE_GRID: u32 = 32;

/// Resolve a possibly negative index against `n` frames.
fn resolve(i: i64, n: usize) -> i64 {
    if i < 0 {
        n as i64 + i
    } else {
        i
    }
}

/// Parse a custom selection like `0, 2, 4-6, -3--1` into sorted, unique
/// indices within `0..n`.
///
/// Negative numbers count from the end. A range whose start is past its end
/// is read in reverse. Malformed or out-of-range entries are skipped.
pub fn parse_indices(spec: &str, n: usize) -> Vec<usize> {
    static RANGE: OnceLock<Regex> = OnceLock::new();
    static SINGLE: OnceLock<Regex> = OnceLock::new();
    let range = RANGE.get_or_init(|| Regex::new(r"^(-?\d+)\s*-\s*(-?\d+)$").expect("valid regex"));
    let single = SINGLE.get_or_init(|| Regex::new(r"^(-?\d+)$").expect("valid regex"));

    let mut out = BTreeSet::new();
    let limit = n as i64;
    for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        if let Some(caps) = single.captures(entry) {
            let Ok(i) = caps[1].parse::<i64>() else { continue };
            let i = resolve(i, n);
            if (0..limit).contains(&i) {
                out.insert(i as usize);
            }
        } else if let Some(caps) = range.captures(entry) {
            let (Ok(a), Ok(b)) = (caps[1].parse::<i64>(), caps[2].parse::<i64>()) else {
                continue;
            };
            let (a, b) = (resolve(a, n), resolve(b, n));
            let (lo, hi) = (a.min(b).max(0), a.max(b).min(limit - 1));
            for i in lo..=hi {
                out.insert(i as usize);
            }
        } else {
            log::debug!("ignoring malformed selection entry '{}'", entry);
        }
    }
    out.into_iter().collect()
}

/// Coarse content signature from at most a 32x32 grid of samples.
///
/// Frames that differ only between sample points collide; this is an
/// approximate check, unlike single-frame detection.
pub fn signature(image: &RgbaImage) -> u64 {
    let (w, h) = image.dimensions();
    let mut hasher = DefaultHasher::new();
    (w, h).hash(&mut hasher);

    let cols = w.min(SIGNATURE_GRID);
    let rows = h.min(SIGNATURE_GRID);
    for row in 0..rows {
        let y = (row as u64 * h as u64 / rows as u64) as u32;
        for col in 0..cols {
            let x = (col as u64 * w as u64 / cols as u64) as u32;
            image.get_pixel(x, y).0.hash(&mut hasher);
        }
    }
    hasher.finish()
}

/// Indices of frames kept for export, sorted and unique.
pub fn select_frames(group: &AnimationGroup, selection: &FrameSelection, single_frame: bool) -> Vec<usize> {
    let n = group.len();
    if n == 0 {
        return Vec::new();
    }
    if single_frame {
        return vec![0];
    }

    match selection {
        FrameSelection::All => (0..n).collect(),
        FrameSelection::First => vec![0],
        FrameSelection::Last => vec![n - 1],
        FrameSelection::FirstLast => {
            let set: BTreeSet<usize> = [0, n - 1].into_iter().collect();
            set.into_iter().collect()
        }
        FrameSelection::NoDuplicates => {
            let mut seen = HashSet::new();
            group
                .frames
                .iter()
                .enumerate()
                .filter(|(_, f)| seen.insert(signature(&f.image)))
                .map(|(i, _)| i)
                .collect()
        }
        FrameSelection::Custom(spec) => parse_indices(spec, n),
    }
}
