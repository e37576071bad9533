//! Bucket reconstructed frames into animations.
//!
//! Frames belong to the animation named by their normalized sprite name
//! (`Walk0003` → `Walk`). Aseprite frame tags override that by listing frame
//! ranges explicitly.

use std::collections::BTreeMap;

use crate::parser::{normalize_name, FrameTag};
use crate::types::{AnimationGroup, Frame};

/// Order frames within one group.
///
/// Lexicographic by sprite name, unless any frame carries a sequence index,
/// in which case the whole group is ordered by index.
fn order_frames(frames: &mut [Frame]) {
    if frames.iter().any(|f| f.sequence.is_some()) {
        frames.sort_by(|a, b| {
            a.sequence
                .unwrap_or(usize::MAX)
                .cmp(&b.sequence.unwrap_or(usize::MAX))
                .then_with(|| a.name.cmp(&b.name))
        });
    } else {
        frames.sort_by(|a, b| a.name.cmp(&b.name));
    }
}

/// Group frames by normalized name; groups come back sorted by name.
pub fn group_by_name(frames: Vec<Frame>) -> Vec<AnimationGroup> {
    let mut buckets: BTreeMap<String, Vec<Frame>> = BTreeMap::new();
    for frame in frames {
        buckets
            .entry(normalize_name(&frame.name))
            .or_default()
            .push(frame);
    }

    buckets
        .into_iter()
        .map(|(name, mut frames)| {
            order_frames(&mut frames);
            AnimationGroup::new(name, frames)
        })
        .collect()
}

/// Group a sheet's frames, honouring explicit frame tags.
///
/// Tagged groups keep their playback order and come first, in tag order.
/// Frames no tag covers are grouped by name; a name group that collides
/// with a tag is appended to that tag's group.
pub fn group_frames(frames: Vec<Frame>, tags: &[FrameTag]) -> Vec<AnimationGroup> {
    if tags.is_empty() {
        return group_by_name(frames);
    }

    let mut groups: Vec<AnimationGroup> = Vec::with_capacity(tags.len());
    let mut tagged = vec![false; frames.len()];
    for tag in tags {
        let members: Vec<Frame> = tag
            .indices()
            .into_iter()
            .filter_map(|i| {
                let frame = frames.get(i)?;
                tagged[i] = true;
                Some(frame.clone())
            })
            .collect();
        match groups.iter_mut().find(|g| g.name == tag.name) {
            Some(group) => group.frames.extend(members),
            None => groups.push(AnimationGroup::new(&tag.name, members)),
        }
    }

    let untagged: Vec<Frame> = frames
        .into_iter()
        .zip(tagged)
        .filter(|(_, t)| !t)
        .map(|(f, _)| f)
        .collect();

    for group in group_by_name(untagged) {
        match groups.iter_mut().find(|g| g.name == group.name) {
            Some(existing) => existing.frames.extend(group.frames),
            None => groups.push(group),
        }
    }
    groups
}

/// Whether a group effectively holds one frame: a single entry, or every
/// frame identical to the first in both geometry and pixels.
pub fn is_single_frame(group: &AnimationGroup) -> bool {
    match group.frames.split_first() {
        None => false,
        Some((first, rest)) => rest.iter().all(|f| f.same_content(first)),
    }
}

/// Re-sequence a group by explicit indices. Repeats are allowed;
/// out-of-range indices are skipped.
pub fn apply_indices(group: &AnimationGroup, indices: &[usize]) -> AnimationGroup {
    let frames = indices
        .iter()
        .filter_map(|&i| {
            let frame = group.frames.get(i);
            if frame.is_none() {
                log::debug!("{}: index {} out of range ({} frames)", group.name, i, group.len());
            }
            frame.cloned()
        })
        .collect();
    AnimationGroup::new(&group.name, frames)
}
