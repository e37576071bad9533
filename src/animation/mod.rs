//! Animation grouping, frame selection and timing.

mod group;
mod select;
mod timing;

pub use group::{apply_indices, group_by_name, group_frames, is_single_frame};
pub use select::{parse_indices, select_frames, signature};
pub use timing::frame_durations;
