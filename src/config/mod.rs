//! Configuration: the project manifest and the settings store it feeds.

mod manifest;
mod store;

pub use manifest::{Manifest, MANIFEST_FILENAME};
pub use store::{animation_key, SettingsStore};
