//! Three-tier export settings.
//!
//! Settings resolve from the most specific tier down: the animation entry
//! (`sheet/animation`), then the spritesheet entry, then the store defaults,
//! then the built-in [`ExportSettings::default`].

use std::collections::BTreeMap;

use crate::error::{AtlasError, Result};
use crate::parser::character::CharacterData;
use crate::types::{ExportSettings, SettingsOverrides};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsStore {
    pub defaults: SettingsOverrides,
    /// Keyed by spritesheet name (atlas file stem).
    pub spritesheets: BTreeMap<String, SettingsOverrides>,
    /// Keyed by `sheet/animation`.
    pub animations: BTreeMap<String, SettingsOverrides>,
}

/// Key of an animation entry.
pub fn animation_key(sheet: &str, animation: &str) -> String {
    format!("{}/{}", sheet, animation)
}

impl SettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Effective settings for one animation of one spritesheet.
    pub fn resolve(&self, sheet: &str, animation: &str) -> ExportSettings {
        let mut settings = ExportSettings::default();
        self.defaults.apply_to(&mut settings);
        if let Some(o) = self.spritesheets.get(sheet) {
            o.apply_to(&mut settings);
        }
        if let Some(o) = self.animations.get(&animation_key(sheet, animation)) {
            o.apply_to(&mut settings);
        }
        settings
    }

    /// Layer `overrides` on top of the defaults tier.
    pub fn override_defaults(&mut self, overrides: &SettingsOverrides) {
        self.defaults = overrides.layered_over(&self.defaults);
    }

    pub fn set_spritesheet(&mut self, sheet: &str, overrides: SettingsOverrides) {
        self.spritesheets.insert(sheet.to_string(), overrides);
    }

    pub fn set_animation(&mut self, sheet: &str, animation: &str, overrides: SettingsOverrides) {
        self.animations.insert(animation_key(sheet, animation), overrides);
    }

    /// Merge a character file's animations beneath existing animation
    /// entries, so explicit configuration keeps precedence.
    pub fn apply_character(&mut self, sheet: &str, character: &CharacterData) {
        for anim in &character.animations {
            let key = animation_key(sheet, &anim.prefix);
            let overlay = anim.overrides();
            let merged = match self.animations.get(&key) {
                Some(existing) => existing.layered_over(&overlay),
                None => overlay,
            };
            self.animations.insert(key, merged);
        }
    }

    /// Check every tier for values the pipeline cannot honour.
    pub fn validate(&self) -> Result<()> {
        let tiers = std::iter::once(("defaults".to_string(), &self.defaults))
            .chain(self.spritesheets.iter().map(|(k, v)| (format!("spritesheets.{}", k), v)))
            .chain(self.animations.iter().map(|(k, v)| (format!("animations.{}", k), v)));

        for (tier, overrides) in tiers {
            overrides.validate().map_err(|message| AtlasError::Config {
                message: format!("{}: {}", tier, message),
                help: None,
            })?;
        }
        Ok(())
    }
}
