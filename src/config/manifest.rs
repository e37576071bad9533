//! Project manifest (unatlas.yaml) parsing.
//!
//! The manifest sets the output directory, worker count and exclusions, maps
//! spritesheets to engine character files, and carries the three settings
//! tiers.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AtlasError, Result};
use crate::types::SettingsOverrides;

use super::SettingsStore;

/// The name of the manifest file.
pub const MANIFEST_FILENAME: &str = "unatlas.yaml";

/// Project manifest loaded from unatlas.yaml.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Manifest {
    /// Output directory for extracted frames and animations.
    pub output: PathBuf,

    /// Worker threads; defaults to half the available CPUs.
    pub threads: Option<usize>,

    /// Patterns to exclude from discovery.
    pub excludes: Vec<String>,

    /// Character files by spritesheet name.
    pub characters: BTreeMap<String, PathBuf>,

    pub defaults: SettingsOverrides,
    pub spritesheets: BTreeMap<String, SettingsOverrides>,
    /// Keyed by `sheet/animation`.
    pub animations: BTreeMap<String, SettingsOverrides>,
}

fn default_output() -> PathBuf {
    PathBuf::from("extracted")
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            output: default_output(),
            threads: None,
            excludes: vec![],
            characters: BTreeMap::new(),
            defaults: SettingsOverrides::default(),
            spritesheets: BTreeMap::new(),
            animations: BTreeMap::new(),
        }
    }
}

impl Manifest {
    /// Load manifest from a unatlas.yaml file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AtlasError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read manifest: {}", e),
        })?;

        let mut manifest = Self::parse(&content)?;
        if let Some(dir) = path.parent() {
            manifest.resolve_paths(dir);
        }
        Ok(manifest)
    }

    /// Parse manifest from YAML string.
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| AtlasError::Config {
            message: format!("Invalid manifest: {}", e),
            help: Some(format!("Check {} syntax", MANIFEST_FILENAME)),
        })
    }

    /// Make relative character paths relative to the manifest's directory.
    fn resolve_paths(&mut self, dir: &Path) {
        for path in self.characters.values_mut() {
            if path.is_relative() {
                *path = dir.join(&*path);
            }
        }
    }

    /// Look for a manifest in `dir`.
    pub fn find(dir: &Path) -> Option<PathBuf> {
        let candidate = dir.join(MANIFEST_FILENAME);
        candidate.is_file().then_some(candidate)
    }

    /// Check if a path should be excluded based on exclude patterns.
    pub fn is_excluded(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy().replace('\\', "/");
        self.excludes
            .iter()
            .any(|pattern| matches_pattern(&path_str, pattern))
    }

    /// Settings store built from the manifest's tiers.
    pub fn store(&self) -> Result<SettingsStore> {
        let store = SettingsStore {
            defaults: self.defaults.clone(),
            spritesheets: self.spritesheets.clone(),
            animations: self.animations.clone(),
        };
        store.validate()?;
        Ok(store)
    }
}

/// Simple glob matching: `*.ext`, `dir/*`, `**/dir/*`, or substring.
fn matches_pattern(path: &str, pattern: &str) -> bool {
    if let Some(suffix) = pattern.strip_prefix("**/") {
        if let Some(dir) = suffix.strip_suffix("/*") {
            return path.starts_with(&format!("{}/", dir)) || path.contains(&format!("/{}/", dir));
        }
        return path.ends_with(suffix) || path.contains(suffix);
    }

    if let Some(suffix) = pattern.strip_prefix('*') {
        if !pattern.contains('/') {
            return path.ends_with(suffix);
        }
    }

    if let Some(prefix) = pattern.strip_suffix("/*") {
        return path.starts_with(&format!("{}/", prefix)) || path.contains(&format!("/{}/", prefix));
    }

    path.contains(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnimationFormat, FrameSelection};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_parse_minimal_manifest() {
        let manifest = Manifest::parse("output: build").unwrap();
        assert_eq!(manifest.output, PathBuf::from("build"));
        assert!(manifest.characters.is_empty());
        assert_eq!(manifest.threads, None);
    }

    #[test]
    fn test_parse_full_manifest() {
        let yaml = r#"
output: out/sprites
threads: 4
excludes:
  - "*.bak"
  - "**/ui/*"
characters:
  BOYFRIEND: characters/bf.json
defaults:
  fps: 24
  animation_format: apng
spritesheets:
  BOYFRIEND:
    scale: -2
animations:
  BOYFRIEND/BF idle dance:
    selection: No duplicates
    delay: 0
"#;
        let manifest = Manifest::parse(yaml).unwrap();
        assert_eq!(manifest.output, PathBuf::from("out/sprites"));
        assert_eq!(manifest.threads, Some(4));
        assert_eq!(manifest.excludes, vec!["*.bak", "**/ui/*"]);
        assert_eq!(manifest.characters["BOYFRIEND"], PathBuf::from("characters/bf.json"));

        let store = manifest.store().unwrap();
        let idle = store.resolve("BOYFRIEND", "BF idle dance");
        assert_eq!(idle.animation_format, AnimationFormat::Apng);
        assert_eq!(idle.scale, -2.0);
        assert_eq!(idle.frame_selection, FrameSelection::NoDuplicates);
        assert_eq!(idle.end_delay_ms, 0);
    }

    #[test]
    fn test_unknown_key_is_config_error() {
        let err = Manifest::parse("outptu: x").unwrap_err();
        assert!(matches!(err, AtlasError::Config { .. }));
    }

    #[test]
    fn test_zero_scale_rejected_on_store() {
        let manifest = Manifest::parse("defaults:\n  scale: 0\n").unwrap();
        assert!(matches!(manifest.store().unwrap_err(), AtlasError::Config { .. }));
    }

    #[test]
    fn test_parse_empty_manifest() {
        let manifest = Manifest::parse("").unwrap();
        assert_eq!(manifest, Manifest::default());
    }

    #[test]
    fn test_is_excluded() {
        let manifest = Manifest {
            excludes: vec!["*.bak".to_string(), "**/ui/*".to_string(), "temp".to_string()],
            ..Default::default()
        };
        assert!(manifest.is_excluded(Path::new("path/to/file.bak")));
        assert!(manifest.is_excluded(Path::new("assets/ui/button.png")));
        assert!(manifest.is_excluded(Path::new("ui/button.png")));
        assert!(manifest.is_excluded(Path::new("path/temp/file.png")));
        assert!(!manifest.is_excluded(Path::new("assets/bf.png")));
    }

    #[test]
    fn test_load_resolves_character_paths() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(MANIFEST_FILENAME);
        std::fs::write(&path, "characters:\n  bf: chars/bf.json\n").unwrap();

        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.characters["bf"], dir.path().join("chars/bf.json"));
        assert_eq!(Manifest::find(dir.path()), Some(path));
    }
}
