//! Output file naming.
//!
//! A template expands `{prefix}`, `{spritesheet}`, `{sprite}` and
//! `{animation}`. Three presets exist:
//!
//! - `standard`: `{prefix} - {sprite} - {animation}`
//! - `no-spaces`: the standard name with spaces turned into underscores
//! - `no-special`: the standard name reduced to letters, digits, `-` and `_`
//!
//! Any other template string is expanded as given. Find/replace rules run on
//! the expanded name, then the result is made safe for the filesystem.

use regex::Regex;

use crate::error::{AtlasError, Result};
use crate::types::{ExportSettings, ReplaceRule};

const STANDARD: &str = "{prefix} - {sprite} - {animation}";

/// Substitute placeholders and drop separators left dangling by empty ones.
pub fn expand_template(template: &str, prefix: &str, sheet: &str, animation: &str) -> String {
    let expanded = template
        .replace("{prefix}", prefix)
        .replace("{spritesheet}", sheet)
        .replace("{sprite}", sheet)
        .replace("{animation}", animation);

    expanded
        .split(" - ")
        .filter(|part| !part.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" - ")
}

fn preset(template: &str, prefix: &str, sheet: &str, animation: &str) -> String {
    match template {
        "standard" | "" => expand_template(STANDARD, prefix, sheet, animation),
        "no-spaces" => expand_template(STANDARD, prefix, sheet, animation)
            .replace(" - ", "-")
            .replace(' ', "_"),
        "no-special" => {
            let name = expand_template(STANDARD, prefix, sheet, animation).replace(" - ", "_");
            let mut out = String::with_capacity(name.len());
            for c in name.chars() {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    out.push(c);
                } else if !out.ends_with('_') {
                    out.push('_');
                }
            }
            out.trim_matches('_').to_string()
        }
        custom => expand_template(custom, prefix, sheet, animation),
    }
}

/// Apply find/replace rules in order.
pub fn apply_replacements(name: &str, rules: &[ReplaceRule]) -> Result<String> {
    let mut name = name.to_string();
    for rule in rules {
        if rule.find.is_empty() {
            continue;
        }
        name = if rule.regex {
            let re = Regex::new(&rule.find).map_err(|e| AtlasError::Config {
                message: format!("invalid replace pattern '{}': {}", rule.find, e),
                help: None,
            })?;
            re.replace_all(&name, rule.replace.as_str()).into_owned()
        } else {
            name.replace(&rule.find, &rule.replace)
        };
    }
    Ok(name)
}

/// Make a name usable as a single path component.
pub fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim().trim_end_matches('.');
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "_".to_string()
    } else {
        cleaned.to_string()
    }
}

/// File stem (without extension) for an animation of a spritesheet.
pub fn output_stem(settings: &ExportSettings, sheet: &str, animation: &str) -> Result<String> {
    let name = preset(&settings.template, &settings.prefix, sheet, animation);
    let name = apply_replacements(&name, &settings.replace)?;
    Ok(sanitize(&name))
}

/// Zero-padded frame index, at least four digits wide.
pub fn frame_index(index: usize, count: usize) -> String {
    let width = count.saturating_sub(1).to_string().len().max(4);
    format!("{:0width$}", index, width = width)
}
