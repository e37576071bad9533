//! Background colour confirmation.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Mutex;

use image::Rgba;

use crate::output::display_path;

/// Operator's answer for an atlas without transparency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundChoice {
    /// Key this colour out to transparent.
    Remove(Rgba<u8>),
    /// Keep the image as-is.
    AsIs,
    /// Skip the whole file.
    Cancel,
}

/// Asks which border colour, if any, is the background.
pub trait BackgroundPrompt: Send + Sync {
    fn choose(&self, image: &Path, candidates: &[Rgba<u8>]) -> BackgroundChoice;
}

/// Non-interactive prompt that always takes the most frequent candidate.
pub struct AutoPrompt;

impl BackgroundPrompt for AutoPrompt {
    fn choose(&self, _image: &Path, candidates: &[Rgba<u8>]) -> BackgroundChoice {
        candidates
            .first()
            .map(|c| BackgroundChoice::Remove(*c))
            .unwrap_or(BackgroundChoice::AsIs)
    }
}

pub fn hex(colour: Rgba<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", colour[0], colour[1], colour[2])
}

/// Map one line of operator input to a choice.
///
/// A number picks that candidate (1-based), `k` keeps the image, anything
/// else cancels. An empty line takes the first candidate.
pub fn parse_answer(answer: &str, candidates: &[Rgba<u8>]) -> BackgroundChoice {
    let answer = answer.trim().to_ascii_lowercase();
    if answer.is_empty() {
        return AutoPrompt.choose(Path::new(""), candidates);
    }
    if answer == "k" || answer == "keep" {
        return BackgroundChoice::AsIs;
    }
    match answer.parse::<usize>() {
        Ok(n) if (1..=candidates.len()).contains(&n) => BackgroundChoice::Remove(candidates[n - 1]),
        _ => BackgroundChoice::Cancel,
    }
}

/// Interactive prompt on stderr/stdin. Questions from parallel jobs are
/// asked one at a time.
#[derive(Default)]
pub struct StdinPrompt {
    lock: Mutex<()>,
}

impl BackgroundPrompt for StdinPrompt {
    fn choose(&self, image: &Path, candidates: &[Rgba<u8>]) -> BackgroundChoice {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "{} has no transparency. Background colour?", display_path(image));
        for (i, c) in candidates.iter().enumerate() {
            let _ = writeln!(stderr, "  [{}] {}", i + 1, hex(*c));
        }
        let _ = write!(stderr, "  [k] keep as-is, [c] cancel (default 1): ");
        let _ = stderr.flush();

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => BackgroundChoice::Cancel,
            Ok(_) => parse_answer(&line, candidates),
        }
    }
}
