//! # Display Module
//!
//! Splits note strings produced by [`crate::note`] into the pieces the
//! label shows on separate lines.

use once_cell::sync::Lazy;
use regex::Regex;

/// Note name with octave, deviation marker, deviation with percent sign.
static NOTE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Gb#]*-?[0-9]*)([?+-]?)(.*?%?)$").expect("note pattern is valid")
});

/// A note string split into its display parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteParts {
    /// Note letter, accidental and octave, e.g. "C#3". Empty for "?".
    pub name: String,
    /// "+", "-", "?" or empty.
    pub marker: String,
    /// Deviation from the named note, e.g. "12.50%". Often empty.
    pub deviation: String,
}

impl NoteParts {
    /// Splits `note` with the fixed note pattern.
    ///
    /// Returns `None` for text the pattern does not cover (multi-line input).
    pub fn parse(note: &str) -> Option<Self> {
        let caps = NOTE_PATTERN.captures(note)?;
        let group = |i| caps.get(i).map_or("", |m| m.as_str()).to_string();
        Some(Self {
            name: group(1),
            marker: group(2),
            deviation: group(3),
        })
    }

    /// One line per part. Empty parts still take their line.
    pub fn render(&self) -> String {
        [self.name.as_str(), self.marker.as_str(), self.deviation.as_str()].join("\n")
    }
}

/// Label text for a note string; falls back to the raw string if it cannot be split.
pub fn label_text(note: &str) -> String {
    match NoteParts::parse(note) {
        Some(parts) => parts.render(),
        None => note.to_string(),
    }
}
