//! Metadata reconciliation
//!
//! Tags in the wild are free text: BPM fields carry units and decimal commas,
//! key fields mix Camelot codes, full key names and short forms like "Am".
//! This module normalizes all of that into canonical values and merges
//! tag-derived and filename-derived fields with a deterministic fallback
//! order: tag → filename heuristic → raw file stem.

use crate::analysis::key::camelot::{key_name_to_camelot, parse_camelot, CHROMA_MAJOR};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

static BPM_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:[.,]\d+)?)").expect("static regex"));

static KEY_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*([a-g])\s*([#b♯♭]?)\s*(major|maj|minor|min|m)?\s*$").expect("static regex")
});

/// Parsed title/artist from a file name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilenameMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
}

/// Reconciled display and musical fields for a track
#[derive(Debug, Clone, Default)]
pub struct ReconciledMetadata {
    pub title: String,
    pub artist: String,
    /// BPM from tags, 0.0 when absent or unparsable
    pub bpm: f64,
    /// Camelot key from tags, "" when absent or unparsable
    pub musical_key: String,
}

/// Parse a free-text BPM tag into a usable value
///
/// Accepts decimal commas and points and trailing units. Values above 260 are
/// halved until they land in range (double-time tags); anything that still
/// falls outside [40, 260] is rejected as 0.
pub fn parse_bpm_tag(raw: &str) -> f64 {
    let Some(captures) = BPM_TOKEN.captures(raw) else {
        return 0.0;
    };

    let token = captures[1].replace(',', ".");
    let Ok(mut value) = token.parse::<f64>() else {
        return 0.0;
    };

    if !value.is_finite() || value <= 0.0 {
        return 0.0;
    }

    while value > 260.0 {
        value /= 2.0;
    }

    if !(40.0..=260.0).contains(&value) {
        return 0.0;
    }

    value
}

/// Parse a free-text key tag into Camelot notation
///
/// Tries, in order: exact Camelot notation, a case/space-insensitive lookup
/// against the 24 canonical key names, and finally a
/// `<letter>[accidental][mode]` pattern with enharmonic alias resolution.
/// Unparsable input yields "".
pub fn parse_key_tag_to_camelot(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    // Already Camelot?
    if let Some((number, letter)) = parse_camelot(trimmed) {
        return format!("{}{}", number, letter);
    }

    // Canonical key name, ignoring case and spacing ("f# minor", "F#minor")
    let folded = trimmed.to_lowercase().split_whitespace().collect::<String>();
    for name in canonical_key_names() {
        if name.to_lowercase().split_whitespace().collect::<String>() == folded {
            return key_name_to_camelot(&name);
        }
    }

    // Loose pitch + accidental + mode ("Am", "Bb", "c# min")
    let Some(captures) = KEY_TOKEN.captures(trimmed) else {
        return String::new();
    };

    let letter = captures[1].to_uppercase();
    let accidental = captures.get(2).map(|m| m.as_str()).unwrap_or("");
    let mode_token = captures.get(3).map(|m| m.as_str().to_lowercase());

    let pitch = resolve_pitch_alias(&letter, accidental);
    let mode = match mode_token.as_deref() {
        Some("minor") | Some("min") | Some("m") => "minor",
        _ => "major",
    };

    let code = key_name_to_camelot(&format!("{} {}", pitch, mode));
    if code.is_empty() {
        debug!("Unresolvable key tag: {:?}", raw);
    }
    code
}

/// All 24 canonical key names from the reference table
fn canonical_key_names() -> Vec<String> {
    let mut names: Vec<String> = CHROMA_MAJOR
        .iter()
        .map(|major| major.to_string())
        .collect();
    names.extend(
        CHROMA_MAJOR
            .iter()
            .map(|major| major.replace("major", "minor")),
    );
    names
}

/// Resolve enharmonic spellings to the spelling used in the reference table
fn resolve_pitch_alias(letter: &str, accidental: &str) -> String {
    let sharp = matches!(accidental, "#" | "♯");
    let flat = matches!(accidental, "b" | "♭");

    match (letter, sharp, flat) {
        ("A", true, _) => "Bb".to_string(),
        ("B", _, true) => "Bb".to_string(),
        ("B", true, _) => "C".to_string(),
        ("C", _, true) => "B".to_string(),
        ("C", true, _) => "C#".to_string(),
        ("D", _, true) => "Db".to_string(),
        ("D", true, _) => "Eb".to_string(),
        ("E", _, true) => "Eb".to_string(),
        ("E", true, _) => "F".to_string(),
        ("F", _, true) => "E".to_string(),
        ("F", true, _) => "F#".to_string(),
        ("G", _, true) => "Gb".to_string(),
        ("G", true, _) => "Ab".to_string(),
        ("A", _, true) => "Ab".to_string(),
        _ => letter.to_string(),
    }
}

/// Split an "Artist - Title" file name into its parts
///
/// Falls back to the whole stem as the title when the pattern is absent.
pub fn parse_filename_metadata(path: &Path) -> FilenameMetadata {
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return FilenameMetadata::default();
    };

    if let Some((artist, title)) = stem.split_once(" - ") {
        let artist = artist.trim();
        let title = title.trim();
        if !artist.is_empty() && !title.is_empty() {
            return FilenameMetadata {
                title: Some(title.to_string()),
                artist: Some(artist.to_string()),
            };
        }
    }

    FilenameMetadata {
        title: Some(stem.to_string()),
        artist: None,
    }
}

/// Merge tag and filename metadata with the deterministic fallback order
pub fn reconcile(tags: &crate::types::RawTags, path: &Path) -> ReconciledMetadata {
    let from_filename = parse_filename_metadata(path);

    let tag_field = |value: &Option<String>| -> Option<String> {
        value
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
    };

    let title = tag_field(&tags.title)
        .or(from_filename.title)
        .or_else(|| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .map(|s| s.to_string())
        })
        .unwrap_or_default();

    let artist = tag_field(&tags.artist)
        .or(from_filename.artist)
        .unwrap_or_default();

    let bpm = tags.bpm.as_deref().map(parse_bpm_tag).unwrap_or(0.0);
    let musical_key = tags
        .key
        .as_deref()
        .map(parse_key_tag_to_camelot)
        .unwrap_or_default();

    ReconciledMetadata {
        title,
        artist,
        bpm,
        musical_key,
    }
}
