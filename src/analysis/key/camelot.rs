//! Camelot Wheel mapping and harmonic compatibility
//!
//! The Camelot Wheel is a visual representation of musical keys that makes
//! harmonic mixing intuitive for DJs.
//!
//! - Numbers 1-12 represent positions on the wheel
//! - 'A' suffix = minor key, 'B' suffix = major key
//! - Adjacent numbers are harmonically compatible (perfect fifth)
//! - Same number, different letter = relative major/minor

use std::collections::HashMap;
use std::sync::LazyLock;

/// Key name → Camelot code, covering all 24 keys plus enharmonic spellings
pub static KEY_TO_CAMELOT: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        // Major keys
        ("C major", "8B"),
        ("G major", "9B"),
        ("D major", "10B"),
        ("A major", "11B"),
        ("E major", "12B"),
        ("B major", "1B"),
        ("F# major", "2B"),
        ("Gb major", "2B"),
        ("Db major", "3B"),
        ("C# major", "3B"),
        ("Ab major", "4B"),
        ("Eb major", "5B"),
        ("Bb major", "6B"),
        ("F major", "7B"),
        // Minor keys
        ("C minor", "5A"),
        ("G minor", "6A"),
        ("D minor", "7A"),
        ("A minor", "8A"),
        ("E minor", "9A"),
        ("B minor", "10A"),
        ("F# minor", "11A"),
        ("Gb minor", "11A"),
        ("Db minor", "12A"),
        ("C# minor", "12A"),
        ("Ab minor", "1A"),
        ("Eb minor", "2A"),
        ("Bb minor", "3A"),
        ("F minor", "4A"),
    ])
});

/// Camelot code → canonical key name (first spelling wins for enharmonics)
pub static CAMELOT_TO_KEY: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    for (name, code) in CHROMA_MAJOR.iter().zip(MAJOR_CODES.iter()) {
        map.entry(*code).or_insert(*name);
    }
    for (name, code) in CHROMA_MINOR.iter().zip(MINOR_CODES.iter()) {
        map.entry(*code).or_insert(*name);
    }
    map
});

/// Chromagram index (0 = C, 1 = C#, ...) → major key name
pub const CHROMA_MAJOR: [&str; 12] = [
    "C major", "C# major", "D major", "Eb major", "E major", "F major", "F# major", "G major",
    "Ab major", "A major", "Bb major", "B major",
];

/// Chromagram index (0 = C, 1 = C#, ...) → minor key name
pub const CHROMA_MINOR: [&str; 12] = [
    "C minor", "C# minor", "D minor", "Eb minor", "E minor", "F minor", "F# minor", "G minor",
    "Ab minor", "A minor", "Bb minor", "B minor",
];

const MAJOR_CODES: [&str; 12] = [
    "8B", "3B", "10B", "5B", "12B", "7B", "2B", "9B", "4B", "11B", "6B", "1B",
];
const MINOR_CODES: [&str; 12] = [
    "5A", "12A", "7A", "2A", "9A", "4A", "11A", "6A", "1A", "8A", "3A", "10A",
];

/// Convert a key name like "A minor" to Camelot notation like "8A"
///
/// Returns "" for names outside the 24-key reference table.
pub fn key_name_to_camelot(key_name: &str) -> String {
    KEY_TO_CAMELOT
        .get(key_name)
        .map(|code| code.to_string())
        .unwrap_or_default()
}

/// Convert a Camelot code back to its canonical key name
pub fn camelot_to_key_name(camelot: &str) -> String {
    match parse_camelot(camelot) {
        Some((number, letter)) => CAMELOT_TO_KEY
            .get(format!("{}{}", number, letter).as_str())
            .map(|name| name.to_string())
            .unwrap_or_default(),
        None => String::new(),
    }
}

/// Parse "8A" into (8, 'A'); None for anything outside 1-12 + A/B
pub fn parse_camelot(camelot: &str) -> Option<(u8, char)> {
    let trimmed = camelot.trim().to_uppercase();
    if trimmed.len() < 2 {
        return None;
    }
    let letter = trimmed.chars().last()?;
    if letter != 'A' && letter != 'B' {
        return None;
    }
    let number: u8 = trimmed[..trimmed.len() - 1].parse().ok()?;
    if !(1..=12).contains(&number) {
        return None;
    }
    Some((number, letter))
}

/// Get harmonically compatible keys (for mixing suggestions)
///
/// Returns keys that are safe to mix with the given key:
/// - Same key
/// - +1/-1 on the wheel (perfect fifth relationship, wrapping 12 ↔ 1)
/// - Same number, opposite letter (relative major/minor)
pub fn compatible_keys(camelot: &str) -> Vec<String> {
    let Some((number, letter)) = parse_camelot(camelot) else {
        return vec![];
    };

    let up = (number % 12) + 1;
    let down = ((number + 10) % 12) + 1;
    let relative = if letter == 'A' { 'B' } else { 'A' };

    vec![
        format!("{}{}", number, letter),
        format!("{}{}", up, letter),
        format!("{}{}", down, letter),
        format!("{}{}", number, relative),
    ]
}

/// Score how compatible two Camelot keys are, 0.0 - 1.0
///
/// 1.0 = same key, 0.8 = adjacent or relative major/minor, 0.5 = two wheel
/// steps at the same letter or either key unknown, 0.2 = everything else.
pub fn key_compatibility_score(key_a: &str, key_b: &str) -> f64 {
    if key_a.is_empty() || key_b.is_empty() {
        return 0.5;
    }

    let (Some((num_a, let_a)), Some((num_b, let_b))) = (parse_camelot(key_a), parse_camelot(key_b))
    else {
        return 0.5;
    };

    if num_a == num_b && let_a == let_b {
        return 1.0;
    }

    let normalized_b = format!("{}{}", num_b, let_b);
    if compatible_keys(key_a).contains(&normalized_b) {
        return 0.8;
    }

    let raw = (num_a as i32 - num_b as i32).abs();
    let wheel_distance = raw.min(12 - raw);
    if wheel_distance == 2 && let_a == let_b {
        return 0.5;
    }

    0.2
}
