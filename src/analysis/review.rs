//! Review classification
//!
//! Flags tracks whose analysis results look unreliable or incomplete so a
//! human can double-check them before they reach a performance library.

use tracing::debug;

/// Confidence below this marks the energy estimate as unreliable
const MIN_ENERGY_CONFIDENCE: f64 = 0.55;

/// Energy at or beyond these bounds is suspicious for real program material
const ENERGY_FLOOR: f64 = 0.03;
const ENERGY_CEILING: f64 = 0.97;

/// Tracks shorter than this are usually stings or broken rips
const MIN_DURATION_SECS: f64 = 45.0;

/// Decide whether a track needs manual review and why
///
/// Returns the flag plus the accumulated reasons joined with `" | "`.
pub fn classify_review_flags(
    title: &str,
    artist: &str,
    bpm: f64,
    musical_key: &str,
    energy_level: f64,
    energy_confidence: f64,
    duration: f64,
) -> (bool, String) {
    let mut reasons: Vec<&str> = Vec::new();

    if energy_confidence < MIN_ENERGY_CONFIDENCE {
        reasons.push("Low energy confidence");
    }
    if energy_level <= ENERGY_FLOOR {
        reasons.push("Energy suspiciously low");
    } else if energy_level >= ENERGY_CEILING {
        reasons.push("Energy suspiciously high");
    }
    if duration < MIN_DURATION_SECS {
        reasons.push("Very short track");
    }
    if title.trim().is_empty() {
        reasons.push("Missing title");
    }
    if artist.trim().is_empty() {
        reasons.push("Missing artist");
    }
    if bpm <= 0.0 {
        reasons.push("Missing BPM");
    }
    if musical_key.trim().is_empty() {
        reasons.push("Missing key");
    }

    if reasons.is_empty() {
        (false, String::new())
    } else {
        let notes = reasons.join(" | ");
        debug!("Track flagged for review: {}", notes);
        (true, notes)
    }
}
