//! Core data types for deepcrate
//!
//! These types represent the domain model and flow through the analysis
//! pipeline. `TrackAttributes` is the unit of output; it is an immutable
//! value and "edits" (manual overrides) produce a new record.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Version stamped into every record by the producing pipeline.
///
/// Callers compare this against stored records to detect results produced by
/// an older pipeline that should be recomputed.
pub const ANALYSIS_VERSION: i32 = 3;

// =============================================================================
// Raw inputs
// =============================================================================

/// Raw tag strings assembled by the caller from container/ID3 reads.
///
/// All fields are free text exactly as found in the file; the metadata
/// reconciler normalizes them. Missing tags are simply `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub bpm: Option<String>,
    pub key: Option<String>,
}

/// Decoded audio samples ready for analysis
///
/// Mono, normalized to [-1.0, 1.0], at a fixed low sample rate chosen by the
/// decoding collaborator (22050 Hz in practice).
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Duration in seconds
    pub duration: f64,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        // Guard against division by zero for an invalid sample rate
        let duration = if sample_rate > 0 {
            samples.len() as f64 / sample_rate as f64
        } else {
            0.0
        };
        Self {
            samples,
            sample_rate,
            duration,
        }
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

// =============================================================================
// Attribute record
// =============================================================================

/// Complete analysis result for a single track
///
/// BPM of 0 and an empty key string mean "unknown". Energy and confidence are
/// always clamped to [0, 1]; confidence measures estimate reliability, not
/// loudness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackAttributes {
    /// Original file path
    pub file_path: String,
    /// Content hash for change detection
    pub file_hash: String,
    pub title: String,
    pub artist: String,
    /// Tempo in BPM (0.0 = unknown)
    pub bpm: f64,
    /// Camelot notation, e.g. "8A" ("" = unknown)
    pub musical_key: String,
    /// Perceived energy, 0.0 - 1.0
    pub energy_level: f64,
    /// Reliability of the energy/overall estimate, 0.0 - 1.0
    pub energy_confidence: f64,
    /// Duration in seconds
    pub duration: f64,
    /// Suggested preview start offset in seconds
    pub preview_start: f64,
    /// Flag for manual attention
    pub needs_review: bool,
    /// Review reasons joined with " | "
    pub review_notes: String,
    /// True when manual corrections have been applied over signal values
    pub has_overrides: bool,
    pub analysis_version: i32,
}

impl Default for TrackAttributes {
    fn default() -> Self {
        Self {
            file_path: String::new(),
            file_hash: String::new(),
            title: String::new(),
            artist: String::new(),
            bpm: 0.0,
            musical_key: String::new(),
            energy_level: 0.0,
            energy_confidence: 1.0,
            duration: 0.0,
            preview_start: 0.0,
            needs_review: false,
            review_notes: String::new(),
            has_overrides: false,
            analysis_version: ANALYSIS_VERSION,
        }
    }
}

impl TrackAttributes {
    /// "Artist - Title" display string, falling back to the title and finally
    /// the file stem.
    pub fn display_name(&self) -> String {
        if !self.artist.is_empty() && !self.title.is_empty() {
            return format!("{} - {}", self.artist, self.title);
        }
        if !self.title.is_empty() {
            return self.title.clone();
        }
        Path::new(&self.file_path)
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    /// Individual review reasons parsed out of `review_notes`
    pub fn review_reasons(&self) -> Vec<String> {
        self.review_notes
            .split('|')
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .map(|part| part.to_string())
            .collect()
    }

    /// Apply manual corrections, producing a new record.
    ///
    /// Fields left as `None` keep their signal-derived values. The returned
    /// record carries `has_overrides = true` so callers can tell corrected
    /// values from analyzer output.
    pub fn with_overrides(
        &self,
        bpm: Option<f64>,
        musical_key: Option<&str>,
        energy_level: Option<f64>,
    ) -> Self {
        let mut next = self.clone();
        if let Some(bpm) = bpm {
            next.bpm = bpm;
        }
        if let Some(key) = musical_key {
            next.musical_key = key.trim().to_uppercase();
        }
        if let Some(energy) = energy_level {
            next.energy_level = energy.clamp(0.0, 1.0);
        }
        next.has_overrides = true;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_fallback_order() {
        let mut track = TrackAttributes {
            file_path: "/music/Some_File.mp3".to_string(),
            ..Default::default()
        };
        assert_eq!(track.display_name(), "Some_File");

        track.title = "Even If".to_string();
        assert_eq!(track.display_name(), "Even If");

        track.artist = "Calibre".to_string();
        assert_eq!(track.display_name(), "Calibre - Even If");
    }

    #[test]
    fn test_review_reasons_split() {
        let track = TrackAttributes {
            review_notes: "Low energy confidence | Missing artist".to_string(),
            ..Default::default()
        };
        assert_eq!(
            track.review_reasons(),
            vec!["Low energy confidence", "Missing artist"]
        );

        let clean = TrackAttributes::default();
        assert!(clean.review_reasons().is_empty());
    }

    #[test]
    fn test_with_overrides_is_copy_not_mutation() {
        let original = TrackAttributes {
            bpm: 128.0,
            musical_key: "9A".to_string(),
            ..Default::default()
        };

        let corrected = original.with_overrides(Some(174.0), Some("8a"), None);

        assert_eq!(original.bpm, 128.0);
        assert!(!original.has_overrides);
        assert_eq!(corrected.bpm, 174.0);
        assert_eq!(corrected.musical_key, "8A");
        assert!(corrected.has_overrides);
    }

    #[test]
    fn test_audio_buffer_duration() {
        let buffer = AudioBuffer::new(vec![0.0; 44100], 22050);
        assert!((buffer.duration - 2.0).abs() < 1e-9);

        let invalid = AudioBuffer::new(vec![0.0; 100], 0);
        assert_eq!(invalid.duration, 0.0);
    }

    #[test]
    fn test_record_serde_round_trip() {
        let track = TrackAttributes {
            file_path: "/music/test.mp3".to_string(),
            file_hash: "abc123".to_string(),
            title: "Test".to_string(),
            bpm: 174.0,
            musical_key: "8A".to_string(),
            energy_level: 0.72,
            energy_confidence: 0.88,
            duration: 240.0,
            ..Default::default()
        };

        let json = serde_json::to_string(&track).unwrap();
        let back: TrackAttributes = serde_json::from_str(&json).unwrap();
        assert_eq!(back.bpm, 174.0);
        assert_eq!(back.musical_key, "8A");
        assert_eq!(back.analysis_version, ANALYSIS_VERSION);
    }
}
