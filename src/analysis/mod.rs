//! Track analysis pipeline
//!
//! `analyze` is the single entry point: it reconciles metadata, selects the
//! analysis window and runs the tempo, key, energy and preview estimators
//! over it, producing one [`TrackAttributes`] record. The function has no
//! shared mutable state, so callers are free to fan it out across threads.

pub mod dsp;
pub mod energy;
pub mod key;
pub mod metadata;
pub mod preview;
pub mod review;
pub mod tempo;
pub mod window;

use crate::types::{AudioBuffer, RawTags, TrackAttributes, ANALYSIS_VERSION};
use std::path::Path;
use tracing::debug;

/// Everything the analyzer needs for one track
///
/// The caller owns decoding and hashing; audio arrives mono and normalized
/// at a fixed working rate.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub file_path: String,
    pub file_hash: String,
    pub audio: AudioBuffer,
    /// Full track duration in seconds, preferably from container metadata
    /// (the decoded audio may cover less)
    pub duration: f64,
    pub tags: RawTags,
}

/// Analyze one track into a complete attribute record
///
/// Tag-derived BPM and key take precedence when they parse; the signal
/// estimators only run for fields the tags leave unknown.
pub fn analyze(request: &AnalysisRequest) -> TrackAttributes {
    let meta = metadata::reconcile(&request.tags, Path::new(&request.file_path));
    let sample_rate = request.audio.sample_rate;

    let selected = window::select_window(request.duration);
    let windowed = window::apply_window(&request.audio.samples, sample_rate, &selected);

    let bpm = if meta.bpm > 0.0 {
        debug!("Using tagged BPM {:.1} for {}", meta.bpm, request.file_path);
        tempo::normalize_bpm(meta.bpm)
    } else {
        tempo::detect_bpm(windowed, sample_rate)
    };

    let musical_key = if meta.musical_key.is_empty() {
        key::detect_key(windowed, sample_rate)
    } else {
        debug!(
            "Using tagged key {} for {}",
            meta.musical_key, request.file_path
        );
        meta.musical_key.clone()
    };

    let (energy_level, energy_confidence) =
        energy::detect_energy_with_confidence(windowed, sample_rate);

    let preview_start = preview::detect_preview_start(
        windowed,
        sample_rate,
        request.duration,
        selected.offset,
        preview::DEFAULT_PREVIEW_SECS,
    );

    let (needs_review, review_notes) = review::classify_review_flags(
        &meta.title,
        &meta.artist,
        bpm,
        &musical_key,
        energy_level,
        energy_confidence,
        request.duration,
    );

    TrackAttributes {
        file_path: request.file_path.clone(),
        file_hash: request.file_hash.clone(),
        title: meta.title,
        artist: meta.artist,
        bpm,
        musical_key,
        energy_level,
        energy_confidence,
        duration: request.duration,
        preview_start,
        needs_review,
        review_notes,
        has_overrides: false,
        analysis_version: ANALYSIS_VERSION,
    }
}
