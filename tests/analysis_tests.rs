//! End-to-end analysis tests over synthetic signals
//!
//! Builds small in-memory "tracks" (click patterns for rhythm, summed sines
//! for tonality) and checks the full `analyze` path produces coherent
//! records. Real-audio accuracy belongs to listening tests; these pin the
//! contract of the pipeline.

use deepcrate::{
    analyze, compatible_keys, content_hash, key_compatibility_score, parse_camelot,
    AnalysisRequest, AudioBuffer, RawTags, ANALYSIS_VERSION,
};
use std::f32::consts::PI;

const SR: u32 = 22050;

/// Click track at the given BPM with an A minor chord bed underneath
fn synthetic_track(bpm: f32, secs: usize) -> Vec<f32> {
    let mut samples = vec![0.0f32; SR as usize * secs];

    // Tonal bed: A2, C3, E3, A3
    for &note in &[45i32, 48, 52, 57] {
        let freq = 440.0 * ((note - 69) as f32 / 12.0).exp2();
        for (i, s) in samples.iter_mut().enumerate() {
            *s += 0.1 * (2.0 * PI * freq * i as f32 / SR as f32).sin();
        }
    }

    // Clicks on the beat
    let step = (60.0 / bpm * SR as f32) as usize;
    for start in (0..samples.len()).step_by(step) {
        let end = (start + 128).min(samples.len());
        for (i, s) in samples[start..end].iter_mut().enumerate() {
            *s += 0.8 * (-4.0 * i as f32 / 128.0).exp();
        }
    }

    samples
}

fn request(samples: Vec<f32>, tags: RawTags) -> AnalysisRequest {
    let audio = AudioBuffer::new(samples, SR);
    let duration = audio.duration;
    AnalysisRequest {
        file_path: "/music/Test Artist - Test Track.mp3".to_string(),
        file_hash: content_hash(b"synthetic"),
        audio,
        duration,
        tags,
    }
}

#[test]
fn analyze_produces_complete_record_for_rhythmic_track() {
    let result = analyze(&request(synthetic_track(128.0, 60), RawTags::default()));

    assert_eq!(result.analysis_version, ANALYSIS_VERSION);
    assert_eq!(result.artist, "Test Artist");
    assert_eq!(result.title, "Test Track");
    assert!(!result.file_hash.is_empty());

    // Tempo must land in the practical band, near 128 at some octave
    assert!((70.0..=190.0).contains(&result.bpm), "bpm {}", result.bpm);
    assert!((result.bpm - 128.0).abs() < 5.0, "bpm {}", result.bpm);

    // Key detection on tonal material must produce valid Camelot or nothing
    if !result.musical_key.is_empty() {
        assert!(parse_camelot(&result.musical_key).is_some());
    }

    assert!((0.0..=1.0).contains(&result.energy_level));
    assert!((0.0..=1.0).contains(&result.energy_confidence));
    assert!(result.energy_level > 0.0);

    // Preview must leave room for a 30s clip
    assert!(result.preview_start >= 0.0);
    assert!(result.preview_start + 30.0 <= result.duration + 1e-9);
}

#[test]
fn analyze_prefers_tagged_values_over_detection() {
    let tags = RawTags {
        title: Some("Tagged Title".to_string()),
        artist: Some("Tagged Artist".to_string()),
        bpm: Some("174.0".to_string()),
        key: Some("F# minor".to_string()),
    };
    let result = analyze(&request(synthetic_track(128.0, 30), tags));

    // The signal says 128, the tags say otherwise; tags win
    assert_eq!(result.bpm, 174.0);
    assert_eq!(result.musical_key, "11A");
    assert_eq!(result.title, "Tagged Title");
    assert_eq!(result.artist, "Tagged Artist");
}

#[test]
fn analyze_normalizes_out_of_band_tagged_bpm() {
    let tags = RawTags {
        bpm: Some("62".to_string()),
        ..Default::default()
    };
    let result = analyze(&request(synthetic_track(128.0, 30), tags));
    assert_eq!(result.bpm, 124.0);
}

#[test]
fn analyze_flags_silent_track_for_review() {
    let result = analyze(&request(vec![0.0f32; SR as usize * 60], RawTags::default()));

    assert_eq!(result.bpm, 0.0);
    assert_eq!(result.musical_key, "");
    assert_eq!(result.energy_level, 0.0);
    assert!(result.needs_review);

    let reasons = result.review_reasons();
    assert!(reasons.contains(&"Missing BPM".to_string()));
    assert!(reasons.contains(&"Missing key".to_string()));
}

#[test]
fn analyze_long_track_uses_windowed_analysis() {
    // 400s track: only the mid-track window is analyzed, preview stays valid
    let result = analyze(&request(synthetic_track(128.0, 400), RawTags::default()));

    assert!((result.bpm - 128.0).abs() < 5.0, "bpm {}", result.bpm);
    assert!(result.preview_start >= 0.0);
    assert!(result.preview_start + 30.0 <= 400.0 + 1e-9);
}

#[test]
fn analyze_is_deterministic() {
    let samples = synthetic_track(140.0, 45);
    let a = analyze(&request(samples.clone(), RawTags::default()));
    let b = analyze(&request(samples, RawTags::default()));

    assert_eq!(a.bpm, b.bpm);
    assert_eq!(a.musical_key, b.musical_key);
    assert_eq!(a.energy_level, b.energy_level);
    assert_eq!(a.preview_start, b.preview_start);
}

#[test]
fn overrides_produce_corrected_copy() {
    let original = analyze(&request(synthetic_track(128.0, 30), RawTags::default()));
    let corrected = original.with_overrides(Some(96.0), Some("3b"), Some(0.9));

    assert!(!original.has_overrides);
    assert!(corrected.has_overrides);
    assert_eq!(corrected.bpm, 96.0);
    assert_eq!(corrected.musical_key, "3B");
    assert_eq!(corrected.energy_level, 0.9);
}

#[test]
fn camelot_api_supports_harmonic_mixing() {
    let compatible = compatible_keys("8A");
    assert_eq!(compatible.len(), 4);
    for key in &compatible {
        assert!(key_compatibility_score("8A", key) >= 0.8);
    }
    assert!(key_compatibility_score("8A", "2B") < 0.5);
}

#[test]
fn content_hash_is_stable_fingerprint() {
    let bytes = b"audio-ish bytes".repeat(1000);
    let a = content_hash(&bytes);
    let b = content_hash(&bytes);
    assert_eq!(a, b);
    assert_eq!(a.len(), 32);
    assert_ne!(a, content_hash(b"different"));
}
