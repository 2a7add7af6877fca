//! Preview cue selection
//!
//! Picks where a short preview clip should start: the most salient moment of
//! the analysis window, pulled back a few seconds so the listener hears the
//! build into it rather than landing mid-impact.

use crate::analysis::dsp::features::{normalize_peak, rms_frames};
use crate::analysis::dsp::{magnitude_stft, DEFAULT_HOP, DEFAULT_N_FFT};
use crate::analysis::tempo::onset::onset_strength;
use tracing::debug;

/// Default preview clip length in seconds
pub const DEFAULT_PREVIEW_SECS: f64 = 30.0;

/// Seconds of lead-in kept before the salient moment
const LEAD_IN_SECS: f64 = 4.0;

/// Onset vs loudness weighting in the saliency curve
const ONSET_WEIGHT: f32 = 0.65;
const RMS_WEIGHT: f32 = 0.35;

/// Pick the preview start time in seconds for a track
///
/// `samples` is the windowed analysis slice, `window_offset` its absolute
/// start within the track, and `duration` the full track length. Tracks
/// barely longer than the preview itself start at 0.
pub fn detect_preview_start(
    samples: &[f32],
    sample_rate: u32,
    duration: f64,
    window_offset: f64,
    preview_secs: f64,
) -> f64 {
    if duration <= preview_secs + 5.0 || samples.is_empty() || sample_rate == 0 {
        return 0.0;
    }

    let window_secs = samples.len() as f64 / sample_rate as f64;
    let search_end = window_secs - preview_secs;
    if search_end <= 0.0 {
        // Window itself is shorter than a preview; anchor at its start
        return clamp_start(window_offset, duration, preview_secs, window_offset);
    }
    let search_start = search_end.min(8.0);

    let spec = magnitude_stft(samples, sample_rate, DEFAULT_N_FFT, DEFAULT_HOP);
    let onset = normalize_peak(&onset_strength(&spec));
    let rms = normalize_peak(&rms_frames(samples, DEFAULT_N_FFT, DEFAULT_HOP));

    let saliency: Vec<f32> = onset
        .iter()
        .zip(rms.iter())
        .map(|(&o, &r)| ONSET_WEIGHT * o + RMS_WEIGHT * r)
        .collect();

    let frame_rate = spec.frame_rate() as f64;
    let first = (search_start * frame_rate) as usize;
    let last = ((search_end * frame_rate) as usize).min(saliency.len());

    let peak_secs = if first < last {
        let peak_frame = (first..last)
            .max_by(|&a, &b| {
                saliency[a]
                    .partial_cmp(&saliency[b])
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(first);
        peak_frame as f64 / frame_rate
    } else {
        search_start
    };

    // Back off so the preview leads into the peak, not out of it
    let window_relative = (peak_secs - LEAD_IN_SECS).max(0.0);
    let start = clamp_start(
        window_offset + window_relative,
        duration,
        preview_secs,
        window_offset,
    );

    debug!(
        "Preview start {:.1}s (peak at {:.1}s in window at {:.1}s)",
        start, peak_secs, window_offset
    );
    start
}

/// Keep the start inside the track with room for a full preview, and never
/// before the analysis window begins
fn clamp_start(start: f64, duration: f64, preview_secs: f64, window_offset: f64) -> f64 {
    let latest = (duration - preview_secs).max(0.0);
    start.max(window_offset.min(latest)).clamp(0.0, latest)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Quiet signal with one loud burst at the given second
    fn signal_with_burst(sr: u32, secs: usize, burst_at: usize) -> Vec<f32> {
        let mut samples = vec![0.01f32; sr as usize * secs];
        let start = sr as usize * burst_at;
        let end = (start + sr as usize * 4).min(samples.len());
        for (i, s) in samples[start..end].iter_mut().enumerate() {
            // Broadband-ish burst so onset flux responds
            *s = 0.8 * if i % 7 < 3 { 1.0 } else { -1.0 };
        }
        samples
    }

    #[test]
    fn test_short_track_previews_from_zero() {
        let samples = vec![0.5f32; 22050 * 20];
        let start = detect_preview_start(&samples, 22050, 20.0, 0.0, 30.0);
        assert_eq!(start, 0.0);

        let start = detect_preview_start(&samples, 22050, 34.0, 0.0, 30.0);
        assert_eq!(start, 0.0);
    }

    #[test]
    fn test_preview_leaves_room_for_full_clip() {
        let samples = signal_with_burst(22050, 90, 50);
        let start = detect_preview_start(&samples, 22050, 90.0, 0.0, 30.0);
        assert!(start >= 0.0);
        assert!(start + 30.0 <= 90.0 + 1e-9);
    }

    #[test]
    fn test_preview_tracks_the_loud_section() {
        let samples = signal_with_burst(22050, 90, 40);
        let start = detect_preview_start(&samples, 22050, 90.0, 0.0, 30.0);
        // Burst at 40s, minus the 4s lead-in
        assert!(
            (30.0..=42.0).contains(&start),
            "expected start near 36s, got {}",
            start
        );
    }

    #[test]
    fn test_preview_respects_window_offset() {
        let samples = signal_with_burst(22050, 60, 20);
        let start = detect_preview_start(&samples, 22050, 300.0, 100.0, 30.0);
        assert!(start >= 100.0);
        assert!(start + 30.0 <= 300.0 + 1e-9);
    }

    #[test]
    fn test_empty_input_is_zero() {
        assert_eq!(detect_preview_start(&[], 22050, 200.0, 0.0, 30.0), 0.0);
    }
}
