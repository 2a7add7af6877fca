//! Perceived energy and estimate confidence
//!
//! Energy blends average loudness (RMS) with average brightness (spectral
//! centroid) into a single 0-1 figure. The companion confidence score reports
//! how much the signal statistics support that figure: steady, consistently
//! loud material scores high, sparse or wildly varying material scores low.

use crate::analysis::dsp::features::{quantile, rms_frames, spectral_centroid_frames};
use crate::analysis::dsp::{magnitude_stft, DEFAULT_HOP, DEFAULT_N_FFT};
use tracing::debug;

/// RMS level treated as full loudness
const RMS_FULL_SCALE: f32 = 0.15;

/// Centroid in Hz treated as full brightness
const CENTROID_FULL_SCALE: f32 = 5000.0;

/// Frames below this fraction of the mean RMS count as silent
const SILENCE_RMS_FRACTION: f32 = 0.35;

/// Estimate perceived energy and the confidence of that estimate
///
/// Both values are in [0, 1], rounded to two decimals. Silent or empty input
/// yields (0, 0).
pub fn detect_energy_with_confidence(samples: &[f32], sample_rate: u32) -> (f64, f64) {
    let rms = rms_frames(samples, DEFAULT_N_FFT, DEFAULT_HOP);
    if rms.is_empty() {
        return (0.0, 0.0);
    }

    let mean_rms = rms.iter().sum::<f32>() / rms.len() as f32;
    if mean_rms <= 1e-6 {
        return (0.0, 0.0);
    }

    let spec = magnitude_stft(samples, sample_rate, DEFAULT_N_FFT, DEFAULT_HOP);
    let centroids = spectral_centroid_frames(&spec);
    let mean_centroid = if centroids.is_empty() {
        0.0
    } else {
        centroids.iter().sum::<f32>() / centroids.len() as f32
    };

    let loudness = (mean_rms / RMS_FULL_SCALE).clamp(0.0, 1.0);
    let brightness = (mean_centroid / CENTROID_FULL_SCALE).clamp(0.0, 1.0);
    let energy = (0.6 * loudness + 0.4 * brightness).clamp(0.0, 1.0);

    let confidence = estimate_confidence(&rms, &centroids, mean_rms, mean_centroid);
    debug!(
        "Energy {:.2} (loudness {:.2}, brightness {:.2}), confidence {:.2}",
        energy, loudness, brightness, confidence
    );

    (round2(energy as f64), round2(confidence as f64))
}

/// Score how well the frame statistics support the energy estimate
///
/// A base of 0.5 is raised by a compact RMS dynamic range and by low
/// variability of loudness and brightness, and lowered by the share of
/// near-silent frames.
fn estimate_confidence(rms: &[f32], centroids: &[f32], mean_rms: f32, mean_centroid: f32) -> f32 {
    // Inter-quantile dynamic range of loudness, relative to the median level
    let iqr = quantile(rms, 0.9) - quantile(rms, 0.1);
    let mid = quantile(rms, 0.5).max(1e-6);
    let iqr_score = 1.0 - (iqr / (mid * 2.0)).clamp(0.0, 1.0);

    let rms_cov = coefficient_of_variation(rms, mean_rms);
    let centroid_cov = coefficient_of_variation(centroids, mean_centroid);

    let silence_threshold = mean_rms * SILENCE_RMS_FRACTION;
    let silent_frames = rms.iter().filter(|&&v| v < silence_threshold).count();
    let silence_ratio = silent_frames as f32 / rms.len() as f32;

    let confidence = 0.5 + 0.2 * iqr_score + 0.15 * (1.0 - rms_cov.min(1.0))
        + 0.15 * (1.0 - centroid_cov.min(1.0))
        - 0.35 * silence_ratio;

    confidence.clamp(0.0, 1.0)
}

/// Standard deviation over mean; 0 for degenerate input
fn coefficient_of_variation(values: &[f32], mean: f32) -> f32 {
    if values.len() < 2 || mean <= 1e-6 {
        return 0.0;
    }
    let variance =
        values.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / values.len() as f32;
    variance.sqrt() / mean
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn tone(freq: f32, amp: f32, sr: u32, secs: f32) -> Vec<f32> {
        (0..(sr as f32 * secs) as usize)
            .map(|i| amp * (2.0 * PI * freq * i as f32 / sr as f32).sin())
            .collect()
    }

    #[test]
    fn test_silence_scores_zero() {
        assert_eq!(detect_energy_with_confidence(&vec![0.0f32; 44100], 22050), (0.0, 0.0));
        assert_eq!(detect_energy_with_confidence(&[], 22050), (0.0, 0.0));
    }

    #[test]
    fn test_louder_signal_scores_higher() {
        let quiet = tone(220.0, 0.05, 22050, 2.0);
        let loud = tone(220.0, 0.8, 22050, 2.0);
        let (e_quiet, _) = detect_energy_with_confidence(&quiet, 22050);
        let (e_loud, _) = detect_energy_with_confidence(&loud, 22050);
        assert!(e_loud > e_quiet);
    }

    #[test]
    fn test_scores_stay_in_bounds() {
        let signals = [
            tone(100.0, 1.0, 22050, 1.0),
            tone(8000.0, 1.0, 22050, 1.0),
            tone(440.0, 0.001, 22050, 1.0),
        ];
        for samples in &signals {
            let (energy, confidence) = detect_energy_with_confidence(samples, 22050);
            assert!((0.0..=1.0).contains(&energy));
            assert!((0.0..=1.0).contains(&confidence));
        }
    }

    #[test]
    fn test_steady_signal_more_confident_than_sparse() {
        let steady = tone(440.0, 0.5, 22050, 3.0);

        // Same tone but present only in short bursts
        let mut sparse = vec![0.0f32; steady.len()];
        for chunk_start in (0..sparse.len()).step_by(22050) {
            let end = (chunk_start + 2205).min(sparse.len());
            sparse[chunk_start..end].copy_from_slice(&steady[chunk_start..end]);
        }

        let (_, c_steady) = detect_energy_with_confidence(&steady, 22050);
        let (_, c_sparse) = detect_energy_with_confidence(&sparse, 22050);
        assert!(c_steady > c_sparse);
    }

    #[test]
    fn test_rounding_to_two_decimals() {
        let samples = tone(440.0, 0.3, 22050, 2.0);
        let (energy, confidence) = detect_energy_with_confidence(&samples, 22050);
        assert_eq!(energy, round2(energy));
        assert_eq!(confidence, round2(confidence));
    }
}
