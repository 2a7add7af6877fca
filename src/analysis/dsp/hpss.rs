//! Harmonic/percussive separation on magnitude spectrograms
//!
//! Median-filtering HPSS (Fitzgerald 2010): horizontal (time-direction)
//! medians enhance sustained harmonic content, vertical (frequency-direction)
//! medians enhance broadband percussive hits. A binary mask assigns each bin
//! to whichever enhanced spectrogram dominates.
//!
//! The tempo estimator consumes the percussive side, the key estimator the
//! harmonic side. Either caller falls back to the unseparated spectrogram
//! when its component comes out silent.

use super::stft::Spectrogram;

/// Median filter length across time frames (harmonic enhancement)
const TIME_KERNEL: usize = 17;

/// Median filter length across frequency bins (percussive enhancement)
const FREQ_KERNEL: usize = 17;

/// Split a magnitude spectrogram into harmonic and percussive components
pub fn separate(spec: &Spectrogram) -> (Spectrogram, Spectrogram) {
    let num_frames = spec.num_frames();
    let num_bins = spec.mags.first().map(|f| f.len()).unwrap_or(0);

    let mut harmonic = spec.clone();
    let mut percussive = spec.clone();

    if num_frames == 0 || num_bins == 0 {
        return (harmonic, percussive);
    }

    // Harmonic enhancement: median across time for each frequency bin
    let mut h_enhanced = vec![vec![0.0f32; num_bins]; num_frames];
    let half_t = TIME_KERNEL / 2;
    let mut column = vec![0.0f32; num_frames];
    for bin in 0..num_bins {
        for (t, frame) in spec.mags.iter().enumerate() {
            column[t] = frame[bin];
        }
        for t in 0..num_frames {
            let lo = t.saturating_sub(half_t);
            let hi = (t + half_t + 1).min(num_frames);
            h_enhanced[t][bin] = median_of(&column[lo..hi]);
        }
    }

    // Percussive enhancement: median across frequency for each frame
    let mut p_enhanced = vec![vec![0.0f32; num_bins]; num_frames];
    let half_f = FREQ_KERNEL / 2;
    for (t, frame) in spec.mags.iter().enumerate() {
        for bin in 0..num_bins {
            let lo = bin.saturating_sub(half_f);
            let hi = (bin + half_f + 1).min(num_bins);
            p_enhanced[t][bin] = median_of(&frame[lo..hi]);
        }
    }

    // Binary masking: each bin goes to the dominant component
    for t in 0..num_frames {
        for bin in 0..num_bins {
            if h_enhanced[t][bin] >= p_enhanced[t][bin] {
                percussive.mags[t][bin] = 0.0;
            } else {
                harmonic.mags[t][bin] = 0.0;
            }
        }
    }

    (harmonic, percussive)
}

/// True when a separated component retains effectively no energy
pub fn is_silent(spec: &Spectrogram) -> bool {
    let total: f32 = spec.mags.iter().flat_map(|f| f.iter()).sum();
    total <= 1e-6
}

fn median_of(window: &[f32]) -> f32 {
    let mut sorted = window.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    sorted[sorted.len() / 2]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::dsp::stft::magnitude_stft;

    #[test]
    fn test_sine_energy_lands_in_harmonic_component() {
        use std::f32::consts::PI;
        let sr = 22050u32;
        let samples: Vec<f32> = (0..sr as usize * 2)
            .map(|i| (2.0 * PI * 440.0 * i as f32 / sr as f32).sin())
            .collect();

        let spec = magnitude_stft(&samples, sr, 2048, 512);
        let (harmonic, percussive) = separate(&spec);

        let h_energy: f32 = harmonic.mags.iter().flat_map(|f| f.iter()).sum();
        let p_energy: f32 = percussive.mags.iter().flat_map(|f| f.iter()).sum();
        assert!(h_energy > p_energy);
    }

    #[test]
    fn test_click_energy_lands_in_percussive_component() {
        let sr = 22050u32;
        let mut samples = vec![0.0f32; sr as usize * 2];
        // Clicks every 0.25s
        for start in (0..samples.len()).step_by(sr as usize / 4) {
            for i in 0..64.min(samples.len() - start) {
                samples[start + i] = 0.9;
            }
        }

        let spec = magnitude_stft(&samples, sr, 2048, 512);
        let (harmonic, percussive) = separate(&spec);

        let h_energy: f32 = harmonic.mags.iter().flat_map(|f| f.iter()).sum();
        let p_energy: f32 = percussive.mags.iter().flat_map(|f| f.iter()).sum();
        assert!(p_energy > h_energy);
    }

    #[test]
    fn test_silence_detection() {
        let spec = magnitude_stft(&vec![0.0f32; 22050], 22050, 2048, 512);
        let (harmonic, percussive) = separate(&spec);
        assert!(is_silent(&harmonic));
        assert!(is_silent(&percussive));
    }
}
