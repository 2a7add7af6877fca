//! Chromagrams and tuning estimation
//!
//! A chroma vector folds spectral energy into the 12 pitch classes
//! (index 0 = C). Two complementary representations are computed: a
//! log-frequency triangular filterbank that behaves like a constant-Q
//! analysis, and a direct nearest-semitone mapping of STFT bins. Both are
//! corrected by an estimated tuning offset so tracks mastered off A440
//! still land on the right pitch classes.

use crate::analysis::dsp::Spectrogram;
use tracing::debug;

/// Lowest pitch considered (A0)
const MIN_PITCH_HZ: f32 = 27.5;

/// Highest pitch considered (C8)
const MAX_PITCH_HZ: f32 = 4186.0;

/// MIDI note range covered by the filterbank (C2 to C8)
const FILTERBANK_MIDI_LOW: i32 = 36;
const FILTERBANK_MIDI_HIGH: i32 = 108;

/// Histogram resolution for tuning estimation, in bins per semitone
const TUNING_BINS: usize = 100;

/// Fractional MIDI note number for a frequency in Hz
fn hz_to_midi(hz: f32) -> f32 {
    69.0 + 12.0 * (hz / 440.0).log2()
}

/// Center frequency of a (possibly fractional) MIDI note number
fn midi_to_hz(midi: f32) -> f32 {
    440.0 * ((midi - 69.0) / 12.0).exp2()
}

/// Estimate the global tuning offset of a spectrogram in fractional semitones
///
/// Spectral peaks are folded into a histogram of their deviation from the
/// equal-tempered grid; the densest histogram bin wins. Returns a value in
/// [-0.5, 0.5), or 0 when the signal carries too little tonal energy.
pub fn estimate_tuning_offset(spec: &Spectrogram) -> f32 {
    let mut histogram = [0.0f32; TUNING_BINS];
    let mut total_weight = 0.0f32;

    for frame in &spec.mags {
        let frame_peak = frame.iter().cloned().fold(0.0f32, f32::max);
        if frame_peak <= f32::EPSILON {
            continue;
        }
        let threshold = frame_peak * 0.1;

        // Local maxima above the per-frame threshold count as tonal peaks
        for bin in 1..frame.len().saturating_sub(1) {
            let mag = frame[bin];
            if mag < threshold || mag < frame[bin - 1] || mag < frame[bin + 1] {
                continue;
            }
            let freq = spec.bin_frequency(bin);
            if !(MIN_PITCH_HZ..=MAX_PITCH_HZ).contains(&freq) {
                continue;
            }

            let midi = hz_to_midi(freq);
            let residual = midi - midi.round();
            let slot = (((residual + 0.5) * TUNING_BINS as f32) as usize).min(TUNING_BINS - 1);
            histogram[slot] += mag;
            total_weight += mag;
        }
    }

    if total_weight <= f32::EPSILON {
        return 0.0;
    }

    let best = histogram
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(TUNING_BINS / 2);

    let offset = (best as f32 + 0.5) / TUNING_BINS as f32 - 0.5;
    debug!("Estimated tuning offset: {:+.3} semitones", offset);
    offset
}

/// Per-frame chroma via a triangular log-frequency filterbank
///
/// Each semitone from C2 to C8 gets a triangular response spanning its
/// neighbors, shifted by the tuning offset; responses accumulate into the
/// semitone's pitch class.
pub fn chroma_filterbank(spec: &Spectrogram, tuning_offset: f32) -> Vec<[f32; 12]> {
    let num_bins = spec.num_bins();

    // Precompute per-semitone bin weights once; they are frame-invariant
    let mut filters: Vec<(usize, Vec<(usize, f32)>)> = Vec::new();
    for midi in FILTERBANK_MIDI_LOW..=FILTERBANK_MIDI_HIGH {
        let center = midi_to_hz(midi as f32 + tuning_offset);
        let lower = midi_to_hz(midi as f32 + tuning_offset - 1.0);
        let upper = midi_to_hz(midi as f32 + tuning_offset + 1.0);

        let mut weights = Vec::new();
        for bin in 0..num_bins {
            let freq = spec.bin_frequency(bin);
            if freq <= lower || freq >= upper {
                continue;
            }
            let weight = if freq <= center {
                (freq - lower) / (center - lower)
            } else {
                (upper - freq) / (upper - center)
            };
            if weight > 0.0 {
                weights.push((bin, weight));
            }
        }
        if !weights.is_empty() {
            let class = (midi.rem_euclid(12)) as usize;
            filters.push((class, weights));
        }
    }

    spec.mags
        .iter()
        .map(|frame| {
            let mut chroma = [0.0f32; 12];
            for (class, weights) in &filters {
                let response: f32 = weights
                    .iter()
                    .map(|&(bin, w)| frame.get(bin).copied().unwrap_or(0.0) * w)
                    .sum();
                chroma[*class] += response;
            }
            chroma
        })
        .collect()
}

/// Per-frame chroma by mapping each STFT bin to its nearest semitone
///
/// Coarser than the filterbank below ~500 Hz but cheap and phase-robust;
/// energy is accumulated as magnitude squared so strong partials dominate.
pub fn chroma_bin_map(spec: &Spectrogram, tuning_offset: f32) -> Vec<[f32; 12]> {
    let num_bins = spec.num_bins();

    // Bin → pitch class lookup, shared across frames
    let classes: Vec<Option<usize>> = (0..num_bins)
        .map(|bin| {
            let freq = spec.bin_frequency(bin);
            if !(MIN_PITCH_HZ..=MAX_PITCH_HZ).contains(&freq) {
                return None;
            }
            let midi = (hz_to_midi(freq) - tuning_offset).round() as i32;
            Some(midi.rem_euclid(12) as usize)
        })
        .collect();

    spec.mags
        .iter()
        .map(|frame| {
            let mut chroma = [0.0f32; 12];
            for (bin, &mag) in frame.iter().enumerate() {
                if let Some(class) = classes.get(bin).copied().flatten() {
                    chroma[class] += mag * mag;
                }
            }
            chroma
        })
        .collect()
}

/// Normalize each frame's chroma by its own peak
///
/// Frames with no energy stay all-zero instead of turning into NaN.
pub fn normalize_frames(frames: &mut [[f32; 12]]) {
    for chroma in frames.iter_mut() {
        let peak = chroma.iter().cloned().fold(0.0f32, f32::max);
        if peak > f32::EPSILON {
            for v in chroma.iter_mut() {
                *v /= peak;
            }
        }
    }
}
