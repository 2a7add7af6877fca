//! Musical key estimation
//!
//! Template matching against the Krumhansl-Kessler tonal hierarchy profiles:
//! the track's average chroma is correlated with all 24 rotated major/minor
//! profiles and the best match wins. Harmonic separation, tuning correction
//! and quiet-frame masking clean the chroma up front.

pub mod camelot;
pub mod chroma;

use crate::analysis::dsp::features::{pearson, quantile, rms_frames};
use crate::analysis::dsp::{hpss, magnitude_stft, DEFAULT_HOP, DEFAULT_N_FFT};
use camelot::{key_name_to_camelot, CHROMA_MAJOR, CHROMA_MINOR};
use tracing::debug;

/// Krumhansl-Kessler major key profile, indexed from the tonic
const KK_MAJOR: [f32; 12] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];

/// Krumhansl-Kessler minor key profile, indexed from the tonic
const KK_MINOR: [f32; 12] = [
    6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17,
];

/// Blend weights for the two chroma representations
const FILTERBANK_WEIGHT: f32 = 0.7;
const BIN_MAP_WEIGHT: f32 = 0.3;

/// Fraction of the quietest frames excluded from the chroma average
const QUIET_FRAME_FRACTION: f32 = 0.3;

/// Estimate the musical key of a mono signal as a Camelot code
///
/// Returns "" when the signal is silent or too short to produce a stable
/// chroma estimate.
pub fn detect_key(samples: &[f32], sample_rate: u32) -> String {
    let spec = magnitude_stft(samples, sample_rate, DEFAULT_N_FFT, DEFAULT_HOP);
    if spec.num_frames() == 0 {
        return String::new();
    }

    // Tonal content lives in the harmonic layer; fall back to the raw
    // spectrogram when separation degenerates on near-silent input
    let (harmonic, _) = hpss::separate(&spec);
    let tonal = if hpss::is_silent(&harmonic) { &spec } else { &harmonic };

    let tuning = chroma::estimate_tuning_offset(tonal);

    let filterbank = chroma::chroma_filterbank(tonal, tuning);
    let bin_map = chroma::chroma_bin_map(tonal, tuning);

    let mut blended: Vec<[f32; 12]> = filterbank
        .iter()
        .zip(bin_map.iter())
        .map(|(fb, bm)| {
            let mut frame = [0.0f32; 12];
            for i in 0..12 {
                frame[i] = FILTERBANK_WEIGHT * fb[i] + BIN_MAP_WEIGHT * bm[i];
            }
            frame
        })
        .collect();
    chroma::normalize_frames(&mut blended);

    let rms = rms_frames(samples, DEFAULT_N_FFT, DEFAULT_HOP);
    let mean_chroma = match average_loud_frames(&blended, &rms) {
        Some(chroma) => chroma,
        None => return String::new(),
    };

    let Some((root, is_major)) = best_profile_match(&mean_chroma) else {
        return String::new();
    };

    let key_name = if is_major {
        CHROMA_MAJOR[root]
    } else {
        CHROMA_MINOR[root]
    };
    debug!("Detected key: {} (tuning {:+.2})", key_name, tuning);
    key_name_to_camelot(key_name)
}

/// Average chroma over the louder frames, normalized to sum 1
///
/// The quietest 30% of frames (by RMS) are masked out unless that would
/// leave nothing; silent or degenerate input yields None.
fn average_loud_frames(frames: &[[f32; 12]], rms: &[f32]) -> Option<[f32; 12]> {
    if frames.is_empty() {
        return None;
    }

    let threshold = quantile(rms, QUIET_FRAME_FRACTION);
    let mut selected: Vec<usize> = (0..frames.len())
        .filter(|&i| rms.get(i).copied().unwrap_or(0.0) >= threshold)
        .collect();
    if selected.is_empty() {
        selected = (0..frames.len()).collect();
    }

    let mut mean = [0.0f32; 12];
    for &i in &selected {
        for (acc, v) in mean.iter_mut().zip(frames[i].iter()) {
            *acc += v;
        }
    }

    let total: f32 = mean.iter().sum();
    if total <= f32::EPSILON {
        return None;
    }
    for v in mean.iter_mut() {
        *v /= total;
    }
    Some(mean)
}

/// Find the (root, is_major) profile with the highest Pearson correlation
///
/// Rotating the chroma so index 0 is the candidate root aligns it with the
/// tonic-indexed profiles. Even when every correlation is non-positive the
/// least-negative pair still wins; silence is rejected before this point.
fn best_profile_match(mean_chroma: &[f32; 12]) -> Option<(usize, bool)> {
    let mut best: Option<(f32, usize, bool)> = None;

    for root in 0..12 {
        let mut rotated = [0.0f32; 12];
        for (j, slot) in rotated.iter_mut().enumerate() {
            *slot = mean_chroma[(j + root) % 12];
        }

        for (is_major, profile) in [(true, &KK_MAJOR), (false, &KK_MINOR)] {
            let score = pearson(&rotated, profile.as_slice());
            if best.map_or(true, |(s, _, _)| score > s) {
                best = Some((score, root, is_major));
            }
        }
    }

    best.map(|(_, root, is_major)| (root, is_major))
}
