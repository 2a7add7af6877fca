//! Tempo estimation
//!
//! Single-estimator BPM detection fails in predictable ways: autocorrelation
//! locks onto half-time, tempograms smear over tempo drift, and beat tracking
//! gets confused by syncopation. This module runs several independent
//! candidate sources over one onset-strength envelope and fuses them with a
//! periodicity/agreement score, then corrects residual octave errors.
//!
//! Known trade-off: the final value is folded into the DJ-practical [70, 190]
//! band by octave halving/doubling, which misplaces genuinely slow ballads
//! (true 60 BPM) and 200+ BPM hardcore into the wrong octave. That is the
//! intended behavior for library management, not a detection bug.

pub mod onset;

use crate::analysis::dsp::features::{autocorrelate, median};
use crate::analysis::dsp::{hpss, magnitude_stft, DEFAULT_HOP, DEFAULT_N_FFT};
use onset::{is_degenerate, onset_strength};
use tracing::debug;

/// Candidates outside this band are discarded before scoring
const CANDIDATE_MIN_BPM: f32 = 60.0;
const CANDIDATE_MAX_BPM: f32 = 210.0;

/// Candidates closer than this are considered duplicates
const DEDUPE_TOLERANCE_BPM: f32 = 0.75;

/// Minimum onset frames required for any tempo estimate
const MIN_ENVELOPE_FRAMES: usize = 32;

/// Tempogram window (frames, ~9 s at the working frame rate) and stride
const TEMPOGRAM_WINDOW: usize = 384;
const TEMPOGRAM_STRIDE: usize = 64;

/// Relative trust placed in each scalar estimator during fusion
const TRUST_BEAT: f32 = 0.5;
const TRUST_GLOBAL: f32 = 0.35;
const TRUST_DYNAMIC: f32 = 0.25;

/// Scalar tempo estimates feeding the fusion scorer
#[derive(Debug, Clone, Copy)]
struct ScalarEstimates {
    beat: f32,
    global: f32,
    dynamic: f32,
}

impl ScalarEstimates {
    fn trusted(&self) -> [(f32, f32); 3] {
        [
            (self.beat, TRUST_BEAT),
            (self.global, TRUST_GLOBAL),
            (self.dynamic, TRUST_DYNAMIC),
        ]
    }
}

/// Detect BPM from windowed mono samples
///
/// Returns 0.0 when the signal carries no usable rhythmic information
/// (silence, too short, flat onset curve). Non-zero results are normalized
/// into [70, 190] and rounded to one decimal.
pub fn detect_bpm(samples: &[f32], sample_rate: u32) -> f64 {
    if samples.is_empty() || sample_rate == 0 {
        return 0.0;
    }

    let spec = magnitude_stft(samples, sample_rate, DEFAULT_N_FFT, DEFAULT_HOP);

    // Percussive component carries the rhythm; fall back to the full signal
    // when separation collapses (e.g. pure tones, pads).
    let (_, percussive) = hpss::separate(&spec);
    let envelope = if hpss::is_silent(&percussive) {
        debug!("Percussive component silent, using unseparated spectrogram");
        onset_strength(&spec)
    } else {
        onset_strength(&percussive)
    };

    if is_degenerate(&envelope, MIN_ENVELOPE_FRAMES) {
        debug!("Degenerate onset envelope, reporting unknown tempo");
        return 0.0;
    }

    let frame_rate = spec.frame_rate();

    // Mean-removed envelope sharpens autocorrelation peaks
    let mean = envelope.iter().sum::<f32>() / envelope.len() as f32;
    let centered: Vec<f32> = envelope.iter().map(|v| v - mean).collect();
    let acf = autocorrelate(&centered);
    if acf.is_empty() {
        return 0.0;
    }

    let tempogram = compute_tempogram(&centered);
    let aggregate = aggregate_tempogram(&tempogram);

    let scalars = ScalarEstimates {
        beat: beat_tracking_estimate(&acf, frame_rate),
        global: peak_bpm(&aggregate, frame_rate),
        dynamic: dynamic_tempo_estimate(&tempogram, frame_rate),
    };

    let acf_peaks = peak_bpms(&acf, frame_rate, 5);
    let tempogram_peaks = peak_bpms(&aggregate, frame_rate, 5);

    let mut base: Vec<f32> = vec![scalars.beat, scalars.global, scalars.dynamic];
    base.extend(&acf_peaks);
    base.extend(&tempogram_peaks);

    let candidates = expand_candidates(&base);
    if candidates.is_empty() {
        return 0.0;
    }

    let score_of = |bpm: f32| {
        score_candidate(bpm, &acf, frame_rate, &acf_peaks, &tempogram_peaks, &scalars)
    };

    let mut best = candidates[0];
    let mut best_score = score_of(best);
    for &candidate in &candidates[1..] {
        let score = score_of(candidate);
        if score > best_score {
            best = candidate;
            best_score = score;
        }
    }

    // Re-score octave neighbors of the winner: fusion sometimes lands one
    // octave off when the half-tempo periodicity is nearly as strong.
    for neighbor in [best / 2.0, best * 2.0] {
        if (CANDIDATE_MIN_BPM..=CANDIDATE_MAX_BPM).contains(&neighbor) {
            let score = score_of(neighbor);
            if score > best_score {
                best = neighbor;
                best_score = score;
            }
        }
    }

    // Double-time-tagged genres (DnB, footwork) often win at half tempo.
    // Prefer the doubled value when it scores close and a scalar estimator
    // independently points fast.
    if best < 100.0 {
        let doubled = best * 2.0;
        if doubled <= CANDIDATE_MAX_BPM {
            let doubled_score = score_of(doubled);
            let fast_support = scalars.trusted().iter().any(|&(est, _)| est >= 120.0);
            if doubled_score >= best_score * 0.9 && fast_support {
                debug!(
                    "Preferring double-time {:.1} over {:.1} ({}% of winner score)",
                    doubled,
                    best,
                    (doubled_score / best_score * 100.0) as i32
                );
                best = doubled;
            }
        }
    }

    let bpm = normalize_bpm(best as f64);
    debug!("Detected BPM: {:.1}", bpm);
    bpm
}

/// Fold a tempo into the DJ-practical [70, 190] band by octave steps and
/// round to one decimal
pub fn normalize_bpm(bpm: f64) -> f64 {
    if bpm <= 0.0 || !bpm.is_finite() {
        return 0.0;
    }
    let mut value = bpm;
    while value < 70.0 {
        value *= 2.0;
    }
    while value > 190.0 {
        value /= 2.0;
    }
    (value * 10.0).round() / 10.0
}

// =============================================================================
// Candidate sources
// =============================================================================

/// Beat-tracking style estimate: autocorrelation peak weighted by a log-normal
/// tempo prior centered on 120 BPM
fn beat_tracking_estimate(acf: &[f32], frame_rate: f32) -> f32 {
    let (lag_min, lag_max) = lag_range(acf.len(), frame_rate, 30.0, 300.0);

    let mut best_lag = 0usize;
    let mut best_score = f32::MIN;
    for lag in lag_min..lag_max {
        let bpm = lag_to_bpm(lag as f32, frame_rate);
        let prior = (-0.5 * (bpm / 120.0).log2().powi(2)).exp();
        let score = acf[lag].max(0.0) * prior;
        if score > best_score {
            best_score = score;
            best_lag = lag;
        }
    }

    if best_lag == 0 {
        return 0.0;
    }
    lag_to_bpm(interpolate_peak(acf, best_lag), frame_rate)
}

/// Per-frame tempo curve reduced to a median over the plausible band
fn dynamic_tempo_estimate(tempogram: &[Vec<f32>], frame_rate: f32) -> f32 {
    let per_frame: Vec<f32> = tempogram
        .iter()
        .map(|column| peak_bpm(column, frame_rate))
        .filter(|bpm| (55.0..=220.0).contains(bpm))
        .collect();
    median(&per_frame)
}

/// Highest-valued plausible tempo in a periodicity curve
fn peak_bpm(curve: &[f32], frame_rate: f32) -> f32 {
    let (lag_min, lag_max) = lag_range(curve.len(), frame_rate, 40.0, 300.0);

    let mut best_lag = 0usize;
    let mut best_value = f32::MIN;
    for lag in lag_min..lag_max {
        if curve[lag] > best_value {
            best_value = curve[lag];
            best_lag = lag;
        }
    }

    if best_lag == 0 {
        return 0.0;
    }
    lag_to_bpm(interpolate_peak(curve, best_lag), frame_rate)
}

/// Local maxima of a periodicity curve mapped to BPM, strongest first
fn peak_bpms(curve: &[f32], frame_rate: f32, limit: usize) -> Vec<f32> {
    let (lag_min, lag_max) = lag_range(curve.len(), frame_rate, 40.0, 300.0);

    let mut peaks: Vec<(usize, f32)> = Vec::new();
    for lag in lag_min.max(1)..lag_max.min(curve.len().saturating_sub(1)) {
        if curve[lag] > curve[lag - 1] && curve[lag] >= curve[lag + 1] && curve[lag] > 0.0 {
            peaks.push((lag, curve[lag]));
        }
    }

    peaks.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    peaks
        .into_iter()
        .take(limit)
        .map(|(lag, _)| lag_to_bpm(interpolate_peak(curve, lag), frame_rate))
        .collect()
}

/// Local autocorrelation tempogram over the onset envelope
fn compute_tempogram(envelope: &[f32]) -> Vec<Vec<f32>> {
    let window = TEMPOGRAM_WINDOW.min(envelope.len());
    if window < MIN_ENVELOPE_FRAMES {
        return vec![];
    }

    let mut columns = Vec::new();
    let mut start = 0;
    while start + window <= envelope.len() {
        columns.push(autocorrelate(&envelope[start..start + window]));
        if start + window == envelope.len() {
            break;
        }
        start += TEMPOGRAM_STRIDE;
    }
    if columns.is_empty() {
        columns.push(autocorrelate(envelope));
    }
    columns
}

/// Time-average of tempogram columns
fn aggregate_tempogram(tempogram: &[Vec<f32>]) -> Vec<f32> {
    let Some(len) = tempogram.iter().map(|c| c.len()).min() else {
        return vec![];
    };

    let mut sum = vec![0.0f32; len];
    for column in tempogram {
        for (slot, &value) in sum.iter_mut().zip(column.iter()) {
            *slot += value;
        }
    }
    let n = tempogram.len() as f32;
    sum.iter_mut().for_each(|v| *v /= n);
    sum
}

/// Expand base candidates into octave variants, filter to the working band
/// and dedupe within tolerance
fn expand_candidates(base: &[f32]) -> Vec<f32> {
    let mut expanded: Vec<f32> = Vec::new();
    for &bpm in base {
        if bpm <= 0.0 || !bpm.is_finite() {
            continue;
        }
        for variant in [bpm / 2.0, bpm, bpm * 2.0] {
            if (CANDIDATE_MIN_BPM..=CANDIDATE_MAX_BPM).contains(&variant) {
                expanded.push(variant);
            }
        }
    }

    expanded.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mut deduped: Vec<f32> = Vec::new();
    for bpm in expanded {
        let is_new = deduped
            .last()
            .map_or(true, |&last| bpm - last > DEDUPE_TOLERANCE_BPM);
        if is_new {
            deduped.push(bpm);
        }
    }
    deduped
}

// =============================================================================
// Fusion scoring
// =============================================================================

fn score_candidate(
    bpm: f32,
    acf: &[f32],
    frame_rate: f32,
    acf_peaks: &[f32],
    tempogram_peaks: &[f32],
    scalars: &ScalarEstimates,
) -> f32 {
    // Periodicity strength at the candidate's lag plus its 2nd/3rd harmonics
    let lag = bpm_to_lag(bpm, frame_rate);
    let mut score = acf_at(acf, lag) + 0.5 * acf_at(acf, lag * 2.0) + 0.33 * acf_at(acf, lag * 3.0);

    // Distance-weighted agreement with the two candidate sets
    score += 0.2 * set_agreement(bpm, acf_peaks);
    score += 0.2 * set_agreement(bpm, tempogram_peaks);

    // Ratio agreement with the scalar estimators, weighted by trust
    for (estimate, trust) in scalars.trusted() {
        if estimate <= 0.0 {
            continue;
        }
        let ratio = bpm / estimate;
        if (ratio - 1.0).abs() < 0.04 {
            score += trust;
        } else if (ratio - 2.0).abs() < 0.08 || (ratio - 0.5).abs() < 0.02 {
            score += trust * 0.5;
        }
    }

    // Most club material lives here
    if (118.0..=180.0).contains(&bpm) {
        score += 0.1;
    }

    score
}

/// Closest-member agreement, fading out over 5 BPM
fn set_agreement(bpm: f32, set: &[f32]) -> f32 {
    set.iter()
        .map(|&member| (1.0 - (bpm - member).abs() / 5.0).max(0.0))
        .fold(0.0f32, f32::max)
}

/// Linearly interpolated autocorrelation value at a fractional lag
fn acf_at(acf: &[f32], lag: f32) -> f32 {
    if !lag.is_finite() || lag < 0.0 {
        return 0.0;
    }
    let lo = lag.floor() as usize;
    let hi = lo + 1;
    if hi >= acf.len() {
        return 0.0;
    }
    let frac = lag - lo as f32;
    (acf[lo] * (1.0 - frac) + acf[hi] * frac).max(0.0)
}

/// Parabolic interpolation around a discrete peak for sub-lag precision
fn interpolate_peak(curve: &[f32], lag: usize) -> f32 {
    if lag == 0 || lag + 1 >= curve.len() {
        return lag as f32;
    }
    let left = curve[lag - 1];
    let center = curve[lag];
    let right = curve[lag + 1];
    let denom = left - 2.0 * center + right;
    if denom.abs() <= f32::EPSILON {
        return lag as f32;
    }
    let shift = 0.5 * (left - right) / denom;
    lag as f32 + shift.clamp(-0.5, 0.5)
}

fn lag_to_bpm(lag: f32, frame_rate: f32) -> f32 {
    if lag <= 0.0 {
        return 0.0;
    }
    60.0 * frame_rate / lag
}

fn bpm_to_lag(bpm: f32, frame_rate: f32) -> f32 {
    if bpm <= 0.0 {
        return 0.0;
    }
    60.0 * frame_rate / bpm
}

/// Usable (min, max) lag indices for a BPM range within a curve
fn lag_range(curve_len: usize, frame_rate: f32, min_bpm: f32, max_bpm: f32) -> (usize, usize) {
    let lag_min = (bpm_to_lag(max_bpm, frame_rate).floor() as usize).max(1);
    let lag_max = (bpm_to_lag(min_bpm, frame_rate).ceil() as usize + 1).min(curve_len);
    (lag_min.min(curve_len), lag_max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn click_track(sr: u32, secs: usize, bpm: f32) -> Vec<f32> {
        let mut samples = vec![0.0f32; sr as usize * secs];
        let step = (60.0 / bpm * sr as f32) as usize;
        let len = samples.len();
        for start in (0..len).step_by(step) {
            for (i, slot) in samples[start..(start + 128).min(len)]
                .iter_mut()
                .enumerate()
            {
                // Exponential decay for a natural click
                *slot = 0.8 * (-4.0 * i as f32 / 128.0).exp();
            }
        }
        samples
    }

    #[test]
    fn test_normalize_bpm_half_and_double_time() {
        assert_eq!(normalize_bpm(62.0), 124.0);
        assert_eq!(normalize_bpm(256.0), 128.0);
        assert_eq!(normalize_bpm(174.0), 174.0);
        assert_eq!(normalize_bpm(35.0), 140.0);
        assert_eq!(normalize_bpm(0.0), 0.0);
        assert_eq!(normalize_bpm(-10.0), 0.0);
    }

    #[test]
    fn test_detect_bpm_click_track_120() {
        let samples = click_track(22050, 30, 120.0);
        let bpm = detect_bpm(&samples, 22050);
        // Octave-folded answer must match 120 at some octave
        let folded = normalize_bpm(120.0);
        assert!(
            (bpm - folded).abs() < 4.0,
            "expected ~{} BPM, got {}",
            folded,
            bpm
        );
    }

    #[test]
    fn test_detect_bpm_click_track_fast() {
        let samples = click_track(22050, 30, 174.0);
        let bpm = detect_bpm(&samples, 22050);
        assert!((bpm - 174.0).abs() < 5.0, "expected ~174 BPM, got {}", bpm);
    }

    #[test]
    fn test_detect_bpm_silence_is_unknown() {
        assert_eq!(detect_bpm(&vec![0.0f32; 22050 * 10], 22050), 0.0);
    }

    #[test]
    fn test_detect_bpm_too_short_is_unknown() {
        assert_eq!(detect_bpm(&[0.5f32; 1000], 22050), 0.0);
        assert_eq!(detect_bpm(&[], 22050), 0.0);
    }

    #[test]
    fn test_detect_bpm_result_in_practical_band() {
        let samples = click_track(22050, 30, 100.0);
        let bpm = detect_bpm(&samples, 22050);
        if bpm > 0.0 {
            assert!((70.0..=190.0).contains(&bpm), "out of band: {}", bpm);
        }
    }

    #[test]
    fn test_expand_candidates_filters_and_dedupes() {
        let expanded = expand_candidates(&[120.0, 120.3, 400.0, 0.0, f32::NAN]);
        // 400 contributes only its half (200); 120.3 dedupes against 120
        assert_eq!(expanded, vec![60.0, 120.0, 200.0]);
    }
}
