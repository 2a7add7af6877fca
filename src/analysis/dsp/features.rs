//! Frame-level feature primitives
//!
//! RMS, spectral centroid, FFT-accelerated autocorrelation and the small
//! statistics helpers the estimators share.

use super::stft::Spectrogram;
use rustfft::{num_complex::Complex, FftPlanner};

/// Per-frame root-mean-square energy of a mono signal
pub fn rms_frames(samples: &[f32], frame_size: usize, hop: usize) -> Vec<f32> {
    if samples.is_empty() || frame_size == 0 || hop == 0 {
        return vec![];
    }

    let num_frames = if samples.len() >= frame_size {
        (samples.len() - frame_size) / hop + 1
    } else {
        1
    };

    (0..num_frames)
        .map(|idx| {
            let start = idx * hop;
            let end = (start + frame_size).min(samples.len());
            let frame = &samples[start..end];
            let sum_sq: f32 = frame.iter().map(|s| s * s).sum();
            (sum_sq / frame.len().max(1) as f32).sqrt()
        })
        .collect()
}

/// Per-frame spectral centroid in Hz
///
/// Frames with no energy report a centroid of 0.
pub fn spectral_centroid_frames(spec: &Spectrogram) -> Vec<f32> {
    spec.mags
        .iter()
        .map(|frame| {
            let total: f32 = frame.iter().sum();
            if total <= f32::EPSILON {
                return 0.0;
            }
            let weighted: f32 = frame
                .iter()
                .enumerate()
                .map(|(bin, &mag)| spec.bin_frequency(bin) * mag)
                .sum();
            weighted / total
        })
        .collect()
}

/// Autocorrelation of a signal via FFT: `ACF = IFFT(|FFT(x)|^2)`
///
/// Returns the positive-lag half, normalized so lag 0 equals 1 when the
/// signal has any energy.
pub fn autocorrelate(signal: &[f32]) -> Vec<f32> {
    if signal.len() < 2 {
        return vec![];
    }

    // Zero-pad to 2n to avoid circular wrap-around
    let padded_len = (signal.len() * 2).next_power_of_two();
    let mut buffer: Vec<Complex<f32>> = signal
        .iter()
        .map(|&s| Complex::new(s, 0.0))
        .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
        .take(padded_len)
        .collect();

    let mut planner = FftPlanner::new();
    planner.plan_fft_forward(padded_len).process(&mut buffer);
    for c in buffer.iter_mut() {
        *c = Complex::new(c.norm_sqr(), 0.0);
    }
    planner.plan_fft_inverse(padded_len).process(&mut buffer);

    let zero_lag = buffer[0].re;
    if zero_lag <= f32::EPSILON {
        return vec![0.0; signal.len()];
    }

    buffer[..signal.len()].iter().map(|c| c.re / zero_lag).collect()
}

/// Scale a curve into [0, 1] by its peak; a flat or empty curve stays zeros
pub fn normalize_peak(values: &[f32]) -> Vec<f32> {
    let peak = values.iter().cloned().fold(0.0f32, f32::max);
    if peak <= f32::EPSILON {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v / peak).max(0.0)).collect()
}

/// Median of a sample set (empty input yields 0)
pub fn median(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted: Vec<f32> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return 0.0;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Linear-interpolated quantile, q in [0, 1]
pub fn quantile(values: &[f32], q: f32) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted: Vec<f32> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return 0.0;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f32;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = pos - lo as f32;
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}

/// Pearson correlation between two equal-length vectors
///
/// Zero-variance inputs and non-finite results are reported as 0 rather than
/// NaN so callers can rank correlations without guards.
pub fn pearson(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.len() < 2 {
        return 0.0;
    }

    let n = a.len() as f32;
    let mean_a: f32 = a.iter().sum::<f32>() / n;
    let mean_b: f32 = b.iter().sum::<f32>() / n;

    let mut cov = 0.0f32;
    let mut var_a = 0.0f32;
    let mut var_b = 0.0f32;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if var_a <= f32::EPSILON || var_b <= f32::EPSILON {
        return 0.0;
    }

    let r = cov / (var_a.sqrt() * var_b.sqrt());
    if r.is_finite() {
        r
    } else {
        0.0
    }
}
