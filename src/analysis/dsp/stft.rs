//! Short-time Fourier transform for mono analysis
//!
//! All estimators share one magnitude spectrogram representation. Parameters
//! follow the analysis defaults at the 22050 Hz working rate: 2048-sample
//! windows (~93 ms) with 512-sample hops (75% overlap), Hann tapered.

use rustfft::{num_complex::Complex, FftPlanner};

/// Default FFT window size (~93 ms at 22050 Hz)
pub const DEFAULT_N_FFT: usize = 2048;

/// Default hop length between frames (75% overlap)
pub const DEFAULT_HOP: usize = 512;

/// Magnitude spectrogram for a mono signal
///
/// Frames are outer, frequency bins inner: `mags[frame][bin]`. Only the
/// positive-frequency half of the spectrum is kept.
#[derive(Debug, Clone)]
pub struct Spectrogram {
    pub mags: Vec<Vec<f32>>,
    pub n_fft: usize,
    pub hop: usize,
    pub sample_rate: u32,
}

impl Spectrogram {
    /// Number of time frames
    pub fn num_frames(&self) -> usize {
        self.mags.len()
    }

    /// Number of frequency bins per frame
    pub fn num_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Center frequency of a bin in Hz
    pub fn bin_frequency(&self, bin: usize) -> f32 {
        bin as f32 * self.sample_rate as f32 / self.n_fft as f32
    }

    /// Frames per second of the frame grid
    pub fn frame_rate(&self) -> f32 {
        self.sample_rate as f32 / self.hop as f32
    }
}

/// Compute a Hann-windowed magnitude STFT of a mono signal
///
/// Short inputs (less than one window) produce a single zero-padded frame so
/// downstream code never has to special-case an empty spectrogram separately
/// from a degenerate one.
pub fn magnitude_stft(samples: &[f32], sample_rate: u32, n_fft: usize, hop: usize) -> Spectrogram {
    let num_bins = n_fft / 2 + 1;

    if samples.is_empty() || hop == 0 {
        return Spectrogram {
            mags: vec![],
            n_fft,
            hop,
            sample_rate,
        };
    }

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n_fft);
    let window = hann_window(n_fft);

    let num_frames = if samples.len() >= n_fft {
        (samples.len() - n_fft) / hop + 1
    } else {
        1
    };

    let mut mags = Vec::with_capacity(num_frames);
    let mut buffer: Vec<Complex<f32>> = vec![Complex::new(0.0, 0.0); n_fft];

    for frame_idx in 0..num_frames {
        let start = frame_idx * hop;

        for (i, slot) in buffer.iter_mut().enumerate() {
            let sample = samples.get(start + i).copied().unwrap_or(0.0);
            *slot = Complex::new(sample * window[i], 0.0);
        }

        fft.process(&mut buffer);

        let frame: Vec<f32> = buffer[..num_bins].iter().map(|c| c.norm()).collect();
        mags.push(frame);
    }

    Spectrogram {
        mags,
        n_fft,
        hop,
        sample_rate,
    }
}

/// Generate a Hann window of the given size
pub fn hann_window(size: usize) -> Vec<f32> {
    use std::f32::consts::PI;
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / size as f32).cos()))
        .collect()
}
