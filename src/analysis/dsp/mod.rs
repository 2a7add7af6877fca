//! Shared signal-processing primitives
//!
//! Everything here operates on mono sample slices or magnitude spectrograms
//! and is consumed by the tempo, key, energy and preview estimators.

pub mod features;
pub mod hpss;
pub mod stft;

pub use stft::{magnitude_stft, Spectrogram, DEFAULT_HOP, DEFAULT_N_FFT};
