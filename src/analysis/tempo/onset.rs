//! Onset-strength envelope
//!
//! Spectral flux over a log-compressed magnitude spectrogram: each frame
//! scores the mean positive change across all bins since the previous frame.
//! Sharp broadband events (kicks, snares, hits) produce tall peaks; sustained
//! tones contribute nothing.

use crate::analysis::dsp::Spectrogram;

/// Compute the onset-strength curve of a spectrogram
///
/// The first frame has no predecessor and reports 0.
pub fn onset_strength(spec: &Spectrogram) -> Vec<f32> {
    let num_frames = spec.num_frames();
    if num_frames == 0 {
        return vec![];
    }

    let mut envelope = Vec::with_capacity(num_frames);
    envelope.push(0.0);

    for t in 1..num_frames {
        let prev = &spec.mags[t - 1];
        let curr = &spec.mags[t];
        let flux: f32 = curr
            .iter()
            .zip(prev.iter())
            .map(|(&c, &p)| (c.ln_1p() - p.ln_1p()).max(0.0))
            .sum();
        envelope.push(flux / curr.len().max(1) as f32);
    }

    envelope
}

/// True when the envelope is too short or too quiet to carry tempo information
pub fn is_degenerate(envelope: &[f32], min_frames: usize) -> bool {
    if envelope.len() < min_frames {
        return true;
    }
    let peak = envelope.iter().cloned().fold(0.0f32, f32::max);
    peak <= 1e-6
}
