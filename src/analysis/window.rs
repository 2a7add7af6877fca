//! Analysis window selection
//!
//! Long recordings get analyzed over a representative mid-track slice instead
//! of the whole file: cold intros and outros skew tempo and key estimates,
//! and bounding the window bounds compute cost on hour-long mixes.

use tracing::debug;

/// Tracks under this length are analyzed whole
const FULL_ANALYSIS_MAX_SECS: f64 = 180.0;

/// Upper bound on the analysis window length
const MAX_WINDOW_SECS: f64 = 120.0;

/// Selected analysis sub-range of a track
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisWindow {
    /// Absolute start offset in seconds
    pub offset: f64,
    /// Window length in seconds
    pub length: f64,
}

/// Pick the analysis window for a track of the given duration
pub fn select_window(duration: f64) -> AnalysisWindow {
    if duration <= FULL_ANALYSIS_MAX_SECS {
        return AnalysisWindow {
            offset: 0.0,
            length: duration.max(0.0),
        };
    }

    let length = MAX_WINDOW_SECS.min(duration * 0.4);
    let offset = (duration * 0.25).max(30.0).clamp(0.0, duration - length);

    debug!(
        "Analysis window: {:.1}s at offset {:.1}s of {:.1}s total",
        length, offset, duration
    );

    AnalysisWindow { offset, length }
}

/// Slice a sample buffer down to the selected window
///
/// Index arithmetic is clamped to the buffer, so a duration estimate that
/// disagrees slightly with the decoded length cannot panic.
pub fn apply_window<'a>(samples: &'a [f32], sample_rate: u32, window: &AnalysisWindow) -> &'a [f32] {
    if sample_rate == 0 || samples.is_empty() {
        return samples;
    }

    let start = ((window.offset * sample_rate as f64) as usize).min(samples.len());
    let end = (start + (window.length * sample_rate as f64) as usize).min(samples.len());
    &samples[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_track_analyzed_whole() {
        let window = select_window(150.0);
        assert_eq!(window.offset, 0.0);
        assert_eq!(window.length, 150.0);
    }

    #[test]
    fn test_long_track_uses_mid_window() {
        // 400s: window = min(120, 160) = 120, offset = max(30, 100) = 100
        let window = select_window(400.0);
        assert_eq!(window.length, 120.0);
        assert_eq!(window.offset, 100.0);
    }

    #[test]
    fn test_moderate_track_offset_floor() {
        // 200s: window = min(120, 80) = 80, offset = max(30, 50) = 50
        let window = select_window(200.0);
        assert_eq!(window.length, 80.0);
        assert_eq!(window.offset, 50.0);
    }

    #[test]
    fn test_window_never_overruns_track() {
        for duration in [181.0, 200.0, 240.0, 600.0, 3600.0] {
            let window = select_window(duration);
            assert!(window.offset + window.length <= duration + 1e-9);
            assert!(window.offset >= 0.0);
        }
    }

    #[test]
    fn test_apply_window_clamps_to_buffer() {
        let samples = vec![0.0f32; 1000];
        let window = AnalysisWindow {
            offset: 10.0,
            length: 100.0,
        };
        // Window claims more audio than the buffer holds; slice stays in bounds
        let sliced = apply_window(&samples, 22050, &window);
        assert!(sliced.is_empty() || sliced.len() <= samples.len());

        let whole = AnalysisWindow {
            offset: 0.0,
            length: 1.0,
        };
        let sliced = apply_window(&samples, 100, &whole);
        assert_eq!(sliced.len(), 100);
    }
}
