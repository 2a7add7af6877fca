//! # deepcrate
//!
//! DJ library analysis core. Takes decoded mono audio plus raw tag strings
//! and infers the attributes a DJ cares about when building a set:
//!
//! - **Tempo** via multi-candidate fusion over an onset-strength envelope,
//!   with octave disambiguation and folding into the practical [70, 190] band
//! - **Musical key** via chroma extraction and Krumhansl-Kessler template
//!   matching, reported in Camelot notation
//! - **Perceived energy** with a confidence score for the estimate
//! - **Preview cue** placement at the most salient moment of the track
//! - **Review flags** for results a human should double-check
//!
//! Decoding, tag reading and persistence are the caller's responsibility; the
//! core consumes an [`AnalysisRequest`] and produces a [`TrackAttributes`]
//! record. `analyze` holds no shared state and is safe to call from many
//! threads at once.
//!
//! ```no_run
//! use deepcrate::{analyze, AnalysisRequest, AudioBuffer, RawTags};
//!
//! let request = AnalysisRequest {
//!     file_path: "/music/Calibre - Even If.mp3".to_string(),
//!     file_hash: deepcrate::file_hash("/music/Calibre - Even If.mp3".as_ref())?,
//!     audio: AudioBuffer::new(vec![0.0; 22050 * 240], 22050), // decoded mono
//!     duration: 240.0,
//!     tags: RawTags::default(),
//! };
//! let attributes = analyze(&request);
//! println!("{} @ {:.1} BPM, {}", attributes.display_name(), attributes.bpm, attributes.musical_key);
//! # Ok::<(), deepcrate::DeepcrateError>(())
//! ```

pub mod analysis;
pub mod error;
pub mod identity;
pub mod types;

pub use analysis::key::camelot::{
    camelot_to_key_name, compatible_keys, key_compatibility_score, key_name_to_camelot,
    parse_camelot,
};
pub use analysis::{analyze, AnalysisRequest};
pub use error::{DeepcrateError, Result};
pub use identity::{content_hash, file_hash};
pub use types::{AudioBuffer, RawTags, TrackAttributes, ANALYSIS_VERSION};
