//! Core pipeline logic.
//!
//! - `detect`: signature sniffing and envelope unwrapping (pure)
//! - `scratch`: tracked temporary artifacts with guaranteed cleanup
//! - `convert`: the data-driven transcoding fallback chain
//! - `fabricate`: last-resort synthetic artifacts
//! - `pipeline`: orchestration and the degeneracy retry

pub mod convert;
pub mod detect;
pub mod fabricate;
pub mod pipeline;
pub mod scratch;

pub use convert::{
    AttemptOutcome, CodecTarget, Conversion, ConversionAttempt, ConversionExhausted,
    InputHypothesis, LOW_CONFIDENCE_OUTPUT_BYTES, MIN_VIABLE_OUTPUT_BYTES,
};
pub use detect::{detect, sniff, Detection};
pub use pipeline::{TranscriptionPipeline, MIN_PLAUSIBLE_TRANSCRIPT_CHARS};
pub use scratch::ScratchSpace;
