//! escriba - resilient voice-note transcription pipeline
//!
//! Accepts an arbitrary, possibly malformed byte payload claimed to
//! contain recorded speech and produces a best-effort transcription
//! without ever crashing the caller.
//!
//! # Architecture
//!
//! The pipeline is an ordered chain of unreliable operations, each with
//! its own recovery path:
//! - Format detection sniffs leading bytes and unwraps JSON envelopes
//! - Conversion drives ffmpeg through an ordered list of input-format
//!   hypotheses and codec targets, accepting the first viable output
//! - Fabrication substitutes a synthetic container when everything fails
//! - Transcription calls the remote service, retrying once when the
//!   result is implausibly short
//! - A scratch space tracks every temporary artifact and removes them
//!   on every exit path
//!
//! # Modules
//!
//! - `adapters`: External system drivers (ffmpeg, Whisper)
//! - `core`: Pipeline stages and orchestration
//! - `domain`: Data structures (formats, artifacts, errors)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Transcribe a saved capture
//! escriba transcribe memo.ogg
//!
//! # Inspect format detection only
//! escriba probe payload.bin
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use crate::core::TranscriptionPipeline;
pub use crate::domain::{AudioArtifact, DetectedFormat, PipelineError, TranscriptionResult};
