//! Audio Data Model
//!
//! Canonical PCM buffer, integer sample-format conversion and the
//! RIFF/WAVE container.

pub mod pcm;
pub mod sample_format;
pub mod wav;

pub use pcm::{AudioMetadata, PcmBuffer};
pub use sample_format::{float_to_pcm, pcm_to_float, BitDepth};
pub use wav::{WavDecoder, WavEncoder, WavError, WavHeader};
