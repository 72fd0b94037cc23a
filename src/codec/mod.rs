//! Codecs and the registry that maps file extensions onto them
//!
//! Every codec converts between its own byte format and the canonical
//! [`PcmBuffer`]. Compressed formats are thin adapters over external
//! decode/encode backends (see [`compressed`]).

pub mod compressed;
#[cfg(feature = "mp3-encoder")]
pub mod lame;
pub mod pcm;
pub mod registry;
#[cfg(feature = "symphonia")]
pub mod symphonia;
pub mod wav;

pub use compressed::{
    CompressedCodec, DecodeBackend, DecodedAudio, EncodeBackend, EncodeParams, EncodeSession,
};
#[cfg(feature = "mp3-encoder")]
pub use lame::LameEncoder;
pub use pcm::RawPcmCodec;
pub use registry::Registry;
#[cfg(feature = "symphonia")]
pub use self::symphonia::SymphoniaDecoder;
pub use wav::WavCodec;

use crate::audio::PcmBuffer;
use crate::config::ConvertOptions;
use crate::error::Result;

/// Capability contract implemented by every format
pub trait Codec: Send + Sync {
    fn name(&self) -> &str;

    /// Lowercase extensions without the leading dot
    fn extensions(&self) -> &[&'static str];

    fn supports(&self, format: &str) -> bool {
        self.extensions().iter().any(|ext| ext.eq_ignore_ascii_case(format))
    }

    fn decode(&self, bytes: &[u8], options: &ConvertOptions) -> Result<PcmBuffer>;

    fn encode(&self, pcm: &PcmBuffer, options: &ConvertOptions) -> Result<Vec<u8>>;
}
