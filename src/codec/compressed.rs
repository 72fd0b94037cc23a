//! Adapters binding the canonical model to external compressed-format backends
//!
//! Bitstream work (MP3, Vorbis, FLAC ...) lives in a [`DecodeBackend`] or an
//! [`EncodeBackend`]. The adapter owns everything around it: interleaving,
//! clamping, DSP, 16-bit conversion, frame chunking and error typing.

use std::sync::Arc;

use log::debug;

use crate::audio::sample_format::float_to_i16;
use crate::audio::{AudioMetadata, PcmBuffer};
use crate::codec::Codec;
use crate::config::ConvertOptions;
use crate::error::{AudioError, Result};
use crate::processing::process_pcm;

/// Frames handed to an encoder session per call (one MPEG-1 Layer III frame)
pub const ENCODE_CHUNK_FRAMES: usize = 1152;

/// Planar output of a decode backend
#[derive(Debug, Clone, Default)]
pub struct DecodedAudio {
    /// One vector per channel, all the same length
    pub planes: Vec<Vec<f32>>,
    pub sample_rate: u32,
    pub metadata: Option<AudioMetadata>,
}

pub trait DecodeBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Decode a complete file. `hint` is the expected extension, if known.
    fn decode(&self, bytes: &[u8], hint: Option<&str>) -> anyhow::Result<DecodedAudio>;
}

/// Parameters fixed for the lifetime of one encode session
#[derive(Debug, Clone)]
pub struct EncodeParams {
    pub sample_rate: u32,
    pub channels: u16,
    pub bitrate_kbps: u32,
    pub quality: f32,
    pub metadata: Option<AudioMetadata>,
}

/// Streaming encoder state; fed interleaved 16-bit chunks, then flushed once
pub trait EncodeSession {
    fn encode_chunk(&mut self, interleaved: &[i16]) -> anyhow::Result<Vec<u8>>;

    fn flush(&mut self) -> anyhow::Result<Vec<u8>>;
}

pub trait EncodeBackend: Send + Sync {
    fn name(&self) -> &str;

    fn start(&self, params: &EncodeParams) -> anyhow::Result<Box<dyn EncodeSession>>;
}

/// Decode `bytes` with `backend` into an interleaved, clamped buffer
pub fn decode_with_backend(
    backend: &dyn DecodeBackend,
    bytes: &[u8],
    format: &str,
) -> Result<PcmBuffer> {
    let decoded = backend.decode(bytes, Some(format)).map_err(|e| {
        AudioError::decode(format!("{} failed", backend.name()))
            .with_format(format)
            .with_source(e)
    })?;

    debug!(
        "{} decoded {} channels at {}Hz",
        backend.name(),
        decoded.planes.len(),
        decoded.sample_rate
    );

    PcmBuffer::from_planar(&decoded.planes, decoded.sample_rate)
        .map(|pcm| pcm.with_metadata(decoded.metadata))
        .map_err(|e| {
            AudioError::decode(format!("{} produced unusable PCM", backend.name()))
                .with_format(format)
                .with_source(e)
        })
}

/// Codec for a compressed format, decode and encode each delegated to an
/// optional backend
pub struct CompressedCodec {
    name: String,
    extensions: &'static [&'static str],
    decoder: Option<Arc<dyn DecodeBackend>>,
    encoder: Option<Arc<dyn EncodeBackend>>,
}

impl CompressedCodec {
    pub fn new<S: Into<String>>(name: S, extensions: &'static [&'static str]) -> Self {
        Self {
            name: name.into(),
            extensions,
            decoder: None,
            encoder: None,
        }
    }

    pub fn with_decoder(mut self, backend: Arc<dyn DecodeBackend>) -> Self {
        self.decoder = Some(backend);
        self
    }

    pub fn with_encoder(mut self, backend: Arc<dyn EncodeBackend>) -> Self {
        self.encoder = Some(backend);
        self
    }

    pub fn can_decode(&self) -> bool {
        self.decoder.is_some()
    }

    pub fn can_encode(&self) -> bool {
        self.encoder.is_some()
    }

    fn format(&self) -> &'static str {
        self.extensions.first().copied().unwrap_or("audio")
    }
}

impl Codec for CompressedCodec {
    fn name(&self) -> &str {
        &self.name
    }

    fn extensions(&self) -> &[&'static str] {
        self.extensions
    }

    fn decode(&self, bytes: &[u8], _options: &ConvertOptions) -> Result<PcmBuffer> {
        let backend = self.decoder.as_ref().ok_or_else(|| {
            AudioError::decode(format!("No decoder backend configured for {}", self.name))
                .with_format(self.format())
        })?;
        decode_with_backend(backend.as_ref(), bytes, self.format())
    }

    fn encode(&self, pcm: &PcmBuffer, options: &ConvertOptions) -> Result<Vec<u8>> {
        let format = self.format();
        let backend = self.encoder.as_ref().ok_or_else(|| {
            AudioError::encode(format!("No encoder backend configured for {}", self.name))
                .with_format(format)
        })?;

        let processed = process_pcm(pcm, options)?;
        let params = EncodeParams {
            sample_rate: processed.sample_rate(),
            channels: processed.channels(),
            bitrate_kbps: options.bitrate_or_default(),
            quality: options.quality_or_default(),
            metadata: processed.metadata().cloned(),
        };

        let backend_error = |e: anyhow::Error| {
            AudioError::encode(format!("{} failed", backend.name()))
                .with_format(format)
                .with_source(e)
        };

        let mut session = backend.start(&params).map_err(backend_error)?;
        let samples: Vec<i16> = processed.samples().iter().map(|&s| float_to_i16(s)).collect();
        let chunk_len = ENCODE_CHUNK_FRAMES * processed.channels() as usize;

        let mut out = Vec::new();
        for chunk in samples.chunks(chunk_len) {
            out.extend(session.encode_chunk(chunk).map_err(backend_error)?);
        }
        out.extend(session.flush().map_err(backend_error)?);

        debug!("{} encoded {} samples into {} bytes", backend.name(), samples.len(), out.len());
        Ok(out)
    }
}
