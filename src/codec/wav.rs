//! WAV codec with optional fallback to a generic decoder

use std::sync::Arc;

use log::{debug, warn};

use crate::audio::wav::{WavDecoder, WavEncoder, WavError};
use crate::audio::{pcm_to_float, BitDepth, PcmBuffer};
use crate::codec::compressed::{decode_with_backend, DecodeBackend};
use crate::codec::Codec;
use crate::config::ConvertOptions;
use crate::error::{AudioError, Result};
use crate::processing::process_pcm;

const FORMAT: &str = "wav";

#[derive(Default)]
pub struct WavCodec {
    fallback: Option<Arc<dyn DecodeBackend>>,
}

impl WavCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode through `backend` when the canonical 44-byte layout is rejected
    pub fn with_fallback(backend: Arc<dyn DecodeBackend>) -> Self {
        Self {
            fallback: Some(backend),
        }
    }

    fn decode_canonical(&self, bytes: &[u8]) -> Result<PcmBuffer> {
        let decoder = WavDecoder::new(bytes).map_err(wav_decode_error)?;
        let header = decoder.header();

        let depth = BitDepth::try_from(header.bits_per_sample).map_err(|e| {
            AudioError::decode(format!("Unsupported WAV bit depth: {}", header.bits_per_sample))
                .with_format(FORMAT)
                .with_source(e)
        })?;

        let samples = pcm_to_float(decoder.data(), depth)?;
        debug!(
            "WAV header: {}Hz, {}ch, {}-bit, {} payload bytes",
            header.sample_rate, header.num_channels, header.bits_per_sample, header.data_chunk_size
        );

        PcmBuffer::new(samples, header.sample_rate, header.num_channels).map_err(|e| {
            AudioError::decode("WAV payload does not hold whole frames")
                .with_format(FORMAT)
                .with_source(e)
        })
    }
}

fn wav_decode_error(err: WavError) -> AudioError {
    AudioError::decode(err.to_string()).with_format(FORMAT).with_source(err)
}

impl Codec for WavCodec {
    fn name(&self) -> &str {
        "WAV Codec"
    }

    fn extensions(&self) -> &[&'static str] {
        &["wav"]
    }

    fn decode(&self, bytes: &[u8], _options: &ConvertOptions) -> Result<PcmBuffer> {
        match self.decode_canonical(bytes) {
            Ok(pcm) => Ok(pcm),
            Err(err) => match &self.fallback {
                Some(backend) => {
                    warn!("{}; falling back to {}", err, backend.name());
                    decode_with_backend(backend.as_ref(), bytes, FORMAT)
                }
                None => Err(err),
            },
        }
    }

    fn encode(&self, pcm: &PcmBuffer, options: &ConvertOptions) -> Result<Vec<u8>> {
        let depth = options.bit_depth().map_err(|e| e.with_format(FORMAT))?;
        let processed = process_pcm(pcm, options)?;

        let mut encoder = WavEncoder::new(processed.sample_rate(), processed.channels(), depth);
        encoder.write_samples(processed.samples());
        encoder.finish().map_err(|e| {
            AudioError::encode(e.to_string()).with_format(FORMAT).with_source(e)
        })
    }
}
