//! Headerless integer PCM
//!
//! Raw files carry no rate, layout or depth, so decode reads them from the
//! options (44100 Hz, 2 channels, 16-bit when unset).

use crate::audio::{float_to_pcm, pcm_to_float, PcmBuffer};
use crate::codec::Codec;
use crate::config::ConvertOptions;
use crate::error::{AudioError, Result};
use crate::processing::process_pcm;

pub const DEFAULT_RAW_SAMPLE_RATE: u32 = 44100;
pub const DEFAULT_RAW_CHANNELS: u16 = 2;

const FORMAT: &str = "pcm";

#[derive(Debug, Default, Clone, Copy)]
pub struct RawPcmCodec;

impl RawPcmCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Codec for RawPcmCodec {
    fn name(&self) -> &str {
        "PCM Codec"
    }

    fn extensions(&self) -> &[&'static str] {
        &["pcm"]
    }

    fn decode(&self, bytes: &[u8], options: &ConvertOptions) -> Result<PcmBuffer> {
        let depth = options.bit_depth().map_err(|e| e.with_format(FORMAT))?;
        let sample_rate = options.sample_rate.unwrap_or(DEFAULT_RAW_SAMPLE_RATE);
        let channels = options.channels.unwrap_or(DEFAULT_RAW_CHANNELS);

        let samples = pcm_to_float(bytes, depth)?;
        PcmBuffer::new(samples, sample_rate, channels).map_err(|e| {
            AudioError::decode(format!("Raw PCM is not a whole number of {}-channel frames", channels))
                .with_format(FORMAT)
                .with_source(e)
        })
    }

    fn encode(&self, pcm: &PcmBuffer, options: &ConvertOptions) -> Result<Vec<u8>> {
        let depth = options.bit_depth().map_err(|e| e.with_format(FORMAT))?;
        let processed = process_pcm(pcm, options)?;
        Ok(float_to_pcm(processed.samples(), depth))
    }
}
