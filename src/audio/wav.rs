//! RIFF/WAVE container with the canonical 44-byte PCM header

use byteorder::{ByteOrder, LittleEndian};
use thiserror::Error;

use crate::audio::sample_format::{float_to_pcm, BitDepth};

pub const HEADER_SIZE: usize = 44;
pub const RIFF_ID: &[u8; 4] = b"RIFF";
pub const WAVE_ID: &[u8; 4] = b"WAVE";
pub const FMT_ID: &[u8; 4] = b"fmt ";
pub const DATA_ID: &[u8; 4] = b"data";
pub const FMT_CHUNK_SIZE: u32 = 16;
pub const FORMAT_PCM: u16 = 1;

/// Bit depths a WAV header may declare
pub const HEADER_BIT_DEPTHS: [u16; 4] = [8, 16, 24, 32];

/// Container-level failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WavError {
    #[error("invalid container: {0}")]
    InvalidContainer(String),
    #[error("unsupported bit depth: {0}")]
    UnsupportedBitDepth(u16),
    #[error("size mismatch: data chunk declares {declared} bytes, {available} available")]
    SizeMismatch { declared: u32, available: usize },
    #[error("payload of {0} bytes does not fit a WAV file")]
    PayloadTooLarge(usize),
    #[error("{field} of {value} does not fit the header field")]
    FieldOverflow { field: &'static str, value: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub riff_chunk_size: u32,
    pub fmt_chunk_size: u32,
    pub audio_format: u16,
    pub num_channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_chunk_size: u32,
}

impl WavHeader {
    /// Header for a PCM payload of `data_size` bytes.
    ///
    /// Fails when `block_align`, `byte_rate` or the RIFF size would not fit
    /// their header fields.
    pub fn new(
        sample_rate: u32,
        num_channels: u16,
        bits_per_sample: u16,
        data_size: u32,
    ) -> Result<Self, WavError> {
        let (block_align, byte_rate) = derived_rates(sample_rate, num_channels, bits_per_sample)?;
        let riff_chunk_size = data_size
            .checked_add(36)
            .ok_or(WavError::PayloadTooLarge(data_size as usize))?;

        Ok(Self {
            riff_chunk_size,
            fmt_chunk_size: FMT_CHUNK_SIZE,
            audio_format: FORMAT_PCM,
            num_channels,
            sample_rate,
            byte_rate,
            block_align,
            bits_per_sample,
            data_chunk_size: data_size,
        })
    }

    /// Parse and validate the fixed-offset header
    pub fn parse(bytes: &[u8]) -> Result<Self, WavError> {
        if bytes.len() < HEADER_SIZE {
            return Err(WavError::InvalidContainer(format!(
                "{} bytes is shorter than the {}-byte header",
                bytes.len(),
                HEADER_SIZE
            )));
        }
        if &bytes[0..4] != RIFF_ID || &bytes[8..12] != WAVE_ID {
            return Err(WavError::InvalidContainer("missing RIFF/WAVE magic".into()));
        }
        if &bytes[12..16] != FMT_ID {
            return Err(WavError::InvalidContainer("fmt chunk is not at offset 12".into()));
        }
        if &bytes[36..40] != DATA_ID {
            return Err(WavError::InvalidContainer("data chunk is not at offset 36".into()));
        }

        let header = Self {
            riff_chunk_size: LittleEndian::read_u32(&bytes[4..8]),
            fmt_chunk_size: LittleEndian::read_u32(&bytes[16..20]),
            audio_format: LittleEndian::read_u16(&bytes[20..22]),
            num_channels: LittleEndian::read_u16(&bytes[22..24]),
            sample_rate: LittleEndian::read_u32(&bytes[24..28]),
            byte_rate: LittleEndian::read_u32(&bytes[28..32]),
            block_align: LittleEndian::read_u16(&bytes[32..34]),
            bits_per_sample: LittleEndian::read_u16(&bytes[34..36]),
            data_chunk_size: LittleEndian::read_u32(&bytes[40..44]),
        };

        if header.audio_format != FORMAT_PCM {
            return Err(WavError::InvalidContainer(format!(
                "audio format {} is not integer PCM",
                header.audio_format
            )));
        }
        if !HEADER_BIT_DEPTHS.contains(&header.bits_per_sample) {
            return Err(WavError::UnsupportedBitDepth(header.bits_per_sample));
        }
        if header.num_channels == 0 || header.sample_rate == 0 {
            return Err(WavError::InvalidContainer("zero channels or sample rate".into()));
        }
        // A header we could never write back is not a header we accept
        derived_rates(header.sample_rate, header.num_channels, header.bits_per_sample)?;

        let available = bytes.len() - HEADER_SIZE;
        if header.data_chunk_size as usize > available {
            return Err(WavError::SizeMismatch {
                declared: header.data_chunk_size,
                available,
            });
        }

        Ok(header)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(RIFF_ID);
        LittleEndian::write_u32(&mut out[4..8], self.riff_chunk_size);
        out[8..12].copy_from_slice(WAVE_ID);
        out[12..16].copy_from_slice(FMT_ID);
        LittleEndian::write_u32(&mut out[16..20], self.fmt_chunk_size);
        LittleEndian::write_u16(&mut out[20..22], self.audio_format);
        LittleEndian::write_u16(&mut out[22..24], self.num_channels);
        LittleEndian::write_u32(&mut out[24..28], self.sample_rate);
        LittleEndian::write_u32(&mut out[28..32], self.byte_rate);
        LittleEndian::write_u16(&mut out[32..34], self.block_align);
        LittleEndian::write_u16(&mut out[34..36], self.bits_per_sample);
        out[36..40].copy_from_slice(DATA_ID);
        LittleEndian::write_u32(&mut out[40..44], self.data_chunk_size);
        out.to_vec()
    }
}

/// `(block_align, byte_rate)` for a stream layout, computed without overflow
fn derived_rates(
    sample_rate: u32,
    num_channels: u16,
    bits_per_sample: u16,
) -> Result<(u16, u32), WavError> {
    let block_align = num_channels as u64 * bits_per_sample as u64 / 8;
    let byte_rate = sample_rate as u64 * block_align;

    let block_align = u16::try_from(block_align).map_err(|_| WavError::FieldOverflow {
        field: "block_align",
        value: block_align,
    })?;
    let byte_rate = u32::try_from(byte_rate).map_err(|_| WavError::FieldOverflow {
        field: "byte_rate",
        value: byte_rate,
    })?;
    Ok((block_align, byte_rate))
}

/// Incremental WAV writer: payload may be appended in chunks before `finish`.
#[derive(Debug, Clone)]
pub struct WavEncoder {
    sample_rate: u32,
    channels: u16,
    depth: BitDepth,
    data: Vec<u8>,
}

impl WavEncoder {
    pub fn new(sample_rate: u32, channels: u16, depth: BitDepth) -> Self {
        Self {
            sample_rate,
            channels,
            depth,
            data: Vec::new(),
        }
    }

    /// Append already-encoded PCM bytes
    pub fn write(&mut self, pcm_bytes: &[u8]) {
        self.data.extend_from_slice(pcm_bytes);
    }

    /// Append float samples, converting at the encoder's bit depth
    pub fn write_samples(&mut self, samples: &[f32]) {
        let bytes = float_to_pcm(samples, self.depth);
        self.write(&bytes);
    }

    pub fn data_len(&self) -> usize {
        self.data.len()
    }

    pub fn finish(self) -> Result<Vec<u8>, WavError> {
        let data_size = u32::try_from(self.data.len())
            .ok()
            .filter(|size| *size <= u32::MAX - 36)
            .ok_or(WavError::PayloadTooLarge(self.data.len()))?;

        let header = WavHeader::new(self.sample_rate, self.channels, self.depth.bits(), data_size)?;
        let mut out = header.to_bytes();
        out.extend_from_slice(&self.data);
        Ok(out)
    }
}

/// Parsed WAV file borrowing its payload from the input
#[derive(Debug)]
pub struct WavDecoder<'a> {
    header: WavHeader,
    data: &'a [u8],
}

impl<'a> WavDecoder<'a> {
    pub fn new(bytes: &'a [u8]) -> Result<Self, WavError> {
        let header = WavHeader::parse(bytes)?;
        let end = HEADER_SIZE + header.data_chunk_size as usize;
        Ok(Self {
            header,
            data: &bytes[HEADER_SIZE..end],
        })
    }

    pub fn header(&self) -> &WavHeader {
        &self.header
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }
}
