//! Float <-> fixed-width integer PCM conversion (little-endian)
//!
//! 16 and 32-bit use an asymmetric scale: negative samples are multiplied by
//! 2^(n-1), positive ones by 2^(n-1) - 1, so both -1.0 and 1.0 map onto the
//! extremes of the integer range. Decoding divides by the same factor.

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};

use crate::audio::pcm::clamp_sample;
use crate::error::{AudioError, Result};

const I16_NEG: f32 = 32768.0;
const I16_POS: f32 = 32767.0;
const I32_NEG: f64 = 2147483648.0;
const I32_POS: f64 = 2147483647.0;

/// Integer sample widths supported by the converter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum BitDepth {
    U8,
    I16,
    I32,
}

impl BitDepth {
    pub fn bits(self) -> u16 {
        match self {
            BitDepth::U8 => 8,
            BitDepth::I16 => 16,
            BitDepth::I32 => 32,
        }
    }

    pub fn bytes_per_sample(self) -> usize {
        self.bits() as usize / 8
    }
}

impl Default for BitDepth {
    fn default() -> Self {
        BitDepth::I16
    }
}

impl TryFrom<u16> for BitDepth {
    type Error = AudioError;

    fn try_from(bits: u16) -> Result<Self> {
        match bits {
            8 => Ok(BitDepth::U8),
            16 => Ok(BitDepth::I16),
            32 => Ok(BitDepth::I32),
            other => Err(AudioError::validation(format!(
                "Unsupported PCM bit depth: {} (expected 8, 16 or 32)",
                other
            ))
            .with_format("pcm")),
        }
    }
}

impl From<BitDepth> for u16 {
    fn from(depth: BitDepth) -> u16 {
        depth.bits()
    }
}

impl fmt::Display for BitDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

/// Encode float samples as integer PCM bytes. Samples are clamped first.
pub fn float_to_pcm(samples: &[f32], depth: BitDepth) -> Vec<u8> {
    let mut out = vec![0u8; samples.len() * depth.bytes_per_sample()];

    match depth {
        BitDepth::U8 => {
            for (dst, &s) in out.iter_mut().zip(samples) {
                *dst = ((clamp_sample(s) * 0.5 + 0.5) * 255.0).round() as u8;
            }
        }
        BitDepth::I16 => {
            for (chunk, &s) in out.chunks_exact_mut(2).zip(samples) {
                LittleEndian::write_i16(chunk, float_to_i16(s));
            }
        }
        BitDepth::I32 => {
            for (chunk, &s) in out.chunks_exact_mut(4).zip(samples) {
                LittleEndian::write_i32(chunk, float_to_i32(s));
            }
        }
    }

    out
}

/// Decode integer PCM bytes into float samples
pub fn pcm_to_float(bytes: &[u8], depth: BitDepth) -> Result<Vec<f32>> {
    let width = depth.bytes_per_sample();
    if bytes.len() % width != 0 {
        return Err(AudioError::decode(format!(
            "PCM payload of {} bytes is not a multiple of the {} sample width",
            bytes.len(),
            depth
        ))
        .with_format("pcm"));
    }

    let samples = match depth {
        BitDepth::U8 => bytes.iter().map(|&b| (b as f32 / 255.0) * 2.0 - 1.0).collect(),
        BitDepth::I16 => bytes
            .chunks_exact(2)
            .map(|c| i16_to_float(LittleEndian::read_i16(c)))
            .collect(),
        BitDepth::I32 => bytes
            .chunks_exact(4)
            .map(|c| i32_to_float(LittleEndian::read_i32(c)))
            .collect(),
    };

    Ok(samples)
}

pub fn float_to_i16(sample: f32) -> i16 {
    let s = clamp_sample(sample);
    let scaled = if s < 0.0 { s * I16_NEG } else { s * I16_POS };
    scaled.round() as i16
}

pub fn i16_to_float(value: i16) -> f32 {
    let v = value as f32;
    if value < 0 { v / I16_NEG } else { v / I16_POS }
}

fn float_to_i32(sample: f32) -> i32 {
    let s = clamp_sample(sample) as f64;
    let scaled = if s < 0.0 { s * I32_NEG } else { s * I32_POS };
    scaled.round() as i32
}

fn i32_to_float(value: i32) -> f32 {
    let v = value as f64;
    (if value < 0 { v / I32_NEG } else { v / I32_POS }) as f32
}
