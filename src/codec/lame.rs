//! MP3 encoder backend on LAME

use anyhow::{anyhow, bail};
use log::debug;
use mp3lame_encoder::{Bitrate, Builder, Encoder, FlushNoGap, InterleavedPcm, MonoPcm, Quality};

use crate::codec::compressed::{EncodeBackend, EncodeParams, EncodeSession};

/// Constant bitrates LAME accepts, in kbps
const BITRATES: [(u32, Bitrate); 16] = [
    (8, Bitrate::Kbps8),
    (16, Bitrate::Kbps16),
    (24, Bitrate::Kbps24),
    (32, Bitrate::Kbps32),
    (40, Bitrate::Kbps40),
    (48, Bitrate::Kbps48),
    (64, Bitrate::Kbps64),
    (80, Bitrate::Kbps80),
    (96, Bitrate::Kbps96),
    (112, Bitrate::Kbps112),
    (128, Bitrate::Kbps128),
    (160, Bitrate::Kbps160),
    (192, Bitrate::Kbps192),
    (224, Bitrate::Kbps224),
    (256, Bitrate::Kbps256),
    (320, Bitrate::Kbps320),
];

#[derive(Debug, Default, Clone, Copy)]
pub struct LameEncoder;

impl LameEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl EncodeBackend for LameEncoder {
    fn name(&self) -> &str {
        "lame"
    }

    fn start(&self, params: &EncodeParams) -> anyhow::Result<Box<dyn EncodeSession>> {
        if !(1..=2).contains(&params.channels) {
            bail!("MP3 carries 1 or 2 channels, got {}", params.channels);
        }

        let (kbps, bitrate) = nearest_bitrate(params.bitrate_kbps);
        let quality = lame_quality(params.quality);
        debug!(
            "LAME: {}Hz, {}ch, {} kbps (requested {}), quality {:.2}",
            params.sample_rate, params.channels, kbps, params.bitrate_kbps, params.quality
        );

        let mut builder = Builder::new().ok_or_else(|| anyhow!("Failed to allocate LAME encoder"))?;
        builder
            .set_num_channels(params.channels as u8)
            .map_err(|e| anyhow!("Invalid channel count: {:?}", e))?;
        builder
            .set_sample_rate(params.sample_rate)
            .map_err(|e| anyhow!("Invalid sample rate {}: {:?}", params.sample_rate, e))?;
        builder
            .set_brate(bitrate)
            .map_err(|e| anyhow!("Invalid bitrate: {:?}", e))?;
        builder
            .set_quality(quality)
            .map_err(|e| anyhow!("Invalid quality: {:?}", e))?;
        let encoder = builder
            .build()
            .map_err(|e| anyhow!("Failed to initialise LAME: {:?}", e))?;

        Ok(Box::new(LameSession {
            encoder,
            mono: params.channels == 1,
        }))
    }
}

struct LameSession {
    encoder: Encoder,
    mono: bool,
}

impl EncodeSession for LameSession {
    fn encode_chunk(&mut self, interleaved: &[i16]) -> anyhow::Result<Vec<u8>> {
        let frames = if self.mono { interleaved.len() } else { interleaved.len() / 2 };
        let mut out = Vec::with_capacity(mp3lame_encoder::max_required_buffer_size(frames));

        let result = if self.mono {
            self.encoder.encode_to_vec(MonoPcm(interleaved), &mut out)
        } else {
            self.encoder.encode_to_vec(InterleavedPcm(interleaved), &mut out)
        };
        result.map_err(|e| anyhow!("LAME encode failed: {:?}", e))?;
        Ok(out)
    }

    fn flush(&mut self) -> anyhow::Result<Vec<u8>> {
        let mut out = Vec::with_capacity(7200);
        self.encoder
            .flush_to_vec::<FlushNoGap>(&mut out)
            .map_err(|e| anyhow!("LAME flush failed: {:?}", e))?;
        Ok(out)
    }
}

/// Closest supported constant bitrate; ties go to the lower one
fn nearest_bitrate(kbps: u32) -> (u32, Bitrate) {
    BITRATES
        .into_iter()
        .min_by_key(|(rate, _)| rate.abs_diff(kbps))
        .unwrap_or((128, Bitrate::Kbps128))
}

/// 1.0 is LAME's best (slowest) algorithm, 0.0 its worst
fn lame_quality(quality: f32) -> Quality {
    let level = ((1.0 - quality.clamp(0.0, 1.0)) * 9.0).round() as u8;
    match level {
        0 => Quality::Best,
        1 => Quality::SecondBest,
        2 => Quality::NearBest,
        3 => Quality::VeryNice,
        4 => Quality::Nice,
        5 => Quality::Good,
        6 => Quality::Decent,
        7 => Quality::Ok,
        8 => Quality::SecondWorst,
        _ => Quality::Worst,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::PcmBuffer;
    use crate::codec::{Codec, CompressedCodec};
    use crate::config::ConvertOptions;
    use std::sync::Arc;

    fn tone(rate: u32, channels: u16, frames: usize) -> PcmBuffer {
        let samples: Vec<f32> = (0..frames * channels as usize)
            .map(|i| {
                let t = (i / channels as usize) as f32 / rate as f32;
                (t * 440.0 * std::f32::consts::TAU).sin() * 0.6
            })
            .collect();
        PcmBuffer::new(samples, rate, channels).unwrap()
    }

    fn mp3_codec() -> CompressedCodec {
        CompressedCodec::new("MP3 Codec", &["mp3"]).with_encoder(Arc::new(LameEncoder::new()))
    }

    #[test]
    fn test_nearest_bitrate() {
        assert_eq!(nearest_bitrate(128).0, 128);
        assert_eq!(nearest_bitrate(130).0, 128);
        assert_eq!(nearest_bitrate(144).0, 128);
        assert_eq!(nearest_bitrate(150).0, 160);
        assert_eq!(nearest_bitrate(0).0, 8);
        assert_eq!(nearest_bitrate(1000).0, 320);
    }

    #[test]
    fn test_lame_quality_mapping() {
        assert!(matches!(lame_quality(1.0), Quality::Best));
        assert!(matches!(lame_quality(0.5), Quality::Good));
        assert!(matches!(lame_quality(0.0), Quality::Worst));
        assert!(matches!(lame_quality(7.0), Quality::Best));
    }

    #[test]
    fn test_encodes_mono_and_stereo() {
        for channels in [1u16, 2] {
            let bytes = mp3_codec()
                .encode(&tone(44100, channels, 44100), &ConvertOptions::new())
                .unwrap();
            // 1 s at 128 kbps is about 16 KB
            assert!(bytes.len() > 8_000 && bytes.len() < 32_000, "{} bytes", bytes.len());
        }
    }

    #[test]
    fn test_rejects_more_than_two_channels() {
        let err = mp3_codec()
            .encode(&tone(44100, 6, 1152), &ConvertOptions::new())
            .unwrap_err();
        assert_eq!(err.step(), crate::error::Step::Encode);
        assert_eq!(err.format(), Some("mp3"));
    }

    #[cfg(feature = "symphonia")]
    #[test]
    fn test_round_trip_through_symphonia() {
        use crate::codec::{DecodeBackend, SymphoniaDecoder};

        let bytes = mp3_codec()
            .encode(&tone(44100, 2, 44100), &ConvertOptions::new().with_bitrate(192))
            .unwrap();

        let decoded = SymphoniaDecoder::new().decode(&bytes, Some("mp3")).unwrap();
        assert_eq!(decoded.sample_rate, 44100);
        assert_eq!(decoded.planes.len(), 2);
        // Encoder delay and padding only ever add frames
        let frames = decoded.planes[0].len();
        assert!(frames >= 44100 && frames < 44100 + 6 * 1152, "{} frames", frames);

        let energy: f32 = decoded.planes[0].iter().map(|s| s * s).sum::<f32>() / frames as f32;
        assert!(energy > 0.05, "decoded signal is silent: {}", energy);
    }
}
