//! Generic multi-format decoder backed by Symphonia

use std::io::Cursor;

use anyhow::{anyhow, Context};
use log::{debug, warn};
use symphonia::core::audio::{AudioBuffer, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::{MetadataOptions, MetadataRevision, StandardTagKey};
use symphonia::core::probe::Hint;

use crate::audio::AudioMetadata;
use crate::codec::compressed::{DecodeBackend, DecodedAudio};

/// Consecutive undecodable packets tolerated before giving up
const MAX_CONSECUTIVE_ERRORS: usize = 10;

#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaDecoder;

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl DecodeBackend for SymphoniaDecoder {
    fn name(&self) -> &str {
        "symphonia"
    }

    fn decode(&self, bytes: &[u8], hint: Option<&str>) -> anyhow::Result<DecodedAudio> {
        let mut probe_hint = Hint::new();
        if let Some(ext) = hint {
            probe_hint.with_extension(ext);
        }

        let source = Box::new(Cursor::new(bytes.to_vec())) as Box<dyn MediaSource>;
        let stream = MediaSourceStream::new(source, Default::default());

        let mut probed = symphonia::default::get_probe()
            .format(&probe_hint, stream, &FormatOptions::default(), &MetadataOptions::default())
            .context("Failed to probe format")?;

        let mut metadata = probed
            .metadata
            .get()
            .and_then(|m| m.current().map(metadata_from_revision));
        let mut format = probed.format;
        if let Some(rev) = format.metadata().current() {
            metadata = Some(metadata_from_revision(rev));
        }

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| anyhow!("No supported audio tracks"))?;
        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .context("Failed to create codec decoder")?;

        let mut planes: Vec<Vec<f32>> = Vec::new();
        let mut sample_rate = codec_params.sample_rate;
        let mut consecutive_errors = 0;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => {
                    warn!("Track list changed mid-stream, stopping at the first track");
                    break;
                }
                Err(e) => return Err(e).context("Failed to read packet"),
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    consecutive_errors = 0;
                    let spec = *decoded.spec();
                    let channels = spec.channels.count();
                    if planes.is_empty() {
                        planes = vec![Vec::new(); channels];
                    } else if planes.len() != channels {
                        return Err(anyhow!(
                            "Channel count changed mid-stream: {} -> {}",
                            planes.len(),
                            channels
                        ));
                    }
                    if sample_rate.is_none() {
                        sample_rate = Some(spec.rate);
                    }

                    let mut buffer = AudioBuffer::<f32>::new(decoded.capacity() as u64, spec);
                    decoded.convert(&mut buffer);
                    for (c, plane) in planes.iter_mut().enumerate() {
                        plane.extend_from_slice(buffer.chan(c));
                    }
                }
                Err(e @ (SymphoniaError::DecodeError(_) | SymphoniaError::IoError(_))) => {
                    consecutive_errors += 1;
                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        return Err(e).context("Too many consecutive undecodable packets");
                    }
                    warn!(
                        "Skipping corrupted packet ({}/{}): {}",
                        consecutive_errors, MAX_CONSECUTIVE_ERRORS, e
                    );
                }
                Err(e) => return Err(e).context("Failed to decode packet"),
            }
        }

        let sample_rate = sample_rate.ok_or_else(|| anyhow!("Missing sample rate"))?;
        if planes.is_empty() {
            let channels = codec_params.channels.map(|c| c.count()).unwrap_or(1);
            planes = vec![Vec::new(); channels];
        }

        let frames = planes[0].len();
        debug!("Decoded {} frames, {} channels at {}Hz", frames, planes.len(), sample_rate);

        let mut metadata = metadata.unwrap_or_default();
        metadata.duration_secs = Some(frames as f64 / sample_rate as f64);

        Ok(DecodedAudio {
            planes,
            sample_rate,
            metadata: Some(metadata),
        })
    }
}

fn metadata_from_revision(rev: &MetadataRevision) -> AudioMetadata {
    let mut meta = AudioMetadata::default();
    for tag in rev.tags() {
        let value = tag.value.to_string();
        match tag.std_key {
            Some(StandardTagKey::TrackTitle) => meta.title = Some(value),
            Some(StandardTagKey::Artist) | Some(StandardTagKey::Performer) => {
                if meta.artist.is_none() {
                    meta.artist = Some(value);
                }
            }
            Some(StandardTagKey::Album) => meta.album = Some(value),
            Some(StandardTagKey::Date) | Some(StandardTagKey::ReleaseDate) => {
                meta.year = meta.year.or_else(|| parse_year(&value));
            }
            Some(StandardTagKey::Genre) => meta.genre = Some(value),
            _ => {
                meta.extra.insert(tag.key.clone(), value);
            }
        }
    }
    meta
}

/// Leading four digits of a date tag ("2019", "2019-04-01")
fn parse_year(value: &str) -> Option<i32> {
    value.trim().get(..4).and_then(|y| y.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::WavEncoder;
    use crate::audio::BitDepth;

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year("2019"), Some(2019));
        assert_eq!(parse_year(" 1997-04-01"), Some(1997));
        assert_eq!(parse_year("n/a"), None);
    }

    #[test]
    fn test_decodes_wav_bytes() {
        let mut encoder = WavEncoder::new(8000, 2, BitDepth::I16);
        encoder.write_samples(&[0.0, 0.5, -0.5, 0.25].repeat(100));
        let bytes = encoder.finish().unwrap();

        let decoded = SymphoniaDecoder::new().decode(&bytes, Some("wav")).unwrap();
        assert_eq!(decoded.sample_rate, 8000);
        assert_eq!(decoded.planes.len(), 2);
        assert_eq!(decoded.planes[0].len(), 200);
        assert!((decoded.planes[1][0] - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_garbage_is_an_error() {
        let result = SymphoniaDecoder::new().decode(&[0xFF, 0xFB, 0x90, 0x00], Some("mp3"));
        assert!(result.is_err());
    }
}
