//! DSP stages applied between decode and encode

pub mod batch;
pub mod mix;
pub mod resample;

pub use batch::{BatchConverter, BatchItem, BatchReport};
pub use mix::mix_channels;
pub use resample::resample;

use std::borrow::Cow;

use log::debug;

use crate::audio::PcmBuffer;
use crate::config::ConvertOptions;
use crate::error::Result;

/// Resample, then mix channels, to the targets in `options`.
///
/// Missing targets default to the buffer's own rate and channel count; a stage
/// whose target already matches is skipped. Metadata survives only when
/// `preserve_metadata` is set. When nothing needs to change the input is
/// returned borrowed.
pub fn process_pcm<'a>(pcm: &'a PcmBuffer, options: &ConvertOptions) -> Result<Cow<'a, PcmBuffer>> {
    let target_rate = options.sample_rate.unwrap_or(pcm.sample_rate());
    let target_channels = options.channels.unwrap_or(pcm.channels());
    let keep_metadata = options.preserve_metadata;

    let resampled = if pcm.sample_rate() != target_rate {
        debug!("Resampling: {}Hz -> {}Hz", pcm.sample_rate(), target_rate);
        Some(resample(pcm, target_rate)?)
    } else {
        None
    };
    let current = resampled.as_ref().unwrap_or(pcm);

    let mixed = if current.channels() != target_channels {
        debug!("Mixing channels: {} -> {}", current.channels(), target_channels);
        Some(mix_channels(current, target_channels)?)
    } else {
        None
    };

    let processed = match (mixed, resampled) {
        (Some(m), _) => m,
        (None, Some(r)) => r,
        (None, None) if keep_metadata || pcm.metadata().is_none() => {
            return Ok(Cow::Borrowed(pcm));
        }
        (None, None) => pcm.clone(),
    };

    let metadata = if keep_metadata { pcm.metadata().cloned() } else { None };
    Ok(Cow::Owned(processed.with_metadata(metadata)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioMetadata;

    fn tagged(samples: Vec<f32>, rate: u32, channels: u16) -> PcmBuffer {
        let meta = AudioMetadata {
            title: Some("Track".into()),
            ..Default::default()
        };
        PcmBuffer::new(samples, rate, channels).unwrap().with_metadata(Some(meta))
    }

    #[test]
    fn test_defaults_keep_source_shape() {
        let pcm = tagged(vec![0.1, 0.2, 0.3, 0.4], 8000, 2);
        let out = process_pcm(&pcm, &ConvertOptions::new()).unwrap();
        assert_eq!(out.samples(), pcm.samples());
        assert_eq!(out.sample_rate(), 8000);
        assert_eq!(out.channels(), 2);
        assert!(out.metadata().is_none());
    }

    #[test]
    fn test_resample_then_mix() {
        let pcm = tagged(vec![0.5; 8], 8000, 1);
        let options = ConvertOptions::new().with_sample_rate(4000).with_channels(2);
        let out = process_pcm(&pcm, &options).unwrap();
        assert_eq!(out.sample_rate(), 4000);
        assert_eq!(out.channels(), 2);
        assert_eq!(out.frames(), 4);
        assert!(out.samples().iter().all(|&s| s == 0.5));
    }

    #[test]
    fn test_metadata_kept_on_request() {
        let pcm = tagged(vec![0.0; 4], 8000, 1);
        let options = ConvertOptions::new().with_preserve_metadata(true).with_channels(2);
        let out = process_pcm(&pcm, &options).unwrap();
        assert_eq!(out.metadata().and_then(|m| m.title.as_deref()), Some("Track"));
    }

    #[test]
    fn test_no_op_borrows_input() {
        let plain = PcmBuffer::new(vec![0.1, 0.2], 8000, 1).unwrap();
        let options = ConvertOptions::new().with_sample_rate(8000).with_channels(1);
        assert!(matches!(process_pcm(&plain, &options).unwrap(), Cow::Borrowed(_)));

        let pcm = tagged(vec![0.1, 0.2], 8000, 1);
        let kept = process_pcm(&pcm, &ConvertOptions::new().with_preserve_metadata(true)).unwrap();
        assert!(matches!(kept, Cow::Borrowed(_)));

        // Dropping tags needs a buffer of its own
        let dropped = process_pcm(&pcm, &ConvertOptions::new()).unwrap();
        assert!(matches!(dropped, Cow::Owned(_)));
        assert!(dropped.metadata().is_none());
        assert!(matches!(process_pcm(&dropped, &ConvertOptions::new()).unwrap(), Cow::Borrowed(_)));
    }
}
