//! Sample rate conversion by linear interpolation

use ndarray::{Array1, Array2, ArrayView1};
use crate::audio::PcmBuffer;
use crate::error::{AudioError, Result};

/// Number of output frames for a rate change: `ceil(frames * to / from)`
pub fn output_frames(input_frames: usize, from_rate: u32, to_rate: u32) -> usize {
    let ratio = to_rate as f64 / from_rate as f64;
    (input_frames as f64 * ratio).ceil() as usize
}

/// Resample every channel of `pcm` to `target_rate`.
///
/// Returns a copy with the same content when the rates already match.
pub fn resample(pcm: &PcmBuffer, target_rate: u32) -> Result<PcmBuffer> {
    if target_rate == 0 {
        return Err(AudioError::validation("Target sample rate must be greater than 0"));
    }
    if pcm.sample_rate() == target_rate {
        return Ok(pcm.clone());
    }

    let ratio = target_rate as f64 / pcm.sample_rate() as f64;
    let new_length = output_frames(pcm.frames(), pcm.sample_rate(), target_rate);
    let input = pcm.frame_view()?;

    let mut output = Array2::<f32>::zeros((new_length, pcm.channels() as usize));
    for (channel, mut out_column) in output.columns_mut().into_iter().enumerate() {
        out_column.assign(&resample_channel(input.column(channel), new_length, ratio));
    }

    let resampled = PcmBuffer::new(output.into_raw_vec(), target_rate, pcm.channels())?;
    Ok(resampled.with_metadata(pcm.metadata().cloned()))
}

fn resample_channel(data: ArrayView1<f32>, new_length: usize, ratio: f64) -> Array1<f32> {
    let old_length = data.len();
    let mut new_data = Array1::zeros(new_length);
    if old_length == 0 {
        return new_data;
    }

    let last = old_length - 1;
    for (i, out) in new_data.iter_mut().enumerate() {
        let pos = i as f64 / ratio;
        let left = (pos.floor() as usize).min(last);
        let right = (left + 1).min(last);
        let fraction = (pos - left as f64) as f32;

        *out = data[left] + fraction * (data[right] - data[left]);
    }

    new_data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resample_same_rate() {
        let pcm = PcmBuffer::new(vec![0.1, 0.2, 0.3], 16000, 1).unwrap();
        let result = resample(&pcm, 16000).unwrap();
        assert_eq!(result, pcm);
    }

    #[test]
    fn test_resample_upsample() {
        let pcm = PcmBuffer::new(vec![0.0, 1.0], 8000, 1).unwrap();
        let result = resample(&pcm, 16000).unwrap();
        assert_eq!(result.sample_rate(), 16000);
        assert_eq!(result.samples(), &[0.0, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn test_resample_downsample_stereo_keeps_channels_apart() {
        let samples = vec![0.0, -0.0, 0.2, -0.2, 0.4, -0.4, 0.6, -0.6];
        let pcm = PcmBuffer::new(samples, 4, 2).unwrap();
        let result = resample(&pcm, 2).unwrap();
        assert_eq!(result.frames(), 2);
        assert_eq!(result.samples(), &[0.0, 0.0, 0.4, -0.4]);
    }

    #[test]
    fn test_output_length_is_ceiling() {
        assert_eq!(output_frames(44100, 44100, 22050), 22050);
        assert_eq!(output_frames(3, 3, 2), 2);
        assert_eq!(output_frames(5, 44100, 48000), 6);
        assert_eq!(output_frames(0, 8000, 16000), 0);

        let pcm = PcmBuffer::new(vec![0.25; 2 * 101], 44100, 2).unwrap();
        let result = resample(&pcm, 48000).unwrap();
        assert_eq!(result.frames(), output_frames(101, 44100, 48000));
        assert!(result.samples().iter().all(|&s| (s - 0.25).abs() < 1e-6));
    }

    #[test]
    fn test_resample_empty_buffer() {
        let pcm = PcmBuffer::new(vec![], 8000, 2).unwrap();
        let result = resample(&pcm, 16000).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.sample_rate(), 16000);
    }

    #[test]
    fn test_resample_rejects_zero_rate() {
        let pcm = PcmBuffer::new(vec![0.0], 8000, 1).unwrap();
        assert!(resample(&pcm, 0).is_err());
    }
}
