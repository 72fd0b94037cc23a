//! Channel-count conversion

use ndarray::Array2;
use crate::audio::PcmBuffer;
use crate::error::{AudioError, Result};

/// Convert `pcm` to `target_channels` channels.
///
/// Downmix: output channel `c` is the mean of every input channel `fc` with
/// `fc % target == c` (stereo -> mono averages left and right).
/// Upmix: output channel `c` copies input channel `c % source` (mono -> stereo
/// duplicates).
pub fn mix_channels(pcm: &PcmBuffer, target_channels: u16) -> Result<PcmBuffer> {
    if target_channels == 0 {
        return Err(AudioError::validation("Target channel count must be greater than 0"));
    }
    let from = pcm.channels() as usize;
    let to = target_channels as usize;
    if from == to {
        return Ok(pcm.clone());
    }

    let input = pcm.frame_view()?;
    let mut output = Array2::<f32>::zeros((pcm.frames(), to));

    if from > to {
        for (c, mut out_column) in output.columns_mut().into_iter().enumerate() {
            let sources: Vec<usize> = (c..from).step_by(to).collect();
            let count = sources.len() as f32;
            for (frame, out) in out_column.iter_mut().enumerate() {
                let sum: f32 = sources.iter().map(|&fc| input[[frame, fc]]).sum();
                *out = sum / count;
            }
        }
    } else {
        for (c, mut out_column) in output.columns_mut().into_iter().enumerate() {
            out_column.assign(&input.column(c % from));
        }
    }

    let mixed = PcmBuffer::new(output.into_raw_vec(), pcm.sample_rate(), target_channels)?;
    Ok(mixed.with_metadata(pcm.metadata().cloned()))
}
