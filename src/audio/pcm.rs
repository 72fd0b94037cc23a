//! Canonical PCM buffer shared by every codec and DSP stage

use std::collections::BTreeMap;

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::{AudioError, Result};

/// Descriptive tags carried alongside decoded audio
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub year: Option<i32>,
    pub genre: Option<String>,
    pub duration_secs: Option<f64>,
    /// Tags without a dedicated field, keyed by their container name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl AudioMetadata {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.artist.is_none()
            && self.album.is_none()
            && self.year.is_none()
            && self.genre.is_none()
            && self.duration_secs.is_none()
            && self.extra.is_empty()
    }
}

/// Interleaved floating-point audio.
///
/// Samples are stored frame by frame (`frame * channels + channel`). The
/// buffer is never resized in place: DSP stages build a new buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
    metadata: Option<AudioMetadata>,
}

impl PcmBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Result<Self> {
        if sample_rate == 0 {
            return Err(AudioError::validation("Sample rate must be greater than 0"));
        }
        if channels == 0 {
            return Err(AudioError::validation("Channel count must be greater than 0"));
        }
        if samples.len() % channels as usize != 0 {
            return Err(AudioError::validation(format!(
                "Sample count {} is not a multiple of {} channels",
                samples.len(),
                channels
            )));
        }

        Ok(Self {
            samples,
            sample_rate,
            channels,
            metadata: None,
        })
    }

    /// Build a buffer from one sample vector per channel, clamping to [-1, 1].
    pub fn from_planar(planes: &[Vec<f32>], sample_rate: u32) -> Result<Self> {
        let channels = u16::try_from(planes.len())
            .map_err(|_| AudioError::validation(format!("Too many channels: {}", planes.len())))?;
        Self::new(interleave(planes)?, sample_rate, channels)
    }

    pub fn with_metadata(mut self, metadata: Option<AudioMetadata>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn metadata(&self) -> Option<&AudioMetadata> {
        self.metadata.as_ref()
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Frames as rows, channels as columns, borrowing the interleaved storage
    pub fn frame_view(&self) -> Result<ArrayView2<'_, f32>> {
        ArrayView2::from_shape((self.frames(), self.channels as usize), &self.samples)
            .map_err(|e| AudioError::validation(format!("Invalid PCM layout: {}", e)))
    }

    /// Split into one vector per channel
    pub fn deinterleave(&self) -> Result<Vec<Vec<f32>>> {
        Ok(self.frame_view()?.columns().into_iter().map(|c| c.to_vec()).collect())
    }
}

/// Interleave per-channel planes, clamping every sample to [-1, 1].
///
/// All planes must have the same length.
pub fn interleave(planes: &[Vec<f32>]) -> Result<Vec<f32>> {
    let Some(first) = planes.first() else {
        return Err(AudioError::validation("Cannot interleave zero channels"));
    };
    let frames = first.len();
    if let Some(bad) = planes.iter().position(|p| p.len() != frames) {
        return Err(AudioError::validation(format!(
            "Channel {} has {} samples, expected {}",
            bad,
            planes[bad].len(),
            frames
        )));
    }

    let mut out = Array2::<f32>::zeros((frames, planes.len()));
    for (mut column, plane) in out.columns_mut().into_iter().zip(planes) {
        for (dst, &src) in column.iter_mut().zip(plane) {
            *dst = clamp_sample(src);
        }
    }
    Ok(out.into_raw_vec())
}

/// Clamp to the canonical range; non-finite values become silence
pub fn clamp_sample(sample: f32) -> f32 {
    if sample.is_finite() { sample.clamp(-1.0, 1.0) } else { 0.0 }
}
