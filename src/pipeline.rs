//! Conversion pipeline: decode -> DSP -> encode

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::audio::PcmBuffer;
use crate::codec::{Codec, Registry};
use crate::config::utils::format_from_path;
use crate::config::ConvertOptions;
use crate::error::{AudioError, Result};
use crate::processing::process_pcm;

/// Converts between any two formats known to its registry
#[derive(Clone)]
pub struct Pipeline {
    registry: Arc<Registry>,
}

impl Pipeline {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Pipeline over the built-in codecs
    pub fn with_builtin() -> Self {
        Self::new(Arc::new(Registry::with_builtin()))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Convert an in-memory buffer from `input_format` to `output_format`
    pub fn convert_buffer(
        &self,
        input: &[u8],
        input_format: &str,
        output_format: &str,
        options: &ConvertOptions,
    ) -> Result<Vec<u8>> {
        self.converter(input_format, output_format, options)?.convert(input)
    }

    /// Bind formats and options once; every check happens here, before any
    /// input is seen.
    pub fn converter(
        &self,
        input_format: &str,
        output_format: &str,
        options: &ConvertOptions,
    ) -> Result<BoundConverter> {
        let decoder = self.resolve(input_format, "input")?;
        let encoder = self.resolve(output_format, "output")?;
        options.validate()?;

        Ok(BoundConverter {
            decoder,
            encoder,
            route: format!("{}->{}", input_format, output_format),
            options: options.clone(),
        })
    }

    /// Convert a file; the input format comes from its extension
    pub fn convert_file(
        &self,
        input_path: &Path,
        output_path: &Path,
        target_format: &str,
        options: &ConvertOptions,
    ) -> Result<ConversionSummary> {
        let start = Instant::now();
        let input_format = format_from_path(input_path).ok_or_else(|| {
            AudioError::validation(format!(
                "Cannot determine input format of {}",
                input_path.display()
            ))
        })?;

        let converter = self.converter(&input_format, target_format, options)?;

        let input = std::fs::read(input_path).map_err(|e| {
            AudioError::convert(format!("Failed to read {}", input_path.display()))
                .with_format(converter.route())
                .with_source(e)
        })?;

        let (output, pcm) = converter.run(&input)?;

        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                AudioError::convert(format!("Cannot create output directory {}", parent.display()))
                    .with_format(converter.route())
                    .with_source(e)
            })?;
        }
        std::fs::write(output_path, &output).map_err(|e| {
            AudioError::convert(format!("Failed to write {}", output_path.display()))
                .with_format(converter.route())
                .with_source(e)
        })?;

        let summary = ConversionSummary {
            input_path: input_path.to_path_buf(),
            output_path: output_path.to_path_buf(),
            input_format,
            output_format: target_format.to_ascii_lowercase(),
            input_bytes: input.len(),
            output_bytes: output.len(),
            duration_secs: pcm.duration_secs(),
            elapsed: start.elapsed(),
        };

        info!(
            "Converted {} -> {}, saved to {} ({:.2} KB)",
            summary.input_format,
            summary.output_format,
            output_path.display(),
            summary.output_bytes as f64 / 1024.0
        );

        Ok(summary)
    }

    fn resolve(&self, format: &str, role: &str) -> Result<Arc<dyn Codec>> {
        self.registry.get(format).map_err(|_| {
            AudioError::validation(format!("Unsupported {} format: {}", role, format))
                .with_format(format)
        })
    }
}

/// Reusable converter for one (input, output, options) triple
#[derive(Clone)]
pub struct BoundConverter {
    decoder: Arc<dyn Codec>,
    encoder: Arc<dyn Codec>,
    route: String,
    options: ConvertOptions,
}

impl BoundConverter {
    /// `"{input}->{output}"`
    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    pub fn convert(&self, input: &[u8]) -> Result<Vec<u8>> {
        self.run(input).map(|(bytes, _)| bytes)
    }

    /// Encoded bytes plus the buffer that was handed to the encoder
    fn run(&self, input: &[u8]) -> Result<(Vec<u8>, PcmBuffer)> {
        let decoded = self.decoder.decode(input, &self.options)?;
        debug!(
            "{}: decoded {:.2}s, {}Hz, {}ch",
            self.route,
            decoded.duration_secs(),
            decoded.sample_rate(),
            decoded.channels()
        );

        // Reuse the decoded buffer when no stage had to run
        let owned = match process_pcm(&decoded, &self.options)? {
            Cow::Owned(processed) => Some(processed),
            Cow::Borrowed(_) => None,
        };
        let processed = owned.unwrap_or(decoded);

        let encoded = self.encoder.encode(&processed, &self.options)?;
        debug!("{}: encoded {} bytes", self.route, encoded.len());

        Ok((encoded, processed))
    }
}

/// Outcome of a file conversion
#[derive(Debug, Clone)]
pub struct ConversionSummary {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub input_format: String,
    pub output_format: String,
    pub input_bytes: usize,
    pub output_bytes: usize,
    /// Duration of the encoded audio
    pub duration_secs: f64,
    pub elapsed: Duration,
}

impl ConversionSummary {
    /// Processing time relative to audio duration
    pub fn real_time_factor(&self) -> f64 {
        if self.duration_secs > 0.0 {
            self.elapsed.as_secs_f64() / self.duration_secs
        } else {
            0.0
        }
    }
}
