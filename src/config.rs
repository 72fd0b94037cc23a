//! Configuration management for audio conversion

use crate::audio::BitDepth;
use crate::error::{AudioError, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const MAX_SAMPLE_RATE: u32 = 384_000;
pub const DEFAULT_BITRATE_KBPS: u32 = 128;
pub const DEFAULT_QUALITY: f32 = 0.5;

/// Per-conversion options. Every field is optional; `None` keeps the
/// source value (rate, channels) or the codec default (depth, bitrate, quality).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
    /// 8, 16 or 32
    pub bit_depth: Option<u16>,
    /// kbps, lossy encoders only
    pub bitrate: Option<u32>,
    /// 0.0 - 1.0
    pub quality: Option<f32>,
    pub preserve_metadata: bool,
}

impl ConvertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = Some(sample_rate);
        self
    }

    pub fn with_channels(mut self, channels: u16) -> Self {
        self.channels = Some(channels);
        self
    }

    pub fn with_bit_depth(mut self, bits: u16) -> Self {
        self.bit_depth = Some(bits);
        self
    }

    pub fn with_bitrate(mut self, kbps: u32) -> Self {
        self.bitrate = Some(kbps);
        self
    }

    pub fn with_quality(mut self, quality: f32) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn with_preserve_metadata(mut self, preserve: bool) -> Self {
        self.preserve_metadata = preserve;
        self
    }

    /// Requested depth, 16-bit when unset
    pub fn bit_depth(&self) -> Result<BitDepth> {
        self.bit_depth.map_or(Ok(BitDepth::default()), BitDepth::try_from)
    }

    pub fn bitrate_or_default(&self) -> u32 {
        self.bitrate.unwrap_or(DEFAULT_BITRATE_KBPS)
    }

    pub fn quality_or_default(&self) -> f32 {
        self.quality.unwrap_or(DEFAULT_QUALITY)
    }

    /// Fields set in `overrides` replace the ones in `self`
    pub fn merged_with(&self, overrides: &ConvertOptions) -> ConvertOptions {
        ConvertOptions {
            sample_rate: overrides.sample_rate.or(self.sample_rate),
            channels: overrides.channels.or(self.channels),
            bit_depth: overrides.bit_depth.or(self.bit_depth),
            bitrate: overrides.bitrate.or(self.bitrate),
            quality: overrides.quality.or(self.quality),
            preserve_metadata: overrides.preserve_metadata || self.preserve_metadata,
        }
    }

    /// Validate option values
    pub fn validate(&self) -> Result<()> {
        if let Some(rate) = self.sample_rate {
            if rate == 0 {
                return Err(AudioError::validation("Sample rate must be greater than 0"));
            }
            if rate > MAX_SAMPLE_RATE {
                return Err(AudioError::validation(format!(
                    "Sample rate cannot exceed {} Hz",
                    MAX_SAMPLE_RATE
                )));
            }
        }

        if self.channels == Some(0) {
            return Err(AudioError::validation("Channel count must be greater than 0"));
        }

        self.bit_depth()?;

        if self.bitrate == Some(0) {
            return Err(AudioError::validation("Bitrate must be greater than 0"));
        }

        if let Some(q) = self.quality {
            if !(0.0..=1.0).contains(&q) {
                return Err(AudioError::validation("Quality must be in range [0.0, 1.0]"));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Parallel conversions in batch mode
    pub jobs: usize,
    pub verbose: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            jobs: utils::cpu_count().min(4),
            verbose: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub convert: ConvertOptions,
    pub runtime: RuntimeConfig,
}

impl Config {
    pub fn jobs(&self) -> usize {
        self.runtime.jobs
    }

    pub fn verbose(&self) -> bool {
        self.runtime.verbose
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.convert
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "audioconv", about = "Audio Format Converter", version, author)]
pub struct Args {
    #[arg(help = "Input audio files")]
    pub inputs: Vec<PathBuf>,

    #[arg(short = 'o', long = "output", help = "Output file path (single input)")]
    pub output: Option<PathBuf>,

    #[arg(short = 'd', long = "output-dir", help = "Output directory (several inputs)")]
    pub output_dir: Option<PathBuf>,

    #[arg(short = 'f', long = "format", help = "Target format (defaults to the output extension, then wav)")]
    pub format: Option<String>,

    #[arg(short = 'r', long = "sample-rate", help = "Target sample rate (Hz)")]
    pub sample_rate: Option<u32>,

    #[arg(short = 'n', long = "channels", help = "Target channel count")]
    pub channels: Option<u16>,

    #[arg(short = 'b', long = "bit-depth", help = "PCM bit depth (8, 16 or 32)")]
    pub bit_depth: Option<u16>,

    #[arg(long = "bitrate", help = "Lossy encoder bitrate (kbps)")]
    pub bitrate: Option<u32>,

    #[arg(short = 'q', long = "quality", help = "Lossy encoder quality (0.0 - 1.0)")]
    pub quality: Option<f32>,

    #[arg(long = "preserve-metadata", help = "Carry tags from the source to the encoder")]
    pub preserve_metadata: bool,

    #[arg(short = 'j', long = "jobs", help = "Parallel conversions in batch mode")]
    pub jobs: Option<usize>,

    #[arg(short = 'c', long = "config", help = "Config file path (TOML format)")]
    pub config_file: Option<PathBuf>,

    #[arg(long = "write-config", help = "Write the default config to this path and exit")]
    pub write_config: Option<PathBuf>,

    #[arg(long = "list-formats", help = "List supported formats and exit")]
    pub list_formats: bool,

    #[arg(short = 'v', long = "verbose", help = "Enable verbose output mode")]
    pub verbose: bool,
}

impl Args {
    /// Options given on the command line
    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            sample_rate: self.sample_rate,
            channels: self.channels,
            bit_depth: self.bit_depth,
            bitrate: self.bitrate,
            quality: self.quality,
            preserve_metadata: self.preserve_metadata,
        }
    }
}

impl Config {
    /// Create config from command line arguments
    pub fn from_args() -> Result<Self> {
        let args = Args::parse();
        Self::from_args_and_config(&args)
    }

    /// Create config from command line arguments and config file
    pub fn from_args_and_config(args: &Args) -> Result<Self> {
        let mut config = if let Some(config_path) = &args.config_file {
            Self::from_file(config_path)?
        } else {
            Self::default()
        };

        // Only arguments actually given override the file
        config.convert = config.convert.merged_with(&args.convert_options());
        if let Some(jobs) = args.jobs {
            config.runtime.jobs = jobs;
        }
        config.runtime.verbose |= args.verbose;

        config.validate()?;

        Ok(config)
    }

    /// Load config from TOML config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AudioError::config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| AudioError::config(format!("Failed to parse config file: {}", e)))
    }

    /// Validate configuration parameter validity
    pub fn validate(&self) -> Result<()> {
        self.convert
            .validate()
            .map_err(|e| AudioError::config(e.to_string()))?;

        if self.runtime.jobs == 0 {
            return Err(AudioError::config("Job count must be greater than 0"));
        }
        if self.runtime.jobs > utils::cpu_count() * 2 {
            return Err(AudioError::config("Job count cannot exceed 2x logical CPU cores"));
        }

        Ok(())
    }

    /// Save config to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| AudioError::config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| AudioError::config(format!("Failed to write config file: {}", e)))
    }

    /// Create default config file
    pub fn create_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        Self::default().save_to_file(path)
    }
}

pub mod utils {
    pub fn cpu_count() -> usize {
        num_cpus::get()
    }

    /// Lowercased extension without the dot
    pub fn format_from_path(path: &std::path::Path) -> Option<String> {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.convert, ConvertOptions::default());
        assert!(config.jobs() >= 1);
        assert!(!config.verbose());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_options_validation() {
        assert!(ConvertOptions::new().validate().is_ok());
        assert!(ConvertOptions::new().with_sample_rate(0).validate().is_err());
        assert!(ConvertOptions::new().with_sample_rate(1_000_000).validate().is_err());
        assert!(ConvertOptions::new().with_channels(0).validate().is_err());
        assert!(ConvertOptions::new().with_bitrate(0).validate().is_err());
        assert!(ConvertOptions::new().with_quality(1.5).validate().is_err());
        assert!(ConvertOptions::new().with_quality(1.0).validate().is_ok());

        let err = ConvertOptions::new().with_bit_depth(24).validate().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_option_defaults() {
        let options = ConvertOptions::new();
        assert_eq!(options.bit_depth().unwrap(), BitDepth::I16);
        assert_eq!(options.bitrate_or_default(), 128);
        assert_eq!(options.quality_or_default(), 0.5);
    }

    #[test]
    fn test_merge_overrides_field_by_field() {
        let base = ConvertOptions::new().with_sample_rate(44100).with_bit_depth(8);
        let overrides = ConvertOptions::new().with_sample_rate(22050).with_channels(1);
        let merged = base.merged_with(&overrides);
        assert_eq!(merged.sample_rate, Some(22050));
        assert_eq!(merged.channels, Some(1));
        assert_eq!(merged.bit_depth, Some(8));
    }

    #[test]
    fn test_config_file_operations() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.convert = ConvertOptions::new().with_sample_rate(48000).with_quality(0.8);

        assert!(config.save_to_file(&config_path).is_ok());
        assert!(config_path.exists());

        let loaded_config = Config::from_file(&config_path).unwrap();
        assert_eq!(loaded_config.convert, config.convert);
        assert_eq!(loaded_config.jobs(), config.jobs());
    }

    #[test]
    fn test_args_override_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, "[convert]\nsample_rate = 8000\nbit_depth = 8\n").unwrap();

        let args = Args::parse_from([
            "audioconv",
            "in.wav",
            "-c",
            config_path.to_str().unwrap(),
            "-r",
            "16000",
        ]);
        let config = Config::from_args_and_config(&args).unwrap();
        assert_eq!(config.convert.sample_rate, Some(16000));
        assert_eq!(config.convert.bit_depth, Some(8));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let args = Args::parse_from(["audioconv", "in.wav", "-b", "24"]);
        assert!(Config::from_args_and_config(&args).is_err());

        let args = Args::parse_from(["audioconv", "in.wav", "-j", "0"]);
        assert!(Config::from_args_and_config(&args).is_err());
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(utils::format_from_path(Path::new("a/b.WAV")), Some("wav".into()));
        assert_eq!(utils::format_from_path(Path::new("noext")), None);
    }
}
