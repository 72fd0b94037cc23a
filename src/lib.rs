//! audioconv - Audio Format Conversion Library
//!
//! Decodes any registered format into a canonical interleaved float buffer,
//! resamples and remixes it, and encodes it into the target format.

pub mod audio;
pub mod codec;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod processing;

pub use audio::{AudioMetadata, BitDepth, PcmBuffer};
pub use codec::{Codec, Registry};
pub use config::{Args, Config, ConvertOptions};
pub use error::{AudioError, Result, Step};
pub use pipeline::{BoundConverter, ConversionSummary, Pipeline};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Initialise env_logger; `RUST_LOG` wins over the verbosity flag
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .try_init()
        .ok();
}

pub fn get_library_info() -> LibraryInfo {
    LibraryInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct LibraryInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}

impl std::fmt::Display for LibraryInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} v{} - {}", self.name, self.version, self.description)
    }
}
