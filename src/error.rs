//! Error Types

use std::fmt;
use thiserror::Error;

/// Boxed cause carried by decode/encode/convert errors
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Stage of a conversion that produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Decode,
    Encode,
    Convert,
    Validate,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Decode => "decode",
            Step::Encode => "encode",
            Step::Convert => "convert",
            Step::Validate => "validate",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Main error type
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Validation error{}: {message}", fmt_format(.format))]
    Validation {
        message: String,
        format: Option<String>,
    },

    #[error("Decode error{}: {message}", fmt_format(.format))]
    Decode {
        message: String,
        format: Option<String>,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Encode error{}: {message}", fmt_format(.format))]
    Encode {
        message: String,
        format: Option<String>,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Convert error{}: {message}", fmt_format(.format))]
    Convert {
        message: String,
        format: Option<String>,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Config error: {message}")]
    Config { message: String },
}

fn fmt_format(format: &Option<String>) -> String {
    format.as_deref().map(|f| format!(" [{}]", f)).unwrap_or_default()
}

impl AudioError {
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation { message: msg.into(), format: None }
    }

    pub fn decode<S: Into<String>>(msg: S) -> Self {
        Self::Decode { message: msg.into(), format: None, source: None }
    }

    pub fn encode<S: Into<String>>(msg: S) -> Self {
        Self::Encode { message: msg.into(), format: None, source: None }
    }

    pub fn convert<S: Into<String>>(msg: S) -> Self {
        Self::Convert { message: msg.into(), format: None, source: None }
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config { message: msg.into() }
    }

    /// Attach the format (extension or `"in->out"` pair) the error relates to
    pub fn with_format<S: Into<String>>(mut self, fmt: S) -> Self {
        match &mut self {
            Self::Validation { format, .. }
            | Self::Decode { format, .. }
            | Self::Encode { format, .. }
            | Self::Convert { format, .. } => *format = Some(fmt.into()),
            Self::Config { .. } => {}
        }
        self
    }

    /// Attach the underlying cause. Validation and config errors carry no cause.
    pub fn with_source<E: Into<BoxError>>(mut self, err: E) -> Self {
        match &mut self {
            Self::Decode { source, .. }
            | Self::Encode { source, .. }
            | Self::Convert { source, .. } => *source = Some(err.into()),
            Self::Validation { .. } | Self::Config { .. } => {}
        }
        self
    }

    pub fn step(&self) -> Step {
        match self {
            Self::Validation { .. } | Self::Config { .. } => Step::Validate,
            Self::Decode { .. } => Step::Decode,
            Self::Encode { .. } => Step::Encode,
            Self::Convert { .. } => Step::Convert,
        }
    }

    pub fn format(&self) -> Option<&str> {
        match self {
            Self::Validation { format, .. }
            | Self::Decode { format, .. }
            | Self::Encode { format, .. }
            | Self::Convert { format, .. } => format.as_deref(),
            Self::Config { .. } => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

pub type Result<T> = std::result::Result<T, AudioError>;
