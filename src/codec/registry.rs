//! Extension -> codec lookup

use std::collections::BTreeMap;
use std::sync::Arc;

use log::debug;

use crate::codec::{Codec, CompressedCodec, DecodeBackend, EncodeBackend, RawPcmCodec, WavCodec};
use crate::error::{AudioError, Result};

/// Case-insensitive map from file extension to codec.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Default)]
pub struct Registry {
    codecs: BTreeMap<String, Arc<dyn Codec>>,
    builtin_registered: bool,
}

impl Registry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in codecs
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register_builtin();
        registry
    }

    /// Register wav, pcm and the compressed formats this build has backends
    /// for. Safe to call more than once; only the first call registers
    /// anything.
    pub fn register_builtin(&mut self) {
        if self.builtin_registered {
            return;
        }

        self.register(builtin_wav());
        self.register(RawPcmCodec::new());
        for codec in builtin_compressed() {
            self.register(codec);
        }

        self.builtin_registered = true;
    }

    /// Index `codec` under each of its extensions; later registrations win.
    pub fn register<C: Codec + 'static>(&mut self, codec: C) {
        self.register_shared(Arc::new(codec));
    }

    pub fn register_shared(&mut self, codec: Arc<dyn Codec>) {
        for ext in codec.extensions() {
            debug!("Registering {} for .{}", codec.name(), ext);
            self.codecs.insert(ext.to_ascii_lowercase(), codec.clone());
        }
    }

    pub fn get(&self, format: &str) -> Result<Arc<dyn Codec>> {
        self.codecs
            .get(&format.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| {
                AudioError::validation(format!("Unsupported audio format: {}", format))
                    .with_format(format)
            })
    }

    pub fn contains(&self, format: &str) -> bool {
        self.codecs.contains_key(&format.to_ascii_lowercase())
    }

    /// Sorted, de-duplicated extensions
    pub fn supported_formats(&self) -> Vec<String> {
        self.codecs.keys().cloned().collect()
    }
}

fn builtin_wav() -> WavCodec {
    match builtin_decoder() {
        Some(decoder) => WavCodec::with_fallback(decoder),
        None => WavCodec::new(),
    }
}

/// Compressed formats with whatever backends this build carries; a format
/// with neither backend is left out.
fn builtin_compressed() -> Vec<CompressedCodec> {
    let decoder = builtin_decoder();
    let codecs = vec![
        (CompressedCodec::new("MP3 Codec", &["mp3"]), builtin_mp3_encoder()),
        (CompressedCodec::new("OGG Vorbis Codec", &["ogg", "oga"]), None),
        (CompressedCodec::new("FLAC Codec", &["flac"]), None),
    ];

    codecs
        .into_iter()
        .filter_map(|(mut codec, encoder)| {
            if let Some(decoder) = &decoder {
                codec = codec.with_decoder(decoder.clone());
            }
            if let Some(encoder) = encoder {
                codec = codec.with_encoder(encoder);
            }
            (codec.can_decode() || codec.can_encode()).then_some(codec)
        })
        .collect()
}

#[cfg(feature = "symphonia")]
fn builtin_decoder() -> Option<Arc<dyn DecodeBackend>> {
    Some(Arc::new(crate::codec::SymphoniaDecoder::new()))
}

#[cfg(not(feature = "symphonia"))]
fn builtin_decoder() -> Option<Arc<dyn DecodeBackend>> {
    None
}

#[cfg(feature = "mp3-encoder")]
fn builtin_mp3_encoder() -> Option<Arc<dyn EncodeBackend>> {
    Some(Arc::new(crate::codec::LameEncoder::new()))
}

#[cfg(not(feature = "mp3-encoder"))]
fn builtin_mp3_encoder() -> Option<Arc<dyn EncodeBackend>> {
    None
}
