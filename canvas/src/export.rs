//! Raster export: encoding formats, data-URL decoding and artifact naming.

#[cfg(test)]
#[path = "export_test.rs"]
mod export_test;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

/// Quality used for the saved meme image.
pub const EXPORT_QUALITY: f64 = 1.0;

/// Image encodings the canvas element can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RasterFormat {
    #[default]
    Png,
    Jpeg,
}

impl RasterFormat {
    #[must_use]
    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("canvas encode failed: {0}")]
    Canvas(String),
    #[error("canvas produced `{found}` instead of `{expected}`")]
    UnexpectedFormat { expected: &'static str, found: String },
    #[error("malformed data URL")]
    MalformedDataUrl,
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Decode a `data:<mime>;base64,<payload>` URL into raw bytes.
///
/// Browsers fall back to PNG for unsupported types, so the reported MIME is
/// checked against `format`.
///
/// # Errors
///
/// Returns [`RasterError`] for a non-base64 URL, an unexpected MIME type, or a
/// corrupt payload.
pub fn decode_data_url(url: &str, format: RasterFormat) -> Result<Vec<u8>, RasterError> {
    let rest = url.strip_prefix("data:").ok_or(RasterError::MalformedDataUrl)?;
    let (header, payload) = rest.split_once(',').ok_or(RasterError::MalformedDataUrl)?;
    let mime = header.strip_suffix(";base64").ok_or(RasterError::MalformedDataUrl)?;
    if mime != format.mime() {
        return Err(RasterError::UnexpectedFormat { expected: format.mime(), found: mime.to_string() });
    }
    Ok(STANDARD.decode(payload)?)
}

/// Download name for an exported meme: `meme-<epoch-ms>.<ext>`.
#[must_use]
pub fn export_file_name(epoch_ms: u64, format: RasterFormat) -> String {
    format!("meme-{epoch_ms}.{}", format.extension())
}

/// A flattened meme ready to download or upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedImage {
    pub file_name: String,
    pub format: RasterFormat,
    pub bytes: Vec<u8>,
}

impl ExportedImage {
    #[must_use]
    pub fn new(epoch_ms: u64, format: RasterFormat, bytes: Vec<u8>) -> Self {
        Self { file_name: export_file_name(epoch_ms, format), format, bytes }
    }

    #[must_use]
    pub fn mime(&self) -> &'static str {
        self.format.mime()
    }
}
