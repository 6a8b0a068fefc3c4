//! Best-effort image re-encoding capability.

use std::fmt::{Display, Formatter};
use std::io::Cursor;

use image::ImageFormat;

/// Format an unsupported image is re-encoded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageTarget {
    /// Lossless PNG; keeps transparency.
    Png,
}

impl ImageTarget {
    /// MIME type of encoded output.
    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
        }
    }

    fn format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
        }
    }
}

/// Re-encoding failure. Never surfaced to the client; the materializer
/// falls back to spilling the raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeError(pub String);

impl Display for EncodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "image encode failed: {}", self.0)
    }
}

impl std::error::Error for EncodeError {}

/// Converts image bytes of any decodable format into `target`.
pub trait ImageEncoder: Send + Sync {
    /// Decode `bytes` and re-encode them as `target`.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError`] when the input cannot be decoded or encoded.
    fn encode(&self, bytes: &[u8], target: ImageTarget) -> Result<Vec<u8>, EncodeError>;
}

/// [`ImageEncoder`] backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterEncoder;

impl ImageEncoder for RasterEncoder {
    fn encode(&self, bytes: &[u8], target: ImageTarget) -> Result<Vec<u8>, EncodeError> {
        let decoded =
            image::load_from_memory(bytes).map_err(|err| EncodeError(err.to_string()))?;
        let mut out = Cursor::new(Vec::new());
        decoded
            .write_to(&mut out, target.format())
            .map_err(|err| EncodeError(err.to_string()))?;
        Ok(out.into_inner())
    }
}
