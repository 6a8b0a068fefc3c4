//! NDJSON framing for both stdio streams.
//!
//! The client channel and the agent runtime channel are both
//! newline-delimited JSON. [`NdjsonCodec`] wraps
//! [`tokio_util::codec::LinesCodec`] with a 16 MiB line cap sized for
//! prompts that carry inline base64 images.
//!
//! Oversized lines and lines that are not valid UTF-8 decode to
//! [`AppError::Acp`], which readers treat as skippable. Only real I/O
//! failures surface as [`AppError::Io`].

use std::io;

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder, LinesCodec, LinesCodecError};

use crate::{AppError, Result};

/// Maximum accepted line length.
pub const MAX_LINE_BYTES: usize = 16 * 1024 * 1024;

/// Line codec used with [`tokio_util::codec::FramedRead`] and
/// [`tokio_util::codec::FramedWrite`].
///
/// Decoding past [`MAX_LINE_BYTES`] yields
/// [`AppError::Acp`]`("line too long: …")`; the codec then discards the rest
/// of the offending line and resumes at the next one. A line with invalid
/// UTF-8 has already been consumed when it is reported, so decoding also
/// resumes cleanly after it.
#[derive(Debug)]
pub struct NdjsonCodec(LinesCodec);

impl NdjsonCodec {
    /// Create a codec with the default [`MAX_LINE_BYTES`] limit.
    #[must_use]
    pub fn new() -> Self {
        Self(LinesCodec::new_with_max_length(MAX_LINE_BYTES))
    }
}

impl Default for NdjsonCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for NdjsonCodec {
    type Item = String;
    type Error = AppError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.0.decode(src).map_err(map_codec_error)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.0.decode_eof(src).map_err(map_codec_error)
    }
}

impl Encoder<String> for NdjsonCodec {
    type Error = AppError;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<()> {
        self.0.encode(item, dst).map_err(map_codec_error)
    }
}

fn map_codec_error(e: LinesCodecError) -> AppError {
    match e {
        LinesCodecError::MaxLineLengthExceeded => {
            AppError::Acp(format!("line too long: exceeded {MAX_LINE_BYTES} bytes"))
        }
        LinesCodecError::Io(io_err) if io_err.kind() == io::ErrorKind::InvalidData => {
            AppError::Acp(format!("invalid utf-8: {io_err}"))
        }
        LinesCodecError::Io(io_err) => AppError::Io(io_err.to_string()),
    }
}
