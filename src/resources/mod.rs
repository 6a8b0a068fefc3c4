//! Client prompt blocks → agent content blocks.
//!
//! [`ResourceMaterializer::materialize`] always yields exactly one
//! [`ContentBlock`] or fails with [`AppError::InvalidInput`]:
//!
//! - text → text, verbatim
//! - resource link → text describing the link (nothing is fetched)
//! - embedded text → text wrapped in context markers
//! - image in a supported format → inline image, payload untouched
//! - image in another format → re-encoded to PNG when possible
//! - anything else → raw bytes spilled into the cache directory, text
//!   describing the saved path
//!
//! Disk writes are synchronous `std::fs` calls.

pub mod encoder;

use std::fmt::{Debug, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, info, warn};

use crate::models::content::{ContentBlock, EmbeddedResourceContents, PromptBlock};
use crate::{AppError, Result};

use self::encoder::{ImageEncoder, ImageTarget, RasterEncoder};

/// Image MIME types the model accepts inline.
pub const SUPPORTED_IMAGE_MIME_TYPES: [&str; 4] =
    ["image/gif", "image/jpeg", "image/png", "image/webp"];

/// Instruction for the model on how to read materialized resources. Sent to
/// the runtime once per session.
pub const RESOURCE_GUIDANCE: &str = "You may encounter sections labeled as user-provided \
additional context or resources. These blocks contain files or data that the user referenced \
in their message. They may include plain text, images, code snippets, or binary content saved \
to a temporary file. Treat these blocks as part of the user's input. Read them carefully and \
use their contents when forming your reasoning or answering the query. If a block points to a \
saved file, assume it contains relevant binary data that could not be displayed directly.";

const CONVERSION_TARGET: ImageTarget = ImageTarget::Png;
const SPILL_PREFIX: &str = "embedded_resource_";
const UNKNOWN: &str = "unknown";

/// Turns client prompt blocks into agent content.
#[derive(Clone)]
pub struct ResourceMaterializer {
    cache_dir: PathBuf,
    encoder: Arc<dyn ImageEncoder>,
}

impl Debug for ResourceMaterializer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceMaterializer")
            .field("cache_dir", &self.cache_dir)
            .finish_non_exhaustive()
    }
}

impl ResourceMaterializer {
    /// Materializer spilling into `cache_dir`, re-encoding with [`RasterEncoder`].
    #[must_use]
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self::with_encoder(cache_dir, Arc::new(RasterEncoder))
    }

    /// Materializer with a custom image encoder.
    #[must_use]
    pub fn with_encoder(cache_dir: impl Into<PathBuf>, encoder: Arc<dyn ImageEncoder>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            encoder,
        }
    }

    /// Directory binary payloads are spilled into.
    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Materialize one block.
    ///
    /// # Errors
    ///
    /// - `AppError::InvalidInput` for unrecognised block types, embedded
    ///   resources with neither `text` nor `blob`, or undecodable base64.
    /// - `AppError::Io` when a spill file cannot be written.
    pub fn materialize(&self, block: &PromptBlock) -> Result<ContentBlock> {
        self.materialize_tracked(block, &mut Vec::new())
    }

    /// Materialize a whole prompt, stopping at the first failure.
    ///
    /// Files spilled for earlier blocks are removed when a later block fails.
    ///
    /// # Errors
    ///
    /// Propagates the first error from [`Self::materialize`].
    pub fn materialize_all(&self, blocks: &[PromptBlock]) -> Result<Vec<ContentBlock>> {
        let mut spilled = Vec::new();
        let mut content = Vec::with_capacity(blocks.len());
        for block in blocks {
            match self.materialize_tracked(block, &mut spilled) {
                Ok(item) => content.push(item),
                Err(err) => {
                    remove_spilled(&spilled);
                    return Err(err);
                }
            }
        }
        Ok(content)
    }

    fn materialize_tracked(
        &self,
        block: &PromptBlock,
        spilled: &mut Vec<PathBuf>,
    ) -> Result<ContentBlock> {
        match block {
            PromptBlock::Text { text } => Ok(ContentBlock::text(text.clone())),
            PromptBlock::Image { data, mime_type } => {
                self.materialize_binary(mime_type, data, spilled)
            }
            PromptBlock::ResourceLink {
                uri,
                name,
                mime_type,
                size,
            } => Ok(ContentBlock::text(describe_link(
                uri,
                name,
                mime_type.as_deref(),
                *size,
            ))),
            PromptBlock::Resource { resource } => self.materialize_embedded(resource, spilled),
            PromptBlock::Unsupported => Err(AppError::InvalidInput(
                "unsupported content block type".into(),
            )),
        }
    }

    fn materialize_embedded(
        &self,
        resource: &EmbeddedResourceContents,
        spilled: &mut Vec<PathBuf>,
    ) -> Result<ContentBlock> {
        if let Some(text) = &resource.text {
            return Ok(ContentBlock::text(format!(
                "\n[BEGIN USER PROVIDED ADDITIONAL CONTEXT]\nURI: {}\nmimeType: {}\nContent:\n{text}\n[END USER PROVIDED ADDITIONAL CONTEXT]\n",
                resource.uri,
                resource.mime_type.as_deref().unwrap_or(UNKNOWN),
            )));
        }
        if let Some(blob) = &resource.blob {
            return self.materialize_binary(
                resource.mime_type.as_deref().unwrap_or(""),
                blob,
                spilled,
            );
        }
        Err(AppError::InvalidInput(format!(
            "embedded resource {} has neither text nor blob",
            resource.uri
        )))
    }

    fn materialize_binary(
        &self,
        mime_type: &str,
        blob: &str,
        spilled: &mut Vec<PathBuf>,
    ) -> Result<ContentBlock> {
        if is_supported_image(mime_type) {
            return Ok(ContentBlock::Image {
                mime_type: mime_type.to_owned(),
                data: blob.to_owned(),
            });
        }

        let bytes = STANDARD
            .decode(blob)
            .map_err(|err| AppError::InvalidInput(format!("invalid base64 payload: {err}")))?;

        let is_image = mime_type.starts_with("image/");
        if is_image {
            match self.encoder.encode(&bytes, CONVERSION_TARGET) {
                Ok(converted) => {
                    debug!(from = mime_type, to = CONVERSION_TARGET.mime_type(), "image re-encoded");
                    return Ok(ContentBlock::Image {
                        mime_type: CONVERSION_TARGET.mime_type().to_owned(),
                        data: STANDARD.encode(converted),
                    });
                }
                Err(err) => {
                    debug!(mime_type, error = %err, "image re-encode failed, spilling to disk");
                }
            }
        }

        let path = self.spill(mime_type, &bytes)?;
        spilled.push(path.clone());
        let description = if is_image {
            format!(
                "User provided image with unsupported format ({mime_type}).\nAttempted automatic conversion failed.\nSupported formats: {}\n",
                SUPPORTED_IMAGE_MIME_TYPES.join(", ")
            )
        } else {
            "User provided binary context (non-image).\n".to_owned()
        };

        Ok(ContentBlock::text(format!(
            "\n[BEGIN USER PROVIDED ADDITIONAL CONTEXT]\n{description}Saved to file: {}\n[END USER PROVIDED ADDITIONAL CONTEXT]\n",
            path.display()
        )))
    }

    fn spill(&self, mime_type: &str, bytes: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.cache_dir)?;
        let filename = format!(
            "{SPILL_PREFIX}{}{}",
            uuid::Uuid::new_v4().simple(),
            extension_for(mime_type)
        );
        let target = self.cache_dir.join(filename);
        fs::write(&target, bytes)?;
        info!(path = %target.display(), bytes = bytes.len(), "binary resource spilled to cache");
        Ok(target)
    }
}

// ── Private helpers ─────────────────────────────────────────────────────

fn is_supported_image(mime_type: &str) -> bool {
    SUPPORTED_IMAGE_MIME_TYPES.contains(&mime_type)
}

fn describe_link(uri: &str, name: &str, mime_type: Option<&str>, size: Option<u64>) -> String {
    let size = size.map_or_else(|| UNKNOWN.to_owned(), |s| s.to_string());
    format!(
        "\n[BEGIN USER PROVIDED ADDITIONAL RESOURCE]\nType: resource_link\nURI: {uri}\nname: {name}\nmimeType: {}\nsize: {size}\n[END USER PROVIDED ADDITIONAL RESOURCE]\n",
        mime_type.unwrap_or(UNKNOWN)
    )
}

fn remove_spilled(paths: &[PathBuf]) {
    for path in paths {
        if let Err(err) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %err, "failed to remove spilled resource");
        }
    }
}

/// Best-effort file extension (with leading dot) for a MIME type.
fn extension_for(mime_type: &str) -> String {
    if mime_type.is_empty() {
        return String::new();
    }
    mime_guess::get_mime_extensions_str(mime_type)
        .and_then(|exts| exts.first())
        .map_or_else(String::new, |ext| format!(".{ext}"))
}
