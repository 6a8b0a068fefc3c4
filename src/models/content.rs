//! Content blocks: client-supplied prompt blocks and the agent's native form.

use serde::{Deserialize, Serialize};

/// Contents of an embedded resource. Exactly one of `text` or `blob` is
/// expected; a resource with neither is rejected by the materializer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedResourceContents {
    /// Resource URI.
    pub uri: String,
    /// MIME type, if known.
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Inline text content.
    #[serde(default)]
    pub text: Option<String>,
    /// Base64-encoded binary content.
    #[serde(default)]
    pub blob: Option<String>,
}

/// Prompt content block as sent by an ACP client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PromptBlock {
    /// Plain text.
    Text {
        /// The text.
        text: String,
    },
    /// Inline image.
    Image {
        /// Base64-encoded image bytes.
        data: String,
        /// Image MIME type.
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
    /// Reference to a resource the client did not inline.
    ResourceLink {
        /// Resource URI.
        uri: String,
        /// Display name.
        name: String,
        /// MIME type, if known.
        #[serde(default, rename = "mimeType")]
        mime_type: Option<String>,
        /// Size in bytes, if known.
        #[serde(default)]
        size: Option<u64>,
    },
    /// Resource whose contents are inlined.
    Resource {
        /// Inlined contents.
        resource: EmbeddedResourceContents,
    },
    /// Block type this crate does not recognise.
    #[serde(other)]
    Unsupported,
}

/// Content in the agent's native representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Text content.
    Text {
        /// The text.
        text: String,
    },
    /// Inline image content.
    Image {
        /// Image MIME type.
        mime_type: String,
        /// Base64-encoded image bytes.
        data: String,
    },
}

impl ContentBlock {
    /// Build a text block.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Text payload, if this is a text block.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::Image { .. } => None,
        }
    }

    /// `data:` URI for image blocks.
    #[must_use]
    pub fn data_uri(&self) -> Option<String> {
        match self {
            Self::Image { mime_type, data } => Some(format!("data:{mime_type};base64,{data}")),
            Self::Text { .. } => None,
        }
    }
}
