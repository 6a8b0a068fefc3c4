//! Unit tests for `ResourceMaterializer`.
//!
//! Spill tests write into a `tempfile::TempDir` and inspect the file named
//! in the returned text block.

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{DynamicImage, ImageFormat, RgbImage};

use openhands_acp::models::content::{ContentBlock, EmbeddedResourceContents, PromptBlock};
use openhands_acp::resources::encoder::{EncodeError, ImageEncoder, ImageTarget};
use openhands_acp::resources::ResourceMaterializer;
use openhands_acp::AppError;

// ── Helpers ─────────────────────────────────────────────────────────────────

struct FailingEncoder;

impl ImageEncoder for FailingEncoder {
    fn encode(&self, _bytes: &[u8], _target: ImageTarget) -> Result<Vec<u8>, EncodeError> {
        Err(EncodeError("no codec".into()))
    }
}

fn blob(uri: &str, mime_type: Option<&str>, bytes: &[u8]) -> PromptBlock {
    PromptBlock::Resource {
        resource: EmbeddedResourceContents {
            uri: uri.to_owned(),
            mime_type: mime_type.map(str::to_owned),
            text: None,
            blob: Some(STANDARD.encode(bytes)),
        },
    }
}

fn bmp_bytes() -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, image::Rgb([255, 0, 0])));
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Bmp)
        .expect("encode bmp fixture");
    out.into_inner()
}

fn text_of(block: &ContentBlock) -> &str {
    block.as_text().expect("expected a text block")
}

fn saved_path(text: &str) -> PathBuf {
    let line = text
        .lines()
        .find_map(|line| line.strip_prefix("Saved to file: "))
        .expect("text names the saved file");
    PathBuf::from(line)
}

// ── Text and links ──────────────────────────────────────────────────────────

/// Text blocks pass through verbatim.
#[test]
fn text_passes_through() {
    let dir = tempfile::tempdir().unwrap();
    let materializer = ResourceMaterializer::new(dir.path());

    let out = materializer
        .materialize(&PromptBlock::Text {
            text: "hello world".into(),
        })
        .unwrap();

    assert_eq!(out, ContentBlock::text("hello world"));
}

/// Materializing the same text twice gives the same result.
#[test]
fn text_materialization_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let materializer = ResourceMaterializer::new(dir.path());
    let block = PromptBlock::Text {
        text: "same".into(),
    };

    let first = materializer.materialize(&block).unwrap();
    let second = materializer
        .materialize(&PromptBlock::Text {
            text: text_of(&first).to_owned(),
        })
        .unwrap();

    assert_eq!(first, second);
}

/// Resource links are described, never fetched.
#[test]
fn resource_link_is_described() {
    let dir = tempfile::tempdir().unwrap();
    let materializer = ResourceMaterializer::new(dir.path());

    let out = materializer
        .materialize(&PromptBlock::ResourceLink {
            uri: "file:///repo/notes.md".into(),
            name: "notes.md".into(),
            mime_type: Some("text/markdown".into()),
            size: Some(2048),
        })
        .unwrap();
    let text = text_of(&out);

    assert!(text.contains("[BEGIN USER PROVIDED ADDITIONAL RESOURCE]"));
    assert!(text.contains("Type: resource_link"));
    assert!(text.contains("URI: file:///repo/notes.md"));
    assert!(text.contains("name: notes.md"));
    assert!(text.contains("mimeType: text/markdown"));
    assert!(text.contains("size: 2048"));
    assert!(text.contains("[END USER PROVIDED ADDITIONAL RESOURCE]"));
}

/// Missing link metadata renders as `unknown`.
#[test]
fn resource_link_without_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let materializer = ResourceMaterializer::new(dir.path());

    let out = materializer
        .materialize(&PromptBlock::ResourceLink {
            uri: "https://example.com/a".into(),
            name: "a".into(),
            mime_type: None,
            size: None,
        })
        .unwrap();
    let text = text_of(&out);

    assert!(text.contains("mimeType: unknown"));
    assert!(text.contains("size: unknown"));
}

/// Embedded text is wrapped in context markers with its URI.
#[test]
fn embedded_text_is_wrapped() {
    let dir = tempfile::tempdir().unwrap();
    let materializer = ResourceMaterializer::new(dir.path());

    let out = materializer
        .materialize(&PromptBlock::Resource {
            resource: EmbeddedResourceContents {
                uri: "file:///src/main.rs".into(),
                mime_type: Some("text/x-rust".into()),
                text: Some("fn main() {}".into()),
                blob: None,
            },
        })
        .unwrap();

    assert_eq!(
        text_of(&out),
        "\n[BEGIN USER PROVIDED ADDITIONAL CONTEXT]\nURI: file:///src/main.rs\nmimeType: text/x-rust\nContent:\nfn main() {}\n[END USER PROVIDED ADDITIONAL CONTEXT]\n"
    );
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

// ── Images ──────────────────────────────────────────────────────────────────

/// Supported images are inlined with the payload untouched.
#[test]
fn supported_image_is_inlined_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let materializer = ResourceMaterializer::new(dir.path());

    let out = materializer
        .materialize(&PromptBlock::Image {
            data: "iVBORw0KGgo=".into(),
            mime_type: "image/png".into(),
        })
        .unwrap();

    assert_eq!(
        out,
        ContentBlock::Image {
            mime_type: "image/png".into(),
            data: "iVBORw0KGgo=".into(),
        }
    );
}

/// A supported image embedded as a blob is inlined too.
#[test]
fn supported_image_blob_is_inlined() {
    let dir = tempfile::tempdir().unwrap();
    let materializer = ResourceMaterializer::new(dir.path());

    let out = materializer
        .materialize(&blob("file:///a.webp", Some("image/webp"), b"RIFF"))
        .unwrap();

    assert!(matches!(out, ContentBlock::Image { ref mime_type, .. } if mime_type == "image/webp"));
}

/// A BMP image is converted to PNG.
#[test]
fn bmp_image_is_converted_to_png() {
    let dir = tempfile::tempdir().unwrap();
    let materializer = ResourceMaterializer::new(dir.path());

    let out = materializer
        .materialize(&blob("file:///pic.bmp", Some("image/bmp"), &bmp_bytes()))
        .unwrap();

    let ContentBlock::Image { mime_type, data } = out else {
        panic!("expected an inline image");
    };
    assert_eq!(mime_type, "image/png");
    let png = STANDARD.decode(data).unwrap();
    assert_eq!(image::guess_format(&png).unwrap(), ImageFormat::Png);
    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (2, 2));
}

/// An undecodable image is spilled to disk with an explanation.
#[test]
fn undecodable_image_is_spilled() {
    let dir = tempfile::tempdir().unwrap();
    let materializer = ResourceMaterializer::new(dir.path());
    let payload = b"definitely not a tiff";

    let out = materializer
        .materialize(&blob("file:///scan.tiff", Some("image/tiff"), payload))
        .unwrap();
    let text = text_of(&out);

    assert!(text.contains("[BEGIN USER PROVIDED ADDITIONAL CONTEXT]"));
    assert!(text.contains("User provided image with unsupported format (image/tiff)."));
    assert!(text.contains("Supported formats: image/gif, image/jpeg, image/png, image/webp"));
    let path = saved_path(text);
    assert!(path.starts_with(dir.path()));
    assert_eq!(std::fs::read(&path).unwrap(), payload);
}

/// When the encoder fails the image falls back to a spill.
#[test]
fn encoder_failure_falls_back_to_spill() {
    let dir = tempfile::tempdir().unwrap();
    let materializer = ResourceMaterializer::with_encoder(dir.path(), Arc::new(FailingEncoder));
    let bytes = bmp_bytes();

    let out = materializer
        .materialize(&blob("file:///pic.bmp", Some("image/bmp"), &bytes))
        .unwrap();
    let text = text_of(&out);

    assert!(text.contains("Attempted automatic conversion failed."));
    assert_eq!(std::fs::read(saved_path(text)).unwrap(), bytes);
}

// ── Binary spill ────────────────────────────────────────────────────────────

/// Non-image blobs are written byte-for-byte with a MIME-derived extension.
#[test]
fn binary_blob_is_spilled_with_extension() {
    let dir = tempfile::tempdir().unwrap();
    let materializer = ResourceMaterializer::new(dir.path());
    let payload = b"%PDF-1.7 binary\x00\x01\x02";

    let out = materializer
        .materialize(&blob("file:///doc.pdf", Some("application/pdf"), payload))
        .unwrap();
    let text = text_of(&out);

    assert!(text.contains("User provided binary context (non-image)."));
    let path = saved_path(text);
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("embedded_resource_"), "got: {name}");
    assert_eq!(path.extension().unwrap(), "pdf");
    assert_eq!(std::fs::read(&path).unwrap(), payload);
}

/// Two spills of the same payload land in distinct files.
#[test]
fn spills_use_unique_names() {
    let dir = tempfile::tempdir().unwrap();
    let materializer = ResourceMaterializer::new(dir.path());
    let block = blob("file:///x.bin", Some("application/octet-stream"), b"\x00\x01");

    let first = saved_path(text_of(&materializer.materialize(&block).unwrap()));
    let second = saved_path(text_of(&materializer.materialize(&block).unwrap()));

    assert_ne!(first, second);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
}

/// The cache directory is created on first spill.
#[test]
fn spill_creates_cache_dir() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("nested").join("cache");
    let materializer = ResourceMaterializer::new(&cache);

    materializer
        .materialize(&blob("file:///x", None, b"raw"))
        .unwrap();

    assert!(cache.is_dir());
    assert_eq!(materializer.cache_dir(), cache.as_path());
}

// ── Failures ────────────────────────────────────────────────────────────────

/// An embedded resource with neither text nor blob is invalid input.
#[test]
fn empty_embedded_resource_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let materializer = ResourceMaterializer::new(dir.path());

    let result = materializer.materialize(&PromptBlock::Resource {
        resource: EmbeddedResourceContents {
            uri: "file:///empty".into(),
            mime_type: None,
            text: None,
            blob: None,
        },
    });

    assert!(matches!(result, Err(AppError::InvalidInput(_))));
}

/// Unrecognised block types are invalid input.
#[test]
fn unsupported_block_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let materializer = ResourceMaterializer::new(dir.path());

    assert!(matches!(
        materializer.materialize(&PromptBlock::Unsupported),
        Err(AppError::InvalidInput(_))
    ));
}

/// A blob that is not base64 is invalid input and writes nothing.
#[test]
fn bad_base64_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let materializer = ResourceMaterializer::new(dir.path());

    let result = materializer.materialize(&PromptBlock::Resource {
        resource: EmbeddedResourceContents {
            uri: "file:///x".into(),
            mime_type: Some("application/pdf".into()),
            text: None,
            blob: Some("!!! not base64 !!!".into()),
        },
    });

    assert!(matches!(result, Err(AppError::InvalidInput(msg)) if msg.contains("base64")));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

/// A whole prompt fails on its first bad block.
#[test]
fn materialize_all_stops_at_first_failure() {
    let dir = tempfile::tempdir().unwrap();
    let materializer = ResourceMaterializer::new(dir.path());

    let ok = materializer
        .materialize_all(&[
            PromptBlock::Text { text: "a".into() },
            PromptBlock::Text { text: "b".into() },
        ])
        .unwrap();
    assert_eq!(ok.len(), 2);

    let err = materializer.materialize_all(&[
        PromptBlock::Text { text: "a".into() },
        PromptBlock::Unsupported,
    ]);
    assert!(matches!(err, Err(AppError::InvalidInput(_))));
}

/// Files spilled for earlier blocks are removed when a later block fails.
#[test]
fn failed_prompt_leaves_no_spilled_files() {
    let dir = tempfile::tempdir().unwrap();
    let materializer = ResourceMaterializer::new(dir.path());

    let err = materializer.materialize_all(&[
        blob("file:///doc.pdf", Some("application/pdf"), b"%PDF-1.7"),
        PromptBlock::Unsupported,
    ]);

    assert!(matches!(err, Err(AppError::InvalidInput(_))));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

/// A successful prompt keeps every spilled file.
#[test]
fn successful_prompt_keeps_spilled_files() {
    let dir = tempfile::tempdir().unwrap();
    let materializer = ResourceMaterializer::new(dir.path());

    let out = materializer
        .materialize_all(&[
            blob("file:///a.pdf", Some("application/pdf"), b"%PDF-1.7"),
            blob("file:///b.bin", None, b"\x00\x01"),
        ])
        .unwrap();

    assert_eq!(out.len(), 2);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
}
