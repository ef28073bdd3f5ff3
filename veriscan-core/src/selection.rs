//! Media selection lifecycle
//!
//! Owns the currently selected file and its locally renderable preview.
//! Exactly one selection (or none) exists at a time; replacing or clearing
//! it drops the previous preview and bumps the generation counter that
//! stamps every analysis invocation (late responses from a superseded
//! generation are discarded by the orchestrator).

use std::path::Path;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::error::{DetectError, Result};
use crate::types::MediaClass;

/// Upload ceiling mirrored from the backend (50 MB)
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Locally renderable preview of the selected media
#[derive(Debug, Clone)]
pub enum PreviewHandle {
    /// Image preview: the file fully read into an inline base64 data URL
    InlineImage(String),
    /// Video preview: a transient reference to the raw bytes, not re-read
    VideoBlob(Arc<Vec<u8>>),
}

/// A user-selected media file plus derived metadata
#[derive(Debug)]
pub struct MediaSelection {
    bytes: Arc<Vec<u8>>,
    file_name: String,
    media_class: MediaClass,
    preview: PreviewHandle,
}

impl MediaSelection {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn media_class(&self) -> MediaClass {
        self.media_class
    }

    pub fn preview(&self) -> &PreviewHandle {
        &self.preview
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}

/// Owner of the current (at most one) media selection
#[derive(Debug, Default)]
pub struct SelectionManager {
    current: Option<Arc<MediaSelection>>,
    generation: u64,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a new file, replacing and releasing any previous selection
    ///
    /// The media class is taken from `class_hint` when given, otherwise
    /// derived from the file extension, otherwise sniffed from content.
    /// Validation mirrors the backend's own limits so obviously-rejectable
    /// uploads fail locally.
    pub fn select(
        &mut self,
        file_name: &str,
        bytes: Vec<u8>,
        class_hint: Option<MediaClass>,
    ) -> Result<Arc<MediaSelection>> {
        if bytes.is_empty() {
            return Err(DetectError::InvalidMedia("file is empty".to_string()));
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(DetectError::InvalidMedia(format!(
                "file exceeds the {} MB upload limit",
                MAX_UPLOAD_BYTES / (1024 * 1024)
            )));
        }

        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let media_class = class_hint
            .or_else(|| extension.as_deref().and_then(MediaClass::from_extension))
            .or_else(|| MediaClass::sniff(&bytes))
            .ok_or_else(|| {
                DetectError::InvalidMedia(format!("unrecognized media type: {}", file_name))
            })?;

        // Extension allow-list matches the backend's per-class checks
        if let Some(ext) = extension.as_deref() {
            if MediaClass::from_extension(ext) != Some(media_class) {
                return Err(DetectError::InvalidMedia(format!(
                    "extension .{} is not allowed for {} uploads",
                    ext, media_class
                )));
            }
        }

        let bytes = Arc::new(bytes);
        let preview = match media_class {
            MediaClass::Image => {
                let mime = infer::get(&bytes)
                    .map(|t| t.mime_type())
                    .unwrap_or("image/*");
                PreviewHandle::InlineImage(format!(
                    "data:{};base64,{}",
                    mime,
                    BASE64.encode(bytes.as_slice())
                ))
            }
            MediaClass::Video => PreviewHandle::VideoBlob(Arc::clone(&bytes)),
        };

        let selection = Arc::new(MediaSelection {
            bytes,
            file_name: file_name.to_string(),
            media_class,
            preview,
        });

        // Dropping the previous Arc releases its preview resources
        self.current = Some(Arc::clone(&selection));
        self.generation += 1;

        tracing::debug!(
            file_name,
            media_class = %selection.media_class,
            size_bytes = selection.size_bytes(),
            generation = self.generation,
            "Media selected"
        );

        Ok(selection)
    }

    /// Clear the selection back to the initial empty condition
    pub fn clear(&mut self) {
        if self.current.take().is_some() {
            tracing::debug!(generation = self.generation + 1, "Selection cleared");
        }
        self.generation += 1;
    }

    pub fn current(&self) -> Option<&Arc<MediaSelection>> {
        self.current.as_ref()
    }

    /// Monotonic counter bumped on every select/clear
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
