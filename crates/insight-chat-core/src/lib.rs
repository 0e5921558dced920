#![warn(missing_docs)]
//! # insight-chat-core
//!
//! ## Purpose
//! Defines the pure data model shared across the `insight-chat` workspace.
//!
//! ## Responsibilities
//! - Enumerate the closed set of analysis features.
//! - Represent conversation messages and the append-only conversation log.
//! - Hold staged (not yet submitted) input per feature.
//! - Package picked files into image previews and document attachments.
//!
//! ## Data flow
//! Front-end picks a file or types text -> [`StagedInput`] holds it ->
//! controller turns it into a user [`Message`] appended to
//! [`ConversationLog`] -> backend reply becomes a system [`Message`].
//!
//! ## Ownership and lifetimes
//! Messages and attachments own their buffers (`String`, `Vec<u8>`), so the
//! log never borrows from transient file reads or network buffers.
//!
//! ## Error model
//! File-type and URL validation failures return [`CoreError`]. They are local
//! input errors and never reach the conversation log.
//!
//! ## Security and privacy notes
//! Attachment bytes are never formatted into `Debug` output; only names,
//! MIME types and sizes are shown.
//!
//! ## Example
//! ```rust
//! use insight_chat_core::{ConversationLog, Message, MessageIdGenerator, Role};
//!
//! let mut ids = MessageIdGenerator::new();
//! let mut log = ConversationLog::new();
//! log.append(Message::text(ids.next_id(), Role::User, "hello", 0));
//! assert_eq!(log.len(), 1);
//! ```

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;
use time::OffsetDateTime;
use time::macros::format_description;
use url::Url;

/// Document file extensions the analysis backend can extract text from.
pub const SUPPORTED_DOCUMENT_EXTENSIONS: [&str; 3] = ["pdf", "docx", "doc"];

/// Closed set of analysis features offered by the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// Upload an image and receive a detailed description.
    ImageAnalysis,
    /// Upload a document, paste text, or link a URL and receive a summary.
    DocumentAnalysis,
    /// Reserved; renders a "coming soon" placeholder.
    TextAnalysis,
    /// Reserved; renders a "coming soon" placeholder.
    CodeAnalysis,
}

impl Feature {
    /// All features in menu order.
    pub const ALL: [Feature; 4] = [
        Feature::ImageAnalysis,
        Feature::DocumentAnalysis,
        Feature::TextAnalysis,
        Feature::CodeAnalysis,
    ];

    /// Stable identifier used by the selector and front-ends.
    pub fn id(self) -> &'static str {
        match self {
            Feature::ImageAnalysis => "image-analysis",
            Feature::DocumentAnalysis => "document-analysis",
            Feature::TextAnalysis => "text-analysis",
            Feature::CodeAnalysis => "code-analysis",
        }
    }

    /// Human-readable menu label.
    pub fn label(self) -> &'static str {
        match self {
            Feature::ImageAnalysis => "Image Analysis",
            Feature::DocumentAnalysis => "Document Analysis",
            Feature::TextAnalysis => "Text Analysis",
            Feature::CodeAnalysis => "Code Analysis",
        }
    }

    /// Resolves a selector id. Blank or unknown ids resolve to `None`.
    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim();
        Self::ALL.into_iter().find(|feature| feature.id() == id)
    }

    /// Returns `true` when the feature has a working input adapter.
    pub fn is_available(self) -> bool {
        matches!(self, Feature::ImageAnalysis | Feature::DocumentAnalysis)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Author of a conversation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Entered by the user.
    User,
    /// Produced from a backend reply or a local failure mapping.
    System,
}

/// Monotonic message identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(pub u64);

/// Issues strictly increasing [`MessageId`] values.
///
/// The generator is never reset, so ids stay unique across log clears.
#[derive(Debug, Clone, Default)]
pub struct MessageIdGenerator {
    next: u64,
}

impl MessageIdGenerator {
    /// Creates a generator starting at id `1`.
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Returns the next id.
    pub fn next_id(&mut self) -> MessageId {
        // Default-constructed generators start at 0; skip it so ids are always positive.
        if self.next == 0 {
            self.next = 1;
        }
        let id = MessageId(self.next);
        self.next += 1;
        id
    }
}

/// Image picked by the user, encoded as a displayable data URL.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    /// Original file name.
    pub file_name: String,
    /// MIME type derived from the file extension.
    pub mime_type: &'static str,
    /// `data:<mime>;base64,<payload>` preview, also sent to the backend.
    pub data_url: String,
    /// Raw file size in bytes.
    pub size_bytes: usize,
}

impl ImageAttachment {
    /// Encodes raw image bytes into a preview attachment.
    ///
    /// # Errors
    /// Returns [`CoreError::UnsupportedImageType`] when the extension is not a
    /// known image type, or [`CoreError::EmptyFile`] for zero-length input.
    pub fn from_bytes(file_name: impl Into<String>, bytes: &[u8]) -> Result<Self, CoreError> {
        let file_name = file_name.into();
        let mime_type = image_mime_type(&file_name)
            .ok_or_else(|| CoreError::UnsupportedImageType(file_name.clone()))?;
        if bytes.is_empty() {
            return Err(CoreError::EmptyFile(file_name));
        }

        Ok(Self {
            data_url: format!("data:{mime_type};base64,{}", STANDARD.encode(bytes)),
            file_name,
            mime_type,
            size_bytes: bytes.len(),
        })
    }
}

impl fmt::Debug for ImageAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageAttachment")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("size_bytes", &self.size_bytes)
            .finish_non_exhaustive()
    }
}

/// Document picked by the user for multipart upload.
#[derive(Clone, PartialEq, Eq)]
pub struct DocumentAttachment {
    /// Original file name; the backend dispatches on its extension.
    pub file_name: String,
    /// Raw file bytes.
    pub bytes: Vec<u8>,
}

impl DocumentAttachment {
    /// Wraps raw document bytes after checking the extension.
    ///
    /// # Errors
    /// Returns [`CoreError::UnsupportedDocumentType`] for extensions outside
    /// [`SUPPORTED_DOCUMENT_EXTENSIONS`], or [`CoreError::EmptyFile`].
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, CoreError> {
        let file_name = file_name.into();
        let supported = extension_of(&file_name)
            .is_some_and(|ext| SUPPORTED_DOCUMENT_EXTENSIONS.contains(&ext.as_str()));
        if !supported {
            return Err(CoreError::UnsupportedDocumentType(file_name));
        }
        if bytes.is_empty() {
            return Err(CoreError::EmptyFile(file_name));
        }

        Ok(Self { file_name, bytes })
    }
}

impl fmt::Debug for DocumentAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentAttachment")
            .field("file_name", &self.file_name)
            .field("size_bytes", &self.bytes.len())
            .finish()
    }
}

/// One conversation entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Generation-time unique id.
    pub id: MessageId,
    /// Author role.
    pub role: Role,
    /// Text content.
    pub content: String,
    /// Embedded image preview, if any.
    pub image: Option<ImageAttachment>,
    /// Creation time in Unix epoch milliseconds.
    pub timestamp_ms: u64,
    /// Marks failure messages.
    pub is_error: bool,
    /// Backend metadata shown next to the reply (model or source type).
    pub source: Option<String>,
}

impl Message {
    /// Creates a plain text message.
    pub fn text(id: MessageId, role: Role, content: impl Into<String>, timestamp_ms: u64) -> Self {
        Self {
            id,
            role,
            content: content.into(),
            image: None,
            timestamp_ms,
            is_error: false,
            source: None,
        }
    }

    /// Creates a system message flagged as an error.
    pub fn error(id: MessageId, content: impl Into<String>, timestamp_ms: u64) -> Self {
        Self {
            is_error: true,
            ..Self::text(id, Role::System, content, timestamp_ms)
        }
    }

    /// Attaches an image preview.
    pub fn with_image(mut self, image: ImageAttachment) -> Self {
        self.image = Some(image);
        self
    }

    /// Attaches backend source metadata.
    pub fn with_source(mut self, source: Option<String>) -> Self {
        self.source = source;
        self
    }

    /// Formats the timestamp as `HH:MM:SS` (UTC).
    pub fn display_time(&self) -> String {
        let nanos = i128::from(self.timestamp_ms) * 1_000_000;
        OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .ok()
            .and_then(|at| at.format(format_description!("[hour]:[minute]:[second]")).ok())
            .unwrap_or_else(|| "--:--:--".to_string())
    }
}

/// Append-only ordered message sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationLog {
    messages: Vec<Message>,
}

impl ConversationLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one message at the end.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Removes every message.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Messages in insertion order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Most recent message.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` when the log holds no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Input-kind selector for the document feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputKind {
    /// Free text pasted by the user.
    #[default]
    Text,
    /// A document URL.
    Url,
    /// A document file upload.
    File,
}

impl InputKind {
    /// Parses `text`, `url` or `file`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" => Some(InputKind::Text),
            "url" => Some(InputKind::Url),
            "file" => Some(InputKind::File),
            _ => None,
        }
    }
}

/// Feature-specific input not yet submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedInput {
    /// Selected image with preview.
    pub image: Option<ImageAttachment>,
    /// Selected document file.
    pub document: Option<DocumentAttachment>,
    /// Raw text or URL being edited.
    pub text: String,
    /// Active input kind for the document feature.
    pub kind: InputKind,
}

impl StagedInput {
    /// Clears every staged value and resets the kind selector.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Clears only the staged text.
    pub fn clear_text(&mut self) {
        self.text.clear();
    }

    /// Returns the whitespace-trimmed text when it is non-empty.
    pub fn trimmed_text(&self) -> Option<&str> {
        let trimmed = self.text.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    /// Returns `true` when nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.image.is_none() && self.document.is_none() && self.text.is_empty()
    }
}

/// Validates a document URL entered in URL mode.
///
/// # Errors
/// Returns [`CoreError::InvalidUrl`] unless the value is an absolute `http` or
/// `https` URL with a host.
pub fn validate_document_url(raw: &str) -> Result<Url, CoreError> {
    let parsed =
        Url::parse(raw.trim()).map_err(|error| CoreError::InvalidUrl(format!("{raw}: {error}")))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(CoreError::InvalidUrl(format!(
            "{raw}: only http and https links are supported"
        )));
    }
    Ok(parsed)
}

/// Maps an image file name to its MIME type by extension.
pub fn image_mime_type(file_name: &str) -> Option<&'static str> {
    match extension_of(file_name)?.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

fn extension_of(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Error type for local input validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// File extension is not a supported image type.
    #[error("unsupported image type: {0}")]
    UnsupportedImageType(String),
    /// File extension is not a supported document type.
    #[error("unsupported document type: {0} (expected .pdf, .docx or .doc)")]
    UnsupportedDocumentType(String),
    /// File has no content.
    #[error("file is empty: {0}")]
    EmptyFile(String),
    /// URL input is not an absolute http(s) URL.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

#[cfg(test)]
mod tests {
    //! Unit tests for feature ids, id generation and attachments.

    use super::*;

    #[test]
    fn feature_ids_resolve_and_reject_blank() {
        assert_eq!(
            Feature::from_id(" image-analysis "),
            Some(Feature::ImageAnalysis)
        );
        assert_eq!(Feature::from_id(""), None);
        assert_eq!(Feature::from_id("video-analysis"), None);
        assert!(!Feature::TextAnalysis.is_available());
    }

    #[test]
    fn default_generator_never_issues_zero() {
        let mut ids = MessageIdGenerator::default();
        assert_eq!(ids.next_id(), MessageId(1));
        assert_eq!(ids.next_id(), MessageId(2));
    }

    #[test]
    fn image_attachment_builds_data_url() {
        let image = ImageAttachment::from_bytes("cat.PNG", b"abc").expect("png should encode");
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data_url, "data:image/png;base64,YWJj");
        assert!(!format!("{image:?}").contains("YWJj"));
    }

    #[test]
    fn document_attachment_requires_known_extension() {
        assert!(DocumentAttachment::from_bytes("notes.pdf", vec![1]).is_ok());
        assert_eq!(
            DocumentAttachment::from_bytes("notes.txt", vec![1]),
            Err(CoreError::UnsupportedDocumentType("notes.txt".to_string()))
        );
        assert!(DocumentAttachment::from_bytes(".pdf", vec![1]).is_err());
    }

    #[test]
    fn display_time_uses_utc_clock() {
        let message = Message::text(MessageId(1), Role::User, "hi", 3_723_000);
        assert_eq!(message.display_time(), "01:02:03");
    }
}
