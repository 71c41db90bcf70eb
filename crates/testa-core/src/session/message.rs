//! Normalized display messages.
//!
//! Raw content items from the remote history are classified and converted
//! into [`NormalizedMessage`] records that a presentation layer can render
//! without knowing the wire format.

use crate::assistant::{Annotation, ContentItem, MessageRole};
use serde::Serialize;
use std::path::PathBuf;

/// Display kind of a recognized content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Plain text without file-path annotations.
    Text,
    /// Inline image generated by the assistant.
    Image,
    /// Text carrying a file-path annotation; the file is the main content.
    File,
}

/// Result of classifying a raw content item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentClass<'a> {
    Recognized(ContentKind),
    /// Content type this client cannot render, with the raw `type` tag.
    Unrecognized(&'a str),
}

impl<'a> ContentClass<'a> {
    /// Classifies a content item.
    ///
    /// A text item becomes [`ContentKind::File`] when at least one of its
    /// annotations is a file-path reference; other annotation types do not
    /// change the kind.
    pub fn of(item: &'a ContentItem) -> Self {
        match (item.kind.as_str(), &item.text, &item.image_file) {
            ("text", Some(text), _) => {
                if text.annotations.iter().any(|a| a.file_path_id().is_some()) {
                    ContentClass::Recognized(ContentKind::File)
                } else {
                    ContentClass::Recognized(ContentKind::Text)
                }
            }
            ("image_file", _, Some(_)) => ContentClass::Recognized(ContentKind::Image),
            (raw, _, _) => ContentClass::Unrecognized(raw),
        }
    }
}

/// First file-path annotation of a text item.
///
/// When several file-path annotations are present only the first one is
/// materialized.
pub fn file_annotation(item: &ContentItem) -> Option<&Annotation> {
    item.text
        .as_ref()?
        .annotations
        .iter()
        .find(|a| a.file_path_id().is_some())
}

/// Kind of a normalized record, including the unrecognized case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    Image,
    File,
    Unrecognized(String),
}

impl From<ContentKind> for MessageKind {
    fn from(kind: ContentKind) -> Self {
        match kind {
            ContentKind::Text => MessageKind::Text,
            ContentKind::Image => MessageKind::Image,
            ContentKind::File => MessageKind::File,
        }
    }
}

/// What a presentation layer shows as the body of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DisplayContent {
    Text(String),
    /// Local path of a downloaded artifact.
    Artifact(PathBuf),
    Empty,
}

impl DisplayContent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            DisplayContent::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_artifact(&self) -> Option<&std::path::Path> {
        match self {
            DisplayContent::Artifact(path) => Some(path),
            _ => None,
        }
    }
}

/// A display-ready record built from one content item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedMessage {
    pub kind: MessageKind,
    pub role: MessageRole,
    /// The raw content item this record was built from.
    pub item: ContentItem,
    pub content: DisplayContent,
    /// Original text of an annotated file record; empty otherwise.
    pub text_content: String,
    /// Referenced file name of an annotated file record; empty otherwise.
    pub file_name: String,
}

impl NormalizedMessage {
    pub fn text(role: MessageRole, item: ContentItem, value: String) -> Self {
        Self {
            kind: MessageKind::Text,
            role,
            item,
            content: DisplayContent::Text(value),
            text_content: String::new(),
            file_name: String::new(),
        }
    }

    pub fn image(role: MessageRole, item: ContentItem, path: PathBuf) -> Self {
        Self {
            kind: MessageKind::Image,
            role,
            item,
            content: DisplayContent::Artifact(path),
            text_content: String::new(),
            file_name: String::new(),
        }
    }

    pub fn file(
        role: MessageRole,
        item: ContentItem,
        path: PathBuf,
        text_content: String,
        file_name: String,
    ) -> Self {
        Self {
            kind: MessageKind::File,
            role,
            item,
            content: DisplayContent::Artifact(path),
            text_content,
            file_name,
        }
    }

    /// A record for an item that could not be rendered.
    pub fn unrecognized(role: MessageRole, item: ContentItem) -> Self {
        Self {
            kind: MessageKind::Unrecognized(item.kind.clone()),
            role,
            item,
            content: DisplayContent::Empty,
            text_content: String::new(),
            file_name: String::new(),
        }
    }
}
