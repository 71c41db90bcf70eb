//! Wire-level models of the remote assistant service.
//!
//! These mirror the JSON objects returned by the Assistants API closely
//! enough to deserialize them directly. Fields the application never reads
//! are left out; unknown content-item fields are kept in `extra` so a raw
//! item can be echoed into the debug trace unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A remote conversation thread. Only the id is used locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
}

/// Lifecycle status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
    /// Any status this client does not know about yet.
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Returns true once the run can no longer make progress.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed
                | RunStatus::Failed
                | RunStatus::Cancelled
                | RunStatus::Expired
                | RunStatus::Incomplete
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
            RunStatus::Completed => "completed",
            RunStatus::Incomplete => "incomplete",
            RunStatus::Expired => "expired",
            RunStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token usage reported for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Error details attached to a failed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunError {
    pub code: String,
    pub message: String,
}

/// One invocation of the assistant against a thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    #[serde(default)]
    pub thread_id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub model: String,
    /// Absent while the run is still in progress.
    #[serde(default)]
    pub usage: Option<Usage>,
    #[serde(default)]
    pub last_error: Option<RunError>,
}

/// Author of a thread message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// A message in a thread's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub id: String,
    pub role: MessageRole,
    #[serde(default)]
    pub content: Vec<ContentItem>,
}

/// One heterogeneous content item of a message.
///
/// `kind` carries the raw `type` tag. Classification into display kinds
/// happens in [`crate::session::ContentClass`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_file: Option<ImageFile>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContentItem {
    /// Builds a plain text item.
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: Some(TextContent {
                value: value.into(),
                annotations: Vec::new(),
            }),
            image_file: None,
            extra: Map::new(),
        }
    }

    /// Builds an inline image reference.
    pub fn image(file_id: impl Into<String>) -> Self {
        Self {
            kind: "image_file".to_string(),
            text: None,
            image_file: Some(ImageFile {
                file_id: file_id.into(),
            }),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub value: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageFile {
    pub file_id: String,
}

/// Metadata attached to a text item pointing at an auxiliary artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(rename = "type")]
    pub kind: String,
    /// The text span the annotation replaces, e.g. `sandbox:/mnt/data/report.csv`.
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<FilePathRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_index: Option<u32>,
}

pub const FILE_PATH_ANNOTATION: &str = "file_path";

impl Annotation {
    /// Builds a file-path annotation.
    pub fn file_path(text: impl Into<String>, file_id: impl Into<String>) -> Self {
        Self {
            kind: FILE_PATH_ANNOTATION.to_string(),
            text: text.into(),
            file_path: Some(FilePathRef {
                file_id: file_id.into(),
            }),
            start_index: None,
            end_index: None,
        }
    }

    /// Returns the referenced file id if this is a file-path annotation.
    pub fn file_path_id(&self) -> Option<&str> {
        if self.kind != FILE_PATH_ANNOTATION {
            return None;
        }
        self.file_path.as_ref().map(|f| f.file_id.as_str())
    }

    /// File name of the referenced artifact: the annotation text after its
    /// last `/`, so `sandbox:/mnt/data/report.csv` yields `report.csv`.
    pub fn file_name(&self) -> &str {
        self.text.rsplit('/').next().unwrap_or_default()
    }

    /// Extension of the referenced file name (text after the last `.`).
    ///
    /// A name without a dot yields the whole name.
    pub fn file_extension(&self) -> &str {
        self.file_name().rsplit('.').next().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilePathRef {
    pub file_id: String,
}

/// Assistant metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assistant {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub model: String,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub tool_resources: Option<ToolResources>,
}

impl Assistant {
    /// File ids attached to the code interpreter tool, if any.
    pub fn code_interpreter_file_ids(&self) -> &[String] {
        self.tool_resources
            .as_ref()
            .and_then(|r| r.code_interpreter.as_ref())
            .map(|c| c.file_ids.as_slice())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolResources {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_interpreter: Option<CodeInterpreterResources>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_search: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeInterpreterResources {
    #[serde(default)]
    pub file_ids: Vec<String>,
}

/// Remote file metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileObject {
    pub id: String,
    pub filename: String,
    #[serde(default)]
    pub bytes: Option<u64>,
}
