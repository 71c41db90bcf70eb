//! Remote assistant service: wire models and the service trait.

pub mod model;
pub mod service;

pub use model::{
    Annotation, Assistant, CodeInterpreterResources, ContentItem, FILE_PATH_ANNOTATION,
    FileObject, FilePathRef, ImageFile, MessageRole, Run, RunError, RunStatus, TextContent,
    Thread, ThreadMessage, ToolResources, Usage,
};
pub use service::AssistantService;
