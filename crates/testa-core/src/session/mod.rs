//! Session state, normalized messages and the debug trace.

pub mod debug;
pub mod message;
pub mod model;

pub use debug::{DebugEntry, DebugTrace};
pub use message::{
    ContentClass, ContentKind, DisplayContent, MessageKind, NormalizedMessage, file_annotation,
};
pub use model::Session;
