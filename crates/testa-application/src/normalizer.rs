//! Message normalization.
//!
//! Pulls the complete history of the active thread and rebuilds the
//! session's message list from scratch. The previous list is replaced only
//! after the whole history (and every referenced artifact) was fetched, so a
//! remote failure leaves the session exactly as it was.

use std::sync::Arc;
use testa_core::assistant::{AssistantService, ContentItem, MessageRole, ThreadMessage};
use testa_core::session::{
    ContentClass, ContentKind, DebugTrace, NormalizedMessage, file_annotation,
};
use testa_core::{Result, TestaError};
use testa_infrastructure::ArtifactStore;

use crate::artifact_fetcher::ArtifactFetcher;
use crate::session_context::SessionContext;
use crate::usage::UsageAccumulator;

/// Suffix for inline images.
const IMAGE_SUFFIX: &str = "png";

/// Debug trace label for normalized records.
pub const DEBUG_MESSAGES: &str = "messages";

pub struct MessageNormalizer;

impl MessageNormalizer {
    /// Recomputes usage totals and rebuilds the message list of the active thread.
    ///
    /// Does nothing while the session has no thread.
    pub async fn refresh(ctx: &mut SessionContext) -> Result<()> {
        let Some(thread_id) = ctx.session.thread_id().map(str::to_string) else {
            tracing::debug!("[MessageNormalizer] No active thread, nothing to refresh");
            return Ok(());
        };
        let service = Arc::clone(&ctx.service);

        let totals = UsageAccumulator::accumulate(service.as_ref(), &thread_id).await?;
        let history = service.list_messages(&thread_id).await?;
        let messages = Self::normalize_history(
            service.as_ref(),
            &mut ctx.artifacts,
            &mut ctx.session.debug,
            &history,
        )
        .await?;

        tracing::info!(
            "[MessageNormalizer] Thread {}: {} messages, {} records",
            thread_id,
            history.len(),
            messages.len()
        );
        ctx.session.messages = messages;
        UsageAccumulator::apply(&mut ctx.session, &totals);
        Ok(())
    }

    /// Converts a history into records, one per content item, in order.
    ///
    /// Every record is also appended to the debug trace.
    pub async fn normalize_history(
        service: &dyn AssistantService,
        store: &mut ArtifactStore,
        debug: &mut DebugTrace,
        history: &[ThreadMessage],
    ) -> Result<Vec<NormalizedMessage>> {
        let mut records = Vec::with_capacity(history.iter().map(|m| m.content.len()).sum());
        for message in history {
            for item in &message.content {
                let record = Self::normalize_item(service, store, message.role, item).await?;
                debug.push(DEBUG_MESSAGES, &record);
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Converts one content item.
    pub async fn normalize_item(
        service: &dyn AssistantService,
        store: &mut ArtifactStore,
        role: MessageRole,
        item: &ContentItem,
    ) -> Result<NormalizedMessage> {
        let text_value = item
            .text
            .as_ref()
            .map(|t| t.value.clone())
            .unwrap_or_default();

        match ContentClass::of(item) {
            ContentClass::Recognized(ContentKind::Text) => {
                Ok(NormalizedMessage::text(role, item.clone(), text_value))
            }
            ContentClass::Recognized(ContentKind::File) => {
                let (file_id, suffix, file_name) = file_annotation(item)
                    .and_then(|a| Some((a.file_path_id()?, a.file_extension(), a.file_name())))
                    .ok_or_else(|| TestaError::internal("file item without file-path annotation"))?;
                let path = ArtifactFetcher::fetch(service, store, file_id, suffix).await?;
                Ok(NormalizedMessage::file(
                    role,
                    item.clone(),
                    path,
                    text_value,
                    file_name.to_string(),
                ))
            }
            ContentClass::Recognized(ContentKind::Image) => {
                let file_id = item
                    .image_file
                    .as_ref()
                    .map(|i| i.file_id.as_str())
                    .ok_or_else(|| TestaError::internal("image item without file id"))?;
                let path = ArtifactFetcher::fetch(service, store, file_id, IMAGE_SUFFIX).await?;
                Ok(NormalizedMessage::image(role, item.clone(), path))
            }
            ContentClass::Unrecognized(raw) => {
                tracing::warn!("[MessageNormalizer] Unrecognized content type '{}'", raw);
                Ok(NormalizedMessage::unrecognized(role, item.clone()))
            }
        }
    }
}
