//! Comment and attachment metadata for task blocks

use outline_api::{BlockProperties, BlockToInsert, DocumentPlatform, MessageLevel};
use tracing::{debug, error};

use crate::error::EnrichmentError;
use crate::models::TodoistComment;
use crate::task_service::TaskService;

const COMMENT_SEPARATOR: &str = ", ";

/// Fetches a task's comments and merges them into its block properties.
///
/// Failures are reported to the user as a transient error notification and
/// handed back to the caller, which decides what happens to the block.
pub struct CommentEnricher<'a, S: ?Sized, P: ?Sized> {
    service: &'a S,
    platform: &'a P,
}

impl<'a, S, P> CommentEnricher<'a, S, P>
where
    S: TaskService + ?Sized,
    P: DocumentPlatform + ?Sized,
{
    pub fn new(service: &'a S, platform: &'a P) -> Self {
        Self { service, platform }
    }

    pub async fn enrich(
        &self,
        task_id: &str,
        mut block: BlockToInsert,
    ) -> Result<BlockToInsert, EnrichmentError> {
        match self.service.get_comments(task_id).await {
            Ok(comments) => {
                debug!(
                    "[CommentEnricher] task={} comments={}",
                    task_id,
                    comments.len()
                );
                merge_comments(&mut block.properties, &comments);
                Ok(block)
            }
            Err(source) => {
                error!(
                    "[CommentEnricher] Failed to fetch comments for task {}: {}",
                    task_id, source
                );
                let message = format!("Unable to retrieve comments: {}", source);
                if let Err(e) = self.platform.show_msg(&message, MessageLevel::Error).await {
                    error!("[CommentEnricher] Failed to show notification: {}", e);
                }
                Err(EnrichmentError {
                    task_id: task_id.to_string(),
                    source,
                })
            }
        }
    }
}

/// Merge comments in service order: the last attachment wins, texts accumulate
pub fn merge_comments(properties: &mut BlockProperties, comments: &[TodoistComment]) {
    for comment in comments {
        if let Some(attachment) = &comment.attachment {
            properties.attachments = format!("[{}]({})", attachment.file_name, attachment.file_url);
        }
        if let Some(text) = comment.content.as_deref().filter(|t| !t.is_empty()) {
            if !properties.comments.is_empty() {
                properties.comments.push_str(COMMENT_SEPARATOR);
            }
            properties.comments.push_str(text);
        }
    }
}
