//! In-memory DocumentPlatform that records every call
//!
//! Used by tests of crates that drive the platform. Calls are kept in the
//! order they were made so tests can assert on exact interaction sequences.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::block::BlockToInsert;
use crate::platform::{DocumentPlatform, InsertOptions, MessageKey, MessageLevel, Result};
use crate::ApiError;

/// One recorded interaction with the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    InsertBatch {
        target_uuid: String,
        blocks: Vec<BlockToInsert>,
        options: InsertOptions,
    },
    UpdateBlock {
        uuid: String,
        content: String,
    },
    RemoveBlock {
        uuid: String,
    },
    ShowMsg {
        key: MessageKey,
        message: String,
        level: MessageLevel,
    },
    CloseMsg {
        key: MessageKey,
    },
    ExitEditingMode {
        select_block: bool,
    },
}

impl PlatformCall {
    /// Whether this call changes the document (as opposed to UI-only calls)
    pub fn mutates_document(&self) -> bool {
        matches!(
            self,
            PlatformCall::InsertBatch { .. }
                | PlatformCall::UpdateBlock { .. }
                | PlatformCall::RemoveBlock { .. }
        )
    }
}

#[derive(Default)]
pub struct RecordingPlatform {
    calls: Mutex<Vec<PlatformCall>>,
    next_key: AtomicU64,
    fail_inserts: Option<String>,
}

impl RecordingPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: make every `insert_batch_block` call fail with `message`
    pub fn failing_inserts(mut self, message: impl Into<String>) -> Self {
        self.fail_inserts = Some(message.into());
        self
    }

    /// Snapshot of all calls made so far
    pub fn calls(&self) -> Vec<PlatformCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// All notifications shown so far, as `(message, level)` pairs
    pub fn messages(&self) -> Vec<(String, MessageLevel)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PlatformCall::ShowMsg { message, level, .. } => Some((message, level)),
                _ => None,
            })
            .collect()
    }

    /// Calls that modified the document
    pub fn document_mutations(&self) -> Vec<PlatformCall> {
        self.calls()
            .into_iter()
            .filter(PlatformCall::mutates_document)
            .collect()
    }

    fn record(&self, call: PlatformCall) -> Result<()> {
        self.calls
            .lock()
            .map_err(|e| ApiError::InternalError {
                message: format!("recording lock poisoned: {}", e),
            })?
            .push(call);
        Ok(())
    }
}

#[async_trait]
impl DocumentPlatform for RecordingPlatform {
    async fn insert_batch_block(
        &self,
        target_uuid: &str,
        blocks: Vec<BlockToInsert>,
        options: InsertOptions,
    ) -> Result<()> {
        if let Some(message) = &self.fail_inserts {
            return Err(ApiError::InvalidOperation {
                message: message.clone(),
            });
        }
        self.record(PlatformCall::InsertBatch {
            target_uuid: target_uuid.to_string(),
            blocks,
            options,
        })
    }

    async fn update_block(&self, uuid: &str, content: &str) -> Result<()> {
        self.record(PlatformCall::UpdateBlock {
            uuid: uuid.to_string(),
            content: content.to_string(),
        })
    }

    async fn remove_block(&self, uuid: &str) -> Result<()> {
        self.record(PlatformCall::RemoveBlock {
            uuid: uuid.to_string(),
        })
    }

    async fn show_msg(&self, message: &str, level: MessageLevel) -> Result<MessageKey> {
        let key = MessageKey(format!(
            "msg-{}",
            self.next_key.fetch_add(1, Ordering::SeqCst)
        ));
        self.record(PlatformCall::ShowMsg {
            key: key.clone(),
            message: message.to_string(),
            level,
        })?;
        Ok(key)
    }

    async fn close_msg(&self, key: &MessageKey) -> Result<()> {
        self.record(PlatformCall::CloseMsg { key: key.clone() })
    }

    async fn exit_editing_mode(&self, select_block: bool) -> Result<()> {
        self.record(PlatformCall::ExitEditingMode { select_block })
    }
}
