//! Document platform boundary
//!
//! The outline host (block storage, editor, toasts) is reached only through
//! [`DocumentPlatform`]. Sync code receives an implementation explicitly and never
//! touches ambient host state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::block::BlockToInsert;
use crate::ApiError;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Severity of a transient user notification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

/// Handle of a notification that is still on screen
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageKey(pub String);

/// Placement of an inserted batch relative to the target block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertOptions {
    /// `true` inserts the batch after the target, `false` inserts it as children
    pub sibling: bool,
}

impl InsertOptions {
    pub fn as_children() -> Self {
        Self { sibling: false }
    }

    pub fn as_siblings() -> Self {
        Self { sibling: true }
    }
}

impl Default for InsertOptions {
    fn default() -> Self {
        Self::as_siblings()
    }
}

/// Block and UI operations offered by the outline host.
///
/// Every call is a suspension point; implementations are expected to be
/// driven from a single logical task.
#[async_trait]
pub trait DocumentPlatform: Send + Sync {
    /// Insert a forest of blocks relative to `target_uuid`
    async fn insert_batch_block(
        &self,
        target_uuid: &str,
        blocks: Vec<BlockToInsert>,
        options: InsertOptions,
    ) -> Result<()>;

    async fn update_block(&self, uuid: &str, content: &str) -> Result<()>;

    async fn remove_block(&self, uuid: &str) -> Result<()>;

    /// Show a transient notification and return its key
    async fn show_msg(&self, message: &str, level: MessageLevel) -> Result<MessageKey>;

    async fn close_msg(&self, key: &MessageKey) -> Result<()>;

    /// Leave the editor; `select_block` keeps the last edited block selected
    async fn exit_editing_mode(&self, select_block: bool) -> Result<()>;
}
