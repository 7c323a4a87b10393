//! Outline document vocabulary shared by sync integrations
//!
//! - `block` - BlockToInsert batches and their properties
//! - `platform` - DocumentPlatform trait (block CRUD, notifications, editor state)
//! - `recording` - RecordingPlatform, an in-memory platform for tests

use serde::{Deserialize, Serialize};

pub mod block;
pub mod platform;
pub mod recording;

pub use block::{forest_len, BlockProperties, BlockToInsert};
pub use platform::{DocumentPlatform, InsertOptions, MessageKey, MessageLevel};
pub use recording::{PlatformCall, RecordingPlatform};

/// Structured error types for platform operations.
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum ApiError {
    #[error("Block not found: {id}")]
    BlockNotFound { id: String },

    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },

    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}
