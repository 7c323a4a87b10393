//! Todoist retrieval into an outline document
//!
//! - `client` - TodoistClient (HTTP client for the Todoist API)
//! - `task_service` - TaskService seam over the client
//! - `fake` - FakeTaskService, in-memory Todoist for tests
//! - `models` - API models
//! - `settings` - plugin settings as stored by the host
//! - `format` - block text for a task
//! - `comments` - comment and attachment metadata
//! - `tree` - nesting the flat task list into blocks
//! - `retrieve` - TaskRetriever, the retrieve command
//! - `telemetry` - tracing subscriber setup

pub mod client;
pub mod comments;
pub mod error;
pub mod fake;
pub mod format;
pub mod models;
pub mod retrieve;
pub mod settings;
pub mod task_service;
pub mod telemetry;
pub mod tree;

pub use client::TodoistClient;
pub use comments::{merge_comments, CommentEnricher};
pub use error::{EnrichmentError, RetrieveError};
pub use fake::FakeTaskService;
pub use format::{format_content, task_content, FormatOptions};
pub use models::{TaskQuery, TodoistComment, TodoistDue, TodoistTask};
pub use retrieve::{
    DeletionFailure, DeletionReport, RetrieveOutcome, RetrieveReport, TaskRetriever,
};
pub use settings::{CommentFailurePolicy, ProjectRef, RetrieveSettings};
pub use task_service::TaskService;
pub use tree::{BuildReport, BuiltTree, TreeBuilder};
