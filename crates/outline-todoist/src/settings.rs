//! Plugin settings as stored by the outline host
//!
//! The host hands settings over as a JSON object with camelCase keys. Every
//! field has a default so partially configured installs still deserialize.

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::format::FormatOptions;

/// Value of `retrieveDefaultProject` when no project was picked
pub const NO_PROJECT_SELECTED: &str = "--- ---";

/// Environment variable consulted when `apiToken` is empty
pub const API_KEY_ENV: &str = "TODOIST_API_KEY";

pub const DEFAULT_JOURNAL_DATE_FORMAT: &str = "%A, %d.%m.%Y";

/// What to do with a task whose comments could not be fetched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentFailurePolicy {
    /// Insert the task without comment metadata
    #[default]
    Placeholder,
    /// Leave the task and its subtasks out of the document
    Skip,
    /// Fail the whole retrieve
    Abort,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RetrieveSettings {
    pub api_token: String,
    /// Project picked in the settings UI, formatted as `Name (id)`
    pub retrieve_default_project: String,
    pub retrieve_clear_tasks: bool,
    pub project_name_as_parent_blk: bool,
    pub retrieve_append_url: bool,
    pub retrieve_append_todo: bool,
    pub retrieve_append_creation_date_time: bool,
    /// strftime pattern of journal page names
    pub journal_date_format: String,
    pub comment_failure_policy: CommentFailurePolicy,
}

impl Default for RetrieveSettings {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            retrieve_default_project: NO_PROJECT_SELECTED.to_string(),
            retrieve_clear_tasks: false,
            project_name_as_parent_blk: false,
            retrieve_append_url: false,
            retrieve_append_todo: false,
            retrieve_append_creation_date_time: false,
            journal_date_format: DEFAULT_JOURNAL_DATE_FORMAT.to_string(),
            comment_failure_policy: CommentFailurePolicy::default(),
        }
    }
}

impl RetrieveSettings {
    pub fn from_json(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    /// Fill an empty `apiToken` from `TODOIST_API_KEY`
    pub fn with_env_overrides(self) -> Self {
        self.with_api_key_fallback(std::env::var(API_KEY_ENV).ok())
    }

    fn with_api_key_fallback(mut self, api_key: Option<String>) -> Self {
        if self.api_token.trim().is_empty() {
            if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
                info!("[RetrieveSettings] Using API token from {}", API_KEY_ENV);
                self.api_token = key;
            }
        }
        self
    }

    pub fn api_token(&self) -> Option<&str> {
        Some(self.api_token.trim()).filter(|t| !t.is_empty())
    }

    pub fn default_project(&self) -> Option<ProjectRef> {
        ProjectRef::parse(&self.retrieve_default_project)
    }

    /// Formatter options; `offset` is the zone creation times are shown in
    pub fn format_options(&self, offset: FixedOffset) -> FormatOptions {
        FormatOptions {
            append_url: self.retrieve_append_url,
            append_todo: self.retrieve_append_todo,
            append_creation_date_time: self.retrieve_append_creation_date_time,
            journal_date_format: self.journal_date_format.clone(),
            offset,
        }
    }
}

/// A project as referenced from settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRef {
    pub name: String,
    pub id: String,
}

impl ProjectRef {
    /// Parse `Name (id)`; the id is the last parenthesised group, so names
    /// containing parentheses survive
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() || value == NO_PROJECT_SELECTED {
            return None;
        }

        let open = value.rfind('(')?;
        let close = open + value[open..].find(')')?;
        let id = value[open + 1..close].trim();
        if id.is_empty() {
            return None;
        }

        Some(Self {
            name: value[..open].trim().to_string(),
            id: id.to_string(),
        })
    }

    /// Page reference used as heading block in project mode
    pub fn page_link(&self) -> String {
        format!("[[{}]]", self.name)
    }
}
