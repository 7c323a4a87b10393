//! Block text for a retrieved task
//!
//! Decorations are applied in a fixed order: link, scheduled date, creation
//! prefix, then the TODO marker. The marker goes last because the outline
//! only recognises a task when the keyword starts the block.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use tracing::warn;

use crate::models::{TodoistDue, TodoistTask};
use crate::settings::DEFAULT_JOURNAL_DATE_FORMAT;

pub const TODO_MARKER: &str = "TODO";

#[derive(Debug, Clone, PartialEq)]
pub struct FormatOptions {
    pub append_url: bool,
    pub append_todo: bool,
    pub append_creation_date_time: bool,
    /// strftime pattern for the creation date page link
    pub journal_date_format: String,
    /// Zone the creation time is rendered in
    pub offset: FixedOffset,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            append_url: false,
            append_todo: false,
            append_creation_date_time: false,
            journal_date_format: DEFAULT_JOURNAL_DATE_FORMAT.to_string(),
            offset: Utc.fix(),
        }
    }
}

pub fn format_content(
    content: &str,
    url: &str,
    due: Option<&TodoistDue>,
    created_at: &str,
    options: &FormatOptions,
) -> String {
    let mut text = content.to_string();

    if options.append_url {
        text = format!("[{}]({})", text, url);
    }

    if let Some(due) = due.filter(|d| !d.date.is_empty()) {
        text = format!("{}\n{}", text, scheduled_day(&due.date));
    }

    if options.append_creation_date_time {
        match DateTime::parse_from_rfc3339(created_at) {
            Ok(created) => {
                let created = created.with_timezone(&options.offset);
                let date_part = format!(
                    "[[{}]]",
                    created.format(journal_pattern(&options.journal_date_format))
                );
                let time_part = created.format("%H:%M");
                text = format!("{} **{}** {}", date_part, time_part, text);
            }
            Err(e) => {
                warn!(
                    "[format] Skipping creation prefix, unparseable timestamp {:?}: {}",
                    created_at, e
                );
            }
        }
    }

    if options.append_todo {
        text = format!("{} {}", TODO_MARKER, text);
    }

    text
}

/// Full block text for a task: decorated content plus `: description`
pub fn task_content(task: &TodoistTask, options: &FormatOptions) -> String {
    let mut text = format_content(
        &task.content,
        &task.url(),
        task.due.as_ref(),
        &task.created_at,
        options,
    );
    if !task.description.is_empty() {
        text.push_str(": ");
        text.push_str(&task.description);
    }
    text
}

/// `SCHEDULED: <2024-03-08 Fri>` for the calendar date of a due value
pub fn scheduled_day(due_date: &str) -> String {
    let day = due_date
        .get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
    match day {
        Some(day) => format!("SCHEDULED: <{}>", day.format("%Y-%m-%d %a")),
        None => format!("SCHEDULED: <{}>", due_date),
    }
}

/// The configured pattern, or the default when it has invalid specifiers
fn journal_pattern(pattern: &str) -> &str {
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        warn!(
            "[format] Invalid journal date format {:?}, using {:?}",
            pattern, DEFAULT_JOURNAL_DATE_FORMAT
        );
        DEFAULT_JOURNAL_DATE_FORMAT
    } else {
        pattern
    }
}
