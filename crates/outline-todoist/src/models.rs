use serde::{Deserialize, Serialize};

const TASK_URL_BASE: &str = "https://app.todoist.com/app/task";

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Todoist task as returned by the tasks endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TodoistTask {
    pub id: String,

    pub content: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,

    #[serde(default)]
    pub project_id: Option<String>,

    #[serde(default)]
    pub parent_id: Option<String>,

    #[serde(default)]
    pub due: Option<TodoistDue>,

    /// Creation timestamp, RFC3339
    #[serde(
        rename = "added_at",
        alias = "created_at",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub created_at: String,

    #[serde(default)]
    url: Option<String>,
}

impl TodoistTask {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            description: String::new(),
            project_id: None,
            parent_id: None,
            due: None,
            created_at: String::new(),
            url: None,
        }
    }

    /// Builder: set the parent task
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_due(mut self, date: impl Into<String>) -> Self {
        self.due = Some(TodoistDue::on(date));
        self
    }

    pub fn with_created_at(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = created_at.into();
        self
    }

    /// Canonical link to the task in the Todoist web app
    pub fn url(&self) -> String {
        match &self.url {
            Some(url) if !url.is_empty() => url.clone(),
            _ => format!("{}/{}", TASK_URL_BASE, self.id),
        }
    }

    /// Parent identifier, treating an empty string like an absent one
    pub fn parent(&self) -> Option<&str> {
        self.parent_id.as_deref().filter(|p| !p.is_empty())
    }

    pub fn is_root(&self) -> bool {
        self.parent().is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TodoistDue {
    /// `YYYY-MM-DD`, or a date-time for tasks due at a specific time
    pub date: String,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub string: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
}

impl TodoistDue {
    pub fn on(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            timezone: None,
            string: None,
            is_recurring: false,
        }
    }
}

/// Comment (called "note" in the Sync API) attached to a task
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TodoistComment {
    pub id: String,

    #[serde(alias = "item_id")]
    pub task_id: String,

    #[serde(default)]
    pub content: Option<String>,

    #[serde(alias = "file_attachment", default)]
    pub attachment: Option<TodoistAttachment>,
}

impl TodoistComment {
    pub fn text(id: impl Into<String>, task_id: impl Into<String>, content: &str) -> Self {
        Self {
            id: id.into(),
            task_id: task_id.into(),
            content: Some(content.to_string()),
            attachment: None,
        }
    }

    /// Builder: attach a file to the comment
    pub fn with_attachment(mut self, file_name: &str, file_url: &str) -> Self {
        self.attachment = Some(TodoistAttachment {
            file_name: file_name.to_string(),
            file_url: file_url.to_string(),
        });
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TodoistAttachment {
    pub file_name: String,
    pub file_url: String,
}

/// Which tasks to retrieve
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskQuery {
    /// All active tasks of one project
    Project(String),
    /// A Todoist filter expression such as `today` or `#Work & p1`
    Filter(String),
}

impl std::fmt::Display for TaskQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskQuery::Project(id) => write!(f, "project:{}", id),
            TaskQuery::Filter(query) => write!(f, "filter:{}", query),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PagedResponse<T> {
    #[serde(alias = "items")]
    #[serde(alias = "data")]
    pub results: Vec<T>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Command for Sync API write operations
#[derive(Debug, Serialize)]
pub struct SyncCommand {
    /// Command type (e.g., "item_delete")
    #[serde(rename = "type")]
    pub command_type: String,
    pub uuid: String,
    pub args: serde_json::Value,
}

/// Command response from Sync API
#[derive(Debug, Deserialize)]
pub struct CommandResponse {
    pub uuid: String,
    /// "ok" on success
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_from_api_json() {
        let json = r#"{
            "id": "6X7rM8997g3RQmvh",
            "content": "Buy milk",
            "description": "",
            "project_id": "6Jf8VQXxpwv56VQ7",
            "parent_id": null,
            "due": {"date": "2024-03-08", "string": "tomorrow", "is_recurring": false, "timezone": null},
            "added_at": "2024-03-07T09:15:02.123456Z",
            "labels": ["errand"],
            "priority": 1
        }"#;
        let task: TodoistTask = serde_json::from_str(json).unwrap();

        assert_eq!(task.id, "6X7rM8997g3RQmvh");
        assert!(task.is_root());
        assert_eq!(task.due.as_ref().unwrap().date, "2024-03-08");
        assert_eq!(task.created_at, "2024-03-07T09:15:02.123456Z");
        assert_eq!(task.url(), "https://app.todoist.com/app/task/6X7rM8997g3RQmvh");
    }

    #[test]
    fn test_task_keeps_service_url() {
        let json = r#"{"id": "1", "content": "x", "url": "https://todoist.com/showTask?id=1", "created_at": "2024-01-01T00:00:00Z"}"#;
        let task: TodoistTask = serde_json::from_str(json).unwrap();

        assert_eq!(task.url(), "https://todoist.com/showTask?id=1");
        assert_eq!(task.created_at, "2024-01-01T00:00:00Z");
    }

    #[test]
    fn test_null_description() {
        let json = r#"{"id": "1", "content": "x", "description": null, "added_at": null}"#;
        let task: TodoistTask = serde_json::from_str(json).unwrap();
        assert_eq!(task.description, "");
        assert_eq!(task.created_at, "");
    }

    #[test]
    fn test_empty_parent_is_root() {
        let task = TodoistTask::new("1", "x").with_parent("");
        assert!(task.is_root());
        assert_eq!(task.parent(), None);
    }

    #[test]
    fn test_comment_from_v1_json() {
        let json = r#"{
            "id": "c1",
            "item_id": "t1",
            "content": "see file",
            "file_attachment": {"file_name": "plan.pdf", "file_url": "https://files.todoist.com/plan.pdf", "file_type": "application/pdf"}
        }"#;
        let comment: TodoistComment = serde_json::from_str(json).unwrap();

        assert_eq!(comment.task_id, "t1");
        assert_eq!(comment.attachment.unwrap().file_name, "plan.pdf");
    }

    #[test]
    fn test_paged_response_aliases() {
        let page: PagedResponse<TodoistComment> =
            serde_json::from_str(r#"{"results": [], "next_cursor": "abc"}"#).unwrap();
        assert_eq!(page.next_cursor.as_deref(), Some("abc"));

        let page: PagedResponse<TodoistComment> =
            serde_json::from_str(r#"{"items": []}"#).unwrap();
        assert!(page.results.is_empty());
        assert!(page.next_cursor.is_none());
    }
}
