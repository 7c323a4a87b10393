//! Task service boundary
//!
//! `TaskService` is everything the retrieve flow needs from Todoist. The HTTP
//! `TodoistClient` implements it for production; `FakeTaskService` implements
//! it in memory for tests.

use async_trait::async_trait;

use crate::client::TodoistClient;
use crate::models::{TaskQuery, TodoistComment, TodoistTask};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[async_trait]
pub trait TaskService: Send + Sync {
    /// Tasks for a project or filter, in the order the service returns them
    async fn get_tasks(&self, query: &TaskQuery) -> Result<Vec<TodoistTask>>;

    async fn get_comments(&self, task_id: &str) -> Result<Vec<TodoistComment>>;

    async fn delete_task(&self, task_id: &str) -> Result<()>;
}

#[async_trait]
impl TaskService for TodoistClient {
    async fn get_tasks(&self, query: &TaskQuery) -> Result<Vec<TodoistTask>> {
        TodoistClient::get_tasks(self, query).await
    }

    async fn get_comments(&self, task_id: &str) -> Result<Vec<TodoistComment>> {
        TodoistClient::get_comments(self, task_id).await
    }

    async fn delete_task(&self, task_id: &str) -> Result<()> {
        TodoistClient::delete_task(self, task_id).await
    }
}
