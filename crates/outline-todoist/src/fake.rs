//! In-memory Todoist for tests and offline runs
//!
//! FakeTaskService implements TaskService without any network access:
//! - Tasks are registered per query and returned in registration order
//! - Comment and delete failures can be injected per task
//! - Every comment request and delete attempt is logged for assertions

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

use crate::models::{TaskQuery, TodoistComment, TodoistTask};
use crate::task_service::{Result, TaskService};

#[derive(Default)]
struct FakeState {
    tasks: HashMap<TaskQuery, Vec<TodoistTask>>,
    comments: HashMap<String, Vec<TodoistComment>>,
    deleted: HashSet<String>,
    deletion_order: Vec<String>,
    listing_requests: Vec<TaskQuery>,
    comment_requests: Vec<String>,
    delete_attempts: Vec<String>,
}

#[derive(Default)]
pub struct FakeTaskService {
    state: RwLock<FakeState>,
    listing_failure: Option<String>,
    comment_failures: HashMap<String, String>,
    delete_failures: HashMap<String, String>,
}

impl FakeTaskService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: tasks returned for `query`
    pub fn with_tasks(mut self, query: TaskQuery, tasks: Vec<TodoistTask>) -> Self {
        self.state.get_mut().tasks.insert(query, tasks);
        self
    }

    /// Builder: comments returned for `task_id`
    pub fn with_comments(mut self, task_id: &str, comments: Vec<TodoistComment>) -> Self {
        self.state
            .get_mut()
            .comments
            .insert(task_id.to_string(), comments);
        self
    }

    /// Builder: every task listing fails with `message`
    pub fn failing_listing(mut self, message: &str) -> Self {
        self.listing_failure = Some(message.to_string());
        self
    }

    /// Builder: fetching comments of `task_id` fails with `message`
    pub fn failing_comments(mut self, task_id: &str, message: &str) -> Self {
        self.comment_failures
            .insert(task_id.to_string(), message.to_string());
        self
    }

    /// Builder: deleting `task_id` fails with `message`
    pub fn failing_delete(mut self, task_id: &str, message: &str) -> Self {
        self.delete_failures
            .insert(task_id.to_string(), message.to_string());
        self
    }

    /// Task ids passed to `delete_task`, including failed attempts
    pub async fn delete_attempts(&self) -> Vec<String> {
        self.state.read().await.delete_attempts.clone()
    }

    /// Task ids successfully deleted, in deletion order
    pub async fn deleted(&self) -> Vec<String> {
        self.state.read().await.deletion_order.clone()
    }

    /// Queries passed to `get_tasks`, in request order
    pub async fn listing_requests(&self) -> Vec<TaskQuery> {
        self.state.read().await.listing_requests.clone()
    }

    /// Task ids whose comments were requested, in request order
    pub async fn comment_requests(&self) -> Vec<String> {
        self.state.read().await.comment_requests.clone()
    }
}

#[async_trait]
impl TaskService for FakeTaskService {
    async fn get_tasks(&self, query: &TaskQuery) -> Result<Vec<TodoistTask>> {
        let mut state = self.state.write().await;
        state.listing_requests.push(query.clone());

        if let Some(message) = &self.listing_failure {
            return Err(message.clone().into());
        }

        Ok(state
            .tasks
            .get(query)
            .map(|tasks| {
                tasks
                    .iter()
                    .filter(|t| !state.deleted.contains(&t.id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_comments(&self, task_id: &str) -> Result<Vec<TodoistComment>> {
        let mut state = self.state.write().await;
        state.comment_requests.push(task_id.to_string());

        if let Some(message) = self.comment_failures.get(task_id) {
            return Err(message.clone().into());
        }
        Ok(state.comments.get(task_id).cloned().unwrap_or_default())
    }

    async fn delete_task(&self, task_id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state.delete_attempts.push(task_id.to_string());

        if let Some(message) = self.delete_failures.get(task_id) {
            return Err(message.clone().into());
        }
        if !state.deleted.insert(task_id.to_string()) {
            return Err(format!("Task {} not found", task_id).into());
        }
        state.deletion_order.push(task_id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deleted_tasks_disappear_from_listing() {
        let query = TaskQuery::Filter("today".to_string());
        let fake = FakeTaskService::new().with_tasks(
            query.clone(),
            vec![TodoistTask::new("1", "a"), TodoistTask::new("2", "b")],
        );

        fake.delete_task("1").await.unwrap();
        let remaining = fake.get_tasks(&query).await.unwrap();

        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "2");
        assert_eq!(fake.deleted().await, vec!["1".to_string()]);
        assert_eq!(fake.listing_requests().await, vec![query]);
    }

    #[tokio::test]
    async fn test_deleting_twice_fails() {
        let fake = FakeTaskService::new();
        fake.delete_task("1").await.unwrap();
        assert!(fake.delete_task("1").await.is_err());
        assert_eq!(fake.delete_attempts().await.len(), 2);
        assert_eq!(fake.deleted().await, vec!["1".to_string()]);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let fake = FakeTaskService::new()
            .failing_comments("1", "rate limited")
            .failing_delete("2", "forbidden");

        let err = fake.get_comments("1").await.unwrap_err();
        assert_eq!(err.to_string(), "rate limited");
        assert!(fake.get_comments("3").await.unwrap().is_empty());
        assert_eq!(
            fake.comment_requests().await,
            vec!["1".to_string(), "3".to_string()]
        );

        assert!(fake.delete_task("2").await.is_err());
        assert!(fake.deleted().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_query_is_empty() {
        let fake = FakeTaskService::new();
        let tasks = fake
            .get_tasks(&TaskQuery::Project("p".to_string()))
            .await
            .unwrap();
        assert!(tasks.is_empty());
    }
}
