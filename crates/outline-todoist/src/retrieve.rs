//! Retrieve Todoist tasks into the outline
//!
//! `TaskRetriever` runs one retrieve per call:
//! 1. resolve the query (default project or filter text)
//! 2. list the tasks, stop early when there are none
//! 3. nest them with `TreeBuilder`
//! 4. insert the forest under a project heading or in place of the target block
//! 5. optionally delete the retrieved tasks from Todoist
//!
//! All collaborators are passed in; nothing is read from ambient host state.
//! Runs are not guarded against re-entrancy, so two concurrent retrieves into
//! the same block race on it.

use chrono::{FixedOffset, Local, Offset};
use outline_api::{DocumentPlatform, InsertOptions, MessageLevel};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::client::TodoistClient;
use crate::error::RetrieveError;
use crate::models::{TaskQuery, TodoistTask};
use crate::settings::RetrieveSettings;
use crate::task_service::TaskService;
use crate::tree::{BuildReport, TreeBuilder};

pub const LOADING_MESSAGE: &str = "Loading tasks...";
pub const NO_TASKS_MESSAGE: &str = "There are no tasks";
pub const NOTHING_PLACED_MESSAGE: &str = "None of the retrieved tasks could be placed in the outline";

/// Outcome of the optional deletion pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionReport {
    /// Deleted task ids, in deletion order
    pub deleted: Vec<String>,
    /// First failure; later tasks were not attempted
    pub failure: Option<DeletionFailure>,
    /// Tasks never attempted because of the failure
    pub abandoned: usize,
    /// Tasks kept in Todoist because they were left out of the document
    pub retained: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionFailure {
    pub task_id: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrieveReport {
    pub query: TaskQuery,
    pub retrieved: usize,
    pub build: BuildReport,
    pub deletion: Option<DeletionReport>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrieveOutcome {
    /// The query matched no tasks; the document was not touched
    NoTasks,
    /// Tasks were listed but none survived tree building; the document was
    /// not touched and nothing was deleted
    NothingPlaced(BuildReport),
    Synced(RetrieveReport),
}

/// Document side of a run, before the loading message is closed
enum Placement {
    NoTasks,
    NothingPlaced(BuildReport),
    Inserted {
        query: TaskQuery,
        tasks: Vec<TodoistTask>,
        build: BuildReport,
    },
}

pub struct TaskRetriever {
    settings: RetrieveSettings,
    service: Arc<dyn TaskService>,
    platform: Arc<dyn DocumentPlatform>,
    offset: FixedOffset,
}

impl TaskRetriever {
    pub fn new(
        settings: RetrieveSettings,
        service: Arc<dyn TaskService>,
        platform: Arc<dyn DocumentPlatform>,
    ) -> Self {
        Self {
            settings,
            service,
            platform,
            offset: Local::now().offset().fix(),
        }
    }

    /// Retriever talking to the Todoist API with the configured token
    pub fn from_settings(
        settings: RetrieveSettings,
        platform: Arc<dyn DocumentPlatform>,
    ) -> Result<Self, RetrieveError> {
        let token = settings.api_token().ok_or(RetrieveError::MissingApiToken)?;
        let client = TodoistClient::new(token).map_err(RetrieveError::Client)?;
        Ok(Self::new(settings, Arc::new(client), platform))
    }

    /// Builder: zone used for creation timestamps (defaults to local time)
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn settings(&self) -> &RetrieveSettings {
        &self.settings
    }

    /// Query for optional command parameters: none means the default project
    pub fn resolve_query(&self, params: Option<&str>) -> Result<TaskQuery, RetrieveError> {
        match params.map(str::trim).filter(|p| !p.is_empty()) {
            Some(filter) => Ok(TaskQuery::Filter(filter.to_string())),
            None => self
                .settings
                .default_project()
                .map(|project| TaskQuery::Project(project.id))
                .ok_or(RetrieveError::MissingDefaultProject),
        }
    }

    /// Run one retrieve into the block `block_uuid`.
    ///
    /// The loading message is closed exactly once, whether the run fails or
    /// not. With `retrieveClearTasks`, tasks left out under
    /// `CommentFailurePolicy::Skip` are kept in Todoist.
    #[tracing::instrument(name = "todoist.retrieve", skip(self))]
    pub async fn retrieve_tasks(
        &self,
        block_uuid: &str,
        params: Option<&str>,
    ) -> Result<RetrieveOutcome, RetrieveError> {
        let loading = self
            .platform
            .show_msg(LOADING_MESSAGE, MessageLevel::Info)
            .await?;

        let placed = self.place_tasks(block_uuid, params).await;
        let closed = self.platform.close_msg(&loading).await;
        if let (Err(_), Err(e)) = (&placed, &closed) {
            warn!("[TaskRetriever] Failed to close loading message: {}", e);
        }
        let placed = placed?;
        closed?;

        match placed {
            Placement::NoTasks => {
                self.platform
                    .show_msg(NO_TASKS_MESSAGE, MessageLevel::Info)
                    .await?;
                Ok(RetrieveOutcome::NoTasks)
            }
            Placement::NothingPlaced(build) => {
                self.platform
                    .show_msg(NOTHING_PLACED_MESSAGE, MessageLevel::Warning)
                    .await?;
                Ok(RetrieveOutcome::NothingPlaced(build))
            }
            Placement::Inserted {
                query,
                tasks,
                build,
            } => {
                let deletion = if self.settings.retrieve_clear_tasks {
                    let (deletable, retained): (Vec<_>, Vec<_>) = tasks
                        .iter()
                        .cloned()
                        .partition(|task| !build.skipped.contains(&task.id));
                    if !retained.is_empty() {
                        warn!(
                            "[TaskRetriever] Keeping {} skipped task(s) in Todoist",
                            retained.len()
                        );
                    }
                    let mut report = self.delete_all_tasks(&deletable).await?;
                    report.retained = retained.into_iter().map(|task| task.id).collect();
                    Some(report)
                } else {
                    None
                };

                Ok(RetrieveOutcome::Synced(RetrieveReport {
                    query,
                    retrieved: tasks.len(),
                    build,
                    deletion,
                }))
            }
        }
    }

    /// List, build and insert; everything that happens under the loading message
    async fn place_tasks(
        &self,
        block_uuid: &str,
        params: Option<&str>,
    ) -> Result<Placement, RetrieveError> {
        let query = match self.resolve_query(params) {
            Ok(query) => query,
            Err(e) => {
                warn!("[TaskRetriever] {}", e);
                self.platform
                    .show_msg(&e.to_string(), MessageLevel::Error)
                    .await?;
                return Err(e);
            }
        };

        let tasks = self
            .service
            .get_tasks(&query)
            .await
            .map_err(|source| RetrieveError::Listing {
                query: query.to_string(),
                source,
            })?;
        info!("[TaskRetriever] {} task(s) for {}", tasks.len(), query);

        if tasks.is_empty() {
            return Ok(Placement::NoTasks);
        }

        let options = self.settings.format_options(self.offset);
        let built = TreeBuilder::new(self.service.as_ref(), self.platform.as_ref(), &options)
            .with_policy(self.settings.comment_failure_policy)
            .build(&tasks)
            .await?;

        if built.blocks.is_empty() {
            return Ok(Placement::NothingPlaced(built.report));
        }

        self.insert_blocks(block_uuid, built.blocks).await?;
        Ok(Placement::Inserted {
            query,
            tasks,
            build: built.report,
        })
    }

    /// Project mode turns the target block into a `[[Project]]` heading and
    /// nests the tasks below it; otherwise the tasks replace the target block
    async fn insert_blocks(
        &self,
        block_uuid: &str,
        blocks: Vec<outline_api::BlockToInsert>,
    ) -> Result<(), RetrieveError> {
        let heading = self
            .settings
            .project_name_as_parent_blk
            .then(|| self.settings.default_project())
            .flatten();

        match heading {
            Some(project) => {
                self.platform
                    .update_block(block_uuid, &project.page_link())
                    .await?;
                self.platform
                    .insert_batch_block(block_uuid, blocks, InsertOptions::as_children())
                    .await?;
            }
            None if self.settings.project_name_as_parent_blk => {
                warn!("[TaskRetriever] No default project to use as heading, nesting under target block");
                self.platform
                    .insert_batch_block(block_uuid, blocks, InsertOptions::as_children())
                    .await?;
            }
            None => {
                self.platform
                    .insert_batch_block(block_uuid, blocks, InsertOptions::as_siblings())
                    .await?;
                self.platform.remove_block(block_uuid).await?;
            }
        }

        self.platform.exit_editing_mode(true).await?;
        Ok(())
    }

    /// Delete `tasks` one by one, stopping at the first failure.
    ///
    /// Deleted tasks stay deleted when a later one fails.
    pub async fn delete_all_tasks(
        &self,
        tasks: &[TodoistTask],
    ) -> Result<DeletionReport, RetrieveError> {
        let mut report = DeletionReport::default();

        for (position, task) in tasks.iter().enumerate() {
            if let Err(e) = self.service.delete_task(&task.id).await {
                error!("[TaskRetriever] Failed to delete task {}: {}", task.id, e);
                self.platform
                    .show_msg(
                        &format!("Error deleting tasks: {}", e),
                        MessageLevel::Error,
                    )
                    .await?;
                report.failure = Some(DeletionFailure {
                    task_id: task.id.clone(),
                    message: e.to_string(),
                });
                report.abandoned = tasks.len() - position - 1;
                break;
            }
            report.deleted.push(task.id.clone());
        }

        info!(
            "[TaskRetriever] Deleted {}/{} task(s)",
            report.deleted.len(),
            tasks.len()
        );
        Ok(report)
    }
}
