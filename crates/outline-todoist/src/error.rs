use outline_api::ApiError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure of a retrieve run.
///
/// Display texts double as the user-facing notification text.
#[derive(Debug, thiserror::Error)]
pub enum RetrieveError {
    #[error("Please set a Todoist API token")]
    MissingApiToken,

    #[error("Please select a default project")]
    MissingDefaultProject,

    #[error("Failed to create Todoist client: {0}")]
    Client(#[source] BoxError),

    #[error("Unable to retrieve tasks for {query}: {source}")]
    Listing {
        query: String,
        #[source]
        source: BoxError,
    },

    #[error(transparent)]
    Enrichment(#[from] EnrichmentError),

    #[error("Outline platform error: {0}")]
    Platform(#[from] ApiError),
}

/// Comments of one task could not be fetched
#[derive(Debug, thiserror::Error)]
#[error("Unable to retrieve comments for task {task_id}: {source}")]
pub struct EnrichmentError {
    pub task_id: String,
    #[source]
    pub source: BoxError,
}
