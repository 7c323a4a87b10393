use super::models::{
    CommandResponse, PagedResponse, SyncCommand, TaskQuery, TodoistComment, TodoistTask,
};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, error, info};
use uuid::Uuid;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

const BASE_URL: &str = "https://app.todoist.com/api/v1";

/// Upper bound on pages followed for one listing
const MAX_PAGES: usize = 100;

pub struct TodoistClient {
    default_headers: HeaderMap,
    client: reqwest::Client,
    base_url: String,
}

impl TodoistClient {
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_base_url(api_key, BASE_URL)
    }

    /// Client against a different API root (proxies, test servers)
    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Authorization",
            format!("Bearer {}", api_key)
                .parse::<HeaderValue>()
                .map_err(|e| format!("Invalid API token format: {}", e))?,
        );

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            default_headers: headers,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Helper to create better error messages from reqwest errors
    fn format_reqwest_error(e: reqwest::Error, url: &str, operation: &str) -> String {
        if e.is_timeout() {
            format!(
                "Failed to {} for {}: timeout - request took too long (check network or increase timeout)",
                operation, url
            )
        } else if e.is_connect() {
            format!(
                "Failed to {} for {}: connection error - check network connectivity, DNS resolution, and firewall settings. Error: {}",
                operation, url, e
            )
        } else if e.is_request() {
            format!(
                "Failed to {} for {}: request error - invalid URL format or malformed request parameters. Error: {}",
                operation, url, e
            )
        } else if e.is_decode() {
            format!(
                "Failed to {} for {}: decode error - unexpected response format from server. Error: {}",
                operation, url, e
            )
        } else {
            format!("Failed to {} for {}: {}. Debug details: {:?}", operation, url, e, e)
        }
    }

    /// Helper to handle HTTP responses with better error messages
    async fn handle_response(response: reqwest::Response, url: &str) -> Result<String> {
        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| format!("Failed to read response body from {}: {}", url, e))?;

        if !status.is_success() {
            return Err(format!(
                "HTTP {} error from {}: {}",
                status.as_u16(),
                url,
                truncate(&response_text, 500)
            )
            .into());
        }

        Ok(response_text)
    }

    /// Default headers plus the current OpenTelemetry context
    fn traced_headers(&self) -> HeaderMap {
        use opentelemetry::global;
        use opentelemetry::Context;

        struct HeaderInjector {
            headers: HeaderMap,
        }
        impl opentelemetry::propagation::Injector for HeaderInjector {
            fn set(&mut self, key: &str, value: String) {
                if let Ok(header_name) = reqwest::header::HeaderName::from_bytes(key.as_bytes()) {
                    if let Ok(header_value) = HeaderValue::from_str(&value) {
                        self.headers.insert(header_name, header_value);
                    }
                }
            }
        }

        let mut injector = HeaderInjector {
            headers: self.default_headers.clone(),
        };
        global::get_text_map_propagator(|propagator| {
            propagator.inject_context(&Context::current(), &mut injector);
        });
        injector.headers
    }

    /// GET a cursor-paged collection, following `next_cursor` to the end
    async fn get_paged<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let url = format!("{}{}", self.base_url, path);
        let mut results = Vec::new();
        let mut cursor: Option<String> = None;

        for page_index in 0..MAX_PAGES {
            debug!(
                "[TodoistClient] GET {} page={} params={:?}",
                url, page_index, params
            );

            let mut request = self
                .client
                .get(&url)
                .headers(self.traced_headers())
                .query(params);
            if let Some(cursor) = &cursor {
                request = request.query(&[("cursor", cursor.as_str())]);
            }

            let response = request.send().await.map_err(|e| {
                let error_msg = Self::format_reqwest_error(e, &url, "send list request");
                error!("[TodoistClient] List request failed: {}", error_msg);
                error_msg
            })?;

            let response_text = Self::handle_response(response, &url).await.map_err(|e| {
                error!("[TodoistClient] Failed to handle list response: {}", e);
                e
            })?;

            let page: PagedResponse<T> = serde_json::from_str(&response_text).map_err(|e| {
                format!(
                    "Failed to parse paged response from {}: {} - Response (first 500): {}",
                    url,
                    e,
                    truncate(&response_text, 500)
                )
            })?;

            results.extend(page.results);
            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => return Ok(results),
            }
        }

        Err(format!("Gave up listing {} after {} pages", url, MAX_PAGES).into())
    }

    /// Parse command responses; the Sync API reports them either as an array
    /// or as a `sync_status` map of uuid to `"ok"` / error object
    fn parse_command_response(response_text: &str) -> Result<Vec<CommandResponse>> {
        if let Ok(resp) = serde_json::from_str::<Vec<CommandResponse>>(response_text) {
            return Ok(resp);
        }

        let sync_resp: serde_json::Value = serde_json::from_str(response_text)
            .map_err(|e| format!("Failed to parse response: {}", e))?;
        let sync_status = sync_resp
            .get("sync_status")
            .ok_or_else(|| format!("Unexpected response format: {}", response_text))?;

        if let Ok(resp) = serde_json::from_value::<Vec<CommandResponse>>(sync_status.clone()) {
            return Ok(resp);
        }

        let map = sync_status
            .as_object()
            .ok_or_else(|| format!("sync_status is not an array or object: {}", response_text))?;

        let mut responses = Vec::with_capacity(map.len());
        for (uuid, value) in map {
            if let Some(status) = value.as_str() {
                responses.push(CommandResponse {
                    uuid: uuid.clone(),
                    status: status.to_string(),
                    error: None,
                });
            } else if let Some(obj) = value.as_object() {
                responses.push(CommandResponse {
                    uuid: uuid.clone(),
                    status: obj
                        .get("status")
                        .and_then(|v| v.as_str())
                        .unwrap_or("error")
                        .to_string(),
                    error: obj
                        .get("error")
                        .and_then(|v| v.as_str())
                        .map(|s| s.to_string()),
                });
            } else {
                return Err(format!(
                    "Unexpected sync_status value type for UUID {}: {}",
                    uuid, value
                )
                .into());
            }
        }
        Ok(responses)
    }

    /// Execute a sync command and return the command response
    async fn execute_command(&self, command: SyncCommand) -> Result<CommandResponse> {
        let url = format!("{}/sync", self.base_url);
        let command_uuid = command.uuid.clone();

        debug!(
            "[TodoistClient] Executing command: type={}, uuid={}",
            command.command_type, command_uuid
        );

        let body = json!({
            "commands": [command],
        });

        let response = self
            .client
            .post(&url)
            .headers(self.traced_headers())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let error_msg = Self::format_reqwest_error(e, &url, "send command request");
                error!("[TodoistClient] Command execution failed: {}", error_msg);
                error_msg
            })?;

        let response_text = Self::handle_response(response, &url).await?;

        let cmd_result = Self::parse_command_response(&response_text)?
            .into_iter()
            .find(|r| r.uuid == command_uuid)
            .ok_or_else(|| format!("Command response not found for uuid {}", command_uuid))?;

        if cmd_result.status != "ok" {
            let error_msg = cmd_result
                .error
                .unwrap_or_else(|| "Unknown error".to_string());
            error!("[TodoistClient] Command failed: {}", error_msg);
            return Err(format!("Command failed: {}", error_msg).into());
        }

        debug!("[TodoistClient] Command succeeded: uuid={}", command_uuid);
        Ok(cmd_result)
    }

    /// Active tasks of a project or matching a filter, in service order
    pub async fn get_tasks(&self, query: &TaskQuery) -> Result<Vec<TodoistTask>> {
        let tasks: Vec<TodoistTask> = match query {
            TaskQuery::Project(project_id) => {
                self.get_paged("/tasks", &[("project_id", project_id.as_str())])
                    .await?
            }
            TaskQuery::Filter(filter) => {
                self.get_paged("/tasks/filter", &[("query", filter.as_str())])
                    .await?
            }
        };

        info!(
            "[TodoistClient] Retrieved {} tasks for {}",
            tasks.len(),
            query
        );
        Ok(tasks)
    }

    pub async fn get_comments(&self, task_id: &str) -> Result<Vec<TodoistComment>> {
        self.get_paged("/comments", &[("task_id", task_id)]).await
    }

    pub async fn delete_task(&self, task_id: &str) -> Result<()> {
        let command = SyncCommand {
            command_type: "item_delete".to_string(),
            uuid: Uuid::new_v4().to_string(),
            args: json!({
                "id": task_id,
            }),
        };

        self.execute_command(command).await?;
        Ok(())
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!(
            "{}... (truncated)",
            text.chars().take(max_chars).collect::<String>()
        )
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = TodoistClient::new("test_api_key_12345").unwrap();
        assert_eq!(
            client.default_headers.get("Authorization").unwrap(),
            "Bearer test_api_key_12345"
        );
        assert_eq!(client.base_url, BASE_URL);
    }

    #[test]
    fn test_invalid_token_is_rejected() {
        assert!(TodoistClient::new("bad\ntoken").is_err());
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = TodoistClient::with_base_url("k", "http://localhost:8080/api/v1/").unwrap();
        assert_eq!(client.base_url, "http://localhost:8080/api/v1");
    }

    #[test]
    fn test_parse_command_response_array() {
        let resp =
            TodoistClient::parse_command_response(r#"[{"uuid": "u1", "status": "ok"}]"#).unwrap();
        assert_eq!(resp.len(), 1);
        assert_eq!(resp[0].status, "ok");
    }

    #[test]
    fn test_parse_command_response_status_map() {
        let text = r#"{
            "sync_status": {
                "u1": "ok",
                "u2": {"error_code": 22, "error": "Item not found"}
            }
        }"#;
        let mut resp = TodoistClient::parse_command_response(text).unwrap();
        resp.sort_by(|a, b| a.uuid.cmp(&b.uuid));

        assert_eq!(resp[0].status, "ok");
        assert_eq!(resp[1].status, "error");
        assert_eq!(resp[1].error.as_deref(), Some("Item not found"));
    }

    #[test]
    fn test_parse_command_response_unexpected() {
        assert!(TodoistClient::parse_command_response(r#"{"foo": 1}"#).is_err());
        assert!(TodoistClient::parse_command_response(r#"{"sync_status": 3}"#).is_err());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc... (truncated)");
    }
}
